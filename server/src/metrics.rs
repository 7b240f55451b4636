//! Metrics collection for service monitoring.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use minibank_common::{LedgerError, Result};
use minibank_ledger::{AppliedBalance, RecorderStatsSnapshot};

/// Service metrics.
pub struct Metrics {
    /// Total mutations submitted to the ledger.
    pub mutations_total: AtomicU64,
    /// Accepted mutations.
    pub mutations_accepted: AtomicU64,
    /// Mutations rejected by the overdraft limit.
    pub mutations_rejected: AtomicU64,
    /// Mutations against unknown accounts.
    pub mutations_not_found: AtomicU64,
    /// Mutations refused by validation.
    pub mutations_invalid: AtomicU64,
    /// Mutations that failed on a store or internal error.
    pub mutations_failed: AtomicU64,
    /// Mutations currently in flight.
    pub mutations_active: AtomicU64,
    /// Statements served.
    pub statements_served: AtomicU64,
    /// Statements that failed with a server-side error.
    pub statements_failed: AtomicU64,
}

impl Metrics {
    /// Create new metrics instance.
    pub fn new() -> Self {
        Self {
            mutations_total: AtomicU64::new(0),
            mutations_accepted: AtomicU64::new(0),
            mutations_rejected: AtomicU64::new(0),
            mutations_not_found: AtomicU64::new(0),
            mutations_invalid: AtomicU64::new(0),
            mutations_failed: AtomicU64::new(0),
            mutations_active: AtomicU64::new(0),
            statements_served: AtomicU64::new(0),
            statements_failed: AtomicU64::new(0),
        }
    }

    /// Record a mutation being admitted. Must happen before the admission
    /// check so a concurrent drain either sees it or refuses it.
    pub fn mutation_started(&self) {
        self.mutations_total.fetch_add(1, Ordering::Relaxed);
        self.mutations_active.fetch_add(1, Ordering::SeqCst);
    }

    /// Back out a mutation refused at admission.
    pub fn mutation_refused(&self) {
        self.mutations_active.fetch_sub(1, Ordering::SeqCst);
        self.mutations_total.fetch_sub(1, Ordering::Relaxed);
    }

    /// Record the outcome of an admitted mutation.
    pub fn mutation_finished(&self, outcome: &Result<AppliedBalance>) {
        self.mutations_active.fetch_sub(1, Ordering::SeqCst);
        let counter = match outcome {
            Ok(_) => &self.mutations_accepted,
            Err(LedgerError::LimitExceeded { .. }) => &self.mutations_rejected,
            Err(LedgerError::AccountNotFound(_)) => &self.mutations_not_found,
            Err(LedgerError::Validation { .. }) => &self.mutations_invalid,
            Err(_) => &self.mutations_failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a served statement.
    pub fn statement_served(&self) {
        self.statements_served.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed statement.
    pub fn statement_failed(&self) {
        self.statements_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of mutations in flight.
    pub fn active_mutations(&self) -> u64 {
        self.mutations_active.load(Ordering::SeqCst)
    }

    /// Get current metrics snapshot.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            mutations_total: self.mutations_total.load(Ordering::Relaxed),
            mutations_accepted: self.mutations_accepted.load(Ordering::Relaxed),
            mutations_rejected: self.mutations_rejected.load(Ordering::Relaxed),
            mutations_not_found: self.mutations_not_found.load(Ordering::Relaxed),
            mutations_invalid: self.mutations_invalid.load(Ordering::Relaxed),
            mutations_failed: self.mutations_failed.load(Ordering::Relaxed),
            mutations_active: self.mutations_active.load(Ordering::Relaxed),
            statements_served: self.statements_served.load(Ordering::Relaxed),
            statements_failed: self.statements_failed.load(Ordering::Relaxed),
        }
    }

    /// Export metrics in Prometheus format.
    pub fn to_prometheus(&self, recorder: &RecorderStatsSnapshot) -> String {
        let snapshot = self.snapshot();
        format!(
            r#"# HELP minibank_mutations_total Total number of mutations
# TYPE minibank_mutations_total counter
minibank_mutations_total {}

# HELP minibank_mutations_accepted Total accepted mutations
# TYPE minibank_mutations_accepted counter
minibank_mutations_accepted {}

# HELP minibank_mutations_rejected Total mutations rejected by the overdraft limit
# TYPE minibank_mutations_rejected counter
minibank_mutations_rejected {}

# HELP minibank_mutations_not_found Total mutations against unknown accounts
# TYPE minibank_mutations_not_found counter
minibank_mutations_not_found {}

# HELP minibank_mutations_invalid Total mutations refused by validation
# TYPE minibank_mutations_invalid counter
minibank_mutations_invalid {}

# HELP minibank_mutations_failed Total mutations failed on store errors
# TYPE minibank_mutations_failed counter
minibank_mutations_failed {}

# HELP minibank_mutations_active Current in-flight mutations
# TYPE minibank_mutations_active gauge
minibank_mutations_active {}

# HELP minibank_statements_served Total statements served
# TYPE minibank_statements_served counter
minibank_statements_served {}

# HELP minibank_statements_failed Total statements failed on store errors
# TYPE minibank_statements_failed counter
minibank_statements_failed {}

# HELP minibank_recorder_enqueued Total log entries queued
# TYPE minibank_recorder_enqueued counter
minibank_recorder_enqueued {}

# HELP minibank_recorder_written Total log entries written
# TYPE minibank_recorder_written counter
minibank_recorder_written {}

# HELP minibank_recorder_failed Total log entries the store failed to write
# TYPE minibank_recorder_failed counter
minibank_recorder_failed {}

# HELP minibank_recorder_dropped Total log entries dropped before writing
# TYPE minibank_recorder_dropped counter
minibank_recorder_dropped {}
"#,
            snapshot.mutations_total,
            snapshot.mutations_accepted,
            snapshot.mutations_rejected,
            snapshot.mutations_not_found,
            snapshot.mutations_invalid,
            snapshot.mutations_failed,
            snapshot.mutations_active,
            snapshot.statements_served,
            snapshot.statements_failed,
            recorder.enqueued,
            recorder.written,
            recorder.failed,
            recorder.dropped,
        )
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub mutations_total: u64,
    pub mutations_accepted: u64,
    pub mutations_rejected: u64,
    pub mutations_not_found: u64,
    pub mutations_invalid: u64,
    pub mutations_failed: u64,
    pub mutations_active: u64,
    pub statements_served: u64,
    pub statements_failed: u64,
}

/// Shared metrics instance.
pub type SharedMetrics = Arc<Metrics>;
