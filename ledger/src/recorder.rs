//! Asynchronous transaction recording.
//!
//! Accepted movements are queued on a bounded channel and written to the
//! log by a dedicated worker, off the response path. Failures are counted
//! and logged, never reported back to the mutation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::journal::TransactionEntry;
use crate::store::SharedStore;

/// Recorder configuration.
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Maximum number of entries waiting to be written.
    pub queue_capacity: usize,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 10_000,
        }
    }
}

/// Counters for the recording pipeline.
#[derive(Debug, Default)]
pub struct RecorderStats {
    enqueued: AtomicU64,
    written: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

impl RecorderStats {
    /// Get current counters.
    pub fn snapshot(&self) -> RecorderStatsSnapshot {
        RecorderStatsSnapshot {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            written: self.written.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`RecorderStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecorderStatsSnapshot {
    /// Entries accepted onto the queue.
    pub enqueued: u64,
    /// Entries written to the store.
    pub written: u64,
    /// Entries the store failed to write.
    pub failed: u64,
    /// Entries discarded because the queue was full or closed.
    pub dropped: u64,
}

impl RecorderStatsSnapshot {
    /// Entries enqueued but not yet written or failed.
    pub fn pending(&self) -> u64 {
        self.enqueued.saturating_sub(self.written + self.failed)
    }
}

/// Handle for queueing log entries.
pub struct TransactionRecorder {
    sender: Mutex<Option<mpsc::Sender<TransactionEntry>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    stats: Arc<RecorderStats>,
}

impl TransactionRecorder {
    /// Start the recorder worker. Must be called inside a tokio runtime.
    pub fn spawn(store: SharedStore, config: RecorderConfig) -> Self {
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let stats = Arc::new(RecorderStats::default());

        let worker = tokio::spawn(run_worker(store, receiver, stats.clone()));

        info!(queue_capacity = config.queue_capacity, "Transaction recorder started");

        Self {
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
            stats,
        }
    }

    /// Queue an entry for writing. Never waits.
    pub fn record(&self, entry: TransactionEntry) {
        let sender = self.sender.lock().clone();
        let Some(sender) = sender else {
            self.stats.dropped.fetch_add(1, Ordering::Relaxed);
            warn!(account = %entry.account_id, "Recorder closed, entry dropped");
            return;
        };

        match sender.try_send(entry) {
            Ok(()) => {
                self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
            }
            Err(mpsc::error::TrySendError::Full(entry)) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(account = %entry.account_id, "Recorder queue full, entry dropped");
            }
            Err(mpsc::error::TrySendError::Closed(entry)) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                error!(account = %entry.account_id, "Recorder worker gone, entry dropped");
            }
        }
    }

    /// Get the recorder counters.
    pub fn stats(&self) -> RecorderStatsSnapshot {
        self.stats.snapshot()
    }

    /// Close the queue and wait for every queued entry to be written.
    pub async fn shutdown(&self) {
        drop(self.sender.lock().take());

        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                error!(error = %e, "Recorder worker terminated abnormally");
            }
        }

        let stats = self.stats();
        info!(
            written = stats.written,
            failed = stats.failed,
            dropped = stats.dropped,
            "Transaction recorder drained"
        );
    }
}

async fn run_worker(
    store: SharedStore,
    mut receiver: mpsc::Receiver<TransactionEntry>,
    stats: Arc<RecorderStats>,
) {
    while let Some(entry) = receiver.recv().await {
        match store.append_entry(&entry).await {
            Ok(()) => {
                stats.written.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                stats.failed.fetch_add(1, Ordering::Relaxed);
                error!(
                    account = %entry.account_id,
                    amount = %entry.amount,
                    kind = %entry.kind,
                    error = %e,
                    "Failed to record transaction"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minibank_common::{now, AccountId, Amount, Description, TransactionKind};

    use crate::account::Account;
    use crate::balance::{AccountSnapshot, AppliedBalance};
    use crate::memory::InMemoryLedgerStore;
    use crate::store::LedgerStore;

    /// Store whose log writes take a while.
    struct SlowAppendStore {
        inner: InMemoryLedgerStore,
        delay: std::time::Duration,
    }

    #[async_trait::async_trait]
    impl LedgerStore for SlowAppendStore {
        async fn apply_movement(
            &self,
            account_id: AccountId,
            kind: TransactionKind,
            amount: Amount,
        ) -> minibank_common::Result<AppliedBalance> {
            self.inner.apply_movement(account_id, kind, amount).await
        }

        async fn append_entry(&self, entry: &TransactionEntry) -> minibank_common::Result<()> {
            tokio::time::sleep(self.delay).await;
            self.inner.append_entry(entry).await
        }

        async fn snapshot(
            &self,
            account_id: AccountId,
            max_entries: usize,
        ) -> minibank_common::Result<AccountSnapshot> {
            self.inner.snapshot(account_id, max_entries).await
        }

        async fn load_account(&self, account_id: AccountId) -> minibank_common::Result<Account> {
            self.inner.load_account(account_id).await
        }
    }

    fn entry(amount: i64) -> TransactionEntry {
        TransactionEntry {
            account_id: AccountId::new(1),
            amount: Amount::new(amount).unwrap(),
            kind: TransactionKind::Credit,
            description: Description::new("deposit").unwrap(),
            occurred_at: now(),
        }
    }

    #[tokio::test]
    async fn test_shutdown_drains_queue() {
        let store = Arc::new(InMemoryLedgerStore::seeded());
        let recorder = TransactionRecorder::spawn(store.clone(), RecorderConfig::default());

        for amount in 1..=20 {
            recorder.record(entry(amount));
        }
        recorder.shutdown().await;

        let stats = recorder.stats();
        assert_eq!(stats.enqueued, 20);
        assert_eq!(stats.written, 20);
        assert_eq!(stats.pending(), 0);
        assert_eq!(store.entry_count(AccountId::new(1)), 20);
    }

    #[tokio::test]
    async fn test_failures_are_counted_not_raised() {
        let store = Arc::new(InMemoryLedgerStore::seeded());
        store.set_append_failure(true);
        let recorder = TransactionRecorder::spawn(store.clone(), RecorderConfig::default());

        recorder.record(entry(5));
        recorder.shutdown().await;

        let stats = recorder.stats();
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.written, 0);
        assert_eq!(store.entry_count(AccountId::new(1)), 0);
    }

    #[tokio::test]
    async fn test_full_queue_drops_without_waiting() {
        let store = Arc::new(SlowAppendStore {
            inner: InMemoryLedgerStore::seeded(),
            delay: std::time::Duration::from_millis(200),
        });
        let recorder =
            TransactionRecorder::spawn(store.clone(), RecorderConfig { queue_capacity: 1 });

        let started = std::time::Instant::now();
        for amount in 1..=5 {
            recorder.record(entry(amount));
        }
        assert!(started.elapsed() < std::time::Duration::from_millis(100));

        let stats = recorder.stats();
        assert!(stats.dropped > 0);
        assert_eq!(stats.enqueued + stats.dropped, 5);

        recorder.shutdown().await;
        let stats = recorder.stats();
        assert_eq!(stats.written, stats.enqueued);
        assert_eq!(store.inner.entry_count(AccountId::new(1)) as u64, stats.written);
    }

    #[tokio::test]
    async fn test_record_after_shutdown_is_dropped() {
        let store = Arc::new(InMemoryLedgerStore::seeded());
        let recorder = TransactionRecorder::spawn(store, RecorderConfig::default());
        recorder.shutdown().await;

        recorder.record(entry(1));
        assert_eq!(recorder.stats().dropped, 1);
    }
}
