//! Balance results and snapshots.

use minibank_common::{micros, AccountId, Timestamp};
use serde::{Deserialize, Serialize};

use crate::journal::TransactionEntry;

/// Outcome of an accepted balance mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedBalance {
    /// Account that was mutated.
    pub account_id: AccountId,
    /// Balance after the commit.
    pub balance: i64,
    /// Account overdraft limit.
    pub limit: i64,
    /// Commit time reported by the store.
    pub committed_at: Timestamp,
}

/// Balance part of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSummary {
    /// Current balance.
    pub total: i64,
    /// Overdraft limit.
    pub limit: i64,
    /// Instant the balance was read.
    #[serde(with = "micros")]
    pub as_of: Timestamp,
}

/// Raw statement read: one account row joined with its newest log rows.
///
/// Produced by a single store read so the balance and `as_of` belong to the
/// same instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSnapshot {
    pub summary: BalanceSummary,
    /// Newest first.
    pub entries: Vec<TransactionEntry>,
}
