//! Transaction log entries.

use minibank_common::{
    micros, AccountId, Amount, Description, Timestamp, TransactionKind, TransactionRequest,
};
use serde::{Deserialize, Serialize};

use crate::balance::AppliedBalance;

/// An immutable entry in the transaction log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionEntry {
    /// Owning account.
    pub account_id: AccountId,
    /// Magnitude of the movement.
    pub amount: Amount,
    /// Credit or debit.
    pub kind: TransactionKind,
    /// Free-text label.
    pub description: Description,
    /// Commit time of the mutation this entry records.
    #[serde(with = "micros")]
    pub occurred_at: Timestamp,
}

impl TransactionEntry {
    /// Build the log entry for an accepted mutation.
    ///
    /// `occurred_at` is taken from the commit, not from the moment the entry
    /// is eventually written.
    pub fn for_commit(applied: &AppliedBalance, request: &TransactionRequest) -> Self {
        Self {
            account_id: applied.account_id,
            amount: request.amount,
            kind: request.kind,
            description: request.description.clone(),
            occurred_at: applied.committed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_entry_carries_commit_time() {
        let committed_at = chrono::Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let applied = AppliedBalance {
            account_id: AccountId::new(3),
            balance: -250,
            limit: 1000,
            committed_at,
        };
        let request = TransactionRequest {
            amount: Amount::new(250).unwrap(),
            kind: TransactionKind::Debit,
            description: Description::new("coffee").unwrap(),
        };

        let entry = TransactionEntry::for_commit(&applied, &request);
        assert_eq!(entry.occurred_at, committed_at);
        assert_eq!(entry.account_id, AccountId::new(3));
        assert_eq!(entry.kind, TransactionKind::Debit);
    }
}
