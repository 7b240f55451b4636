//! Account statements.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use minibank_common::{micros, AccountId, Amount, Description, Result, Timestamp, TransactionKind};

use crate::balance::BalanceSummary;
use crate::journal::TransactionEntry;
use crate::store::SharedStore;

/// Number of log entries included in a statement.
pub const STATEMENT_ENTRIES: usize = 10;

/// One line of a statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementLine {
    pub amount: Amount,
    pub kind: TransactionKind,
    pub description: Description,
    #[serde(with = "micros")]
    pub occurred_at: Timestamp,
}

impl From<TransactionEntry> for StatementLine {
    fn from(entry: TransactionEntry) -> Self {
        Self {
            amount: entry.amount,
            kind: entry.kind,
            description: entry.description,
            occurred_at: entry.occurred_at,
        }
    }
}

/// Current balance plus the most recent log entries, newest first.
///
/// Entries are eventually consistent with the balance: a movement that was
/// just accepted may not be listed yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    pub balance: BalanceSummary,
    pub last_transactions: Vec<StatementLine>,
}

/// Builds statements from single store snapshots.
#[derive(Clone)]
pub struct StatementBuilder {
    store: SharedStore,
    max_entries: usize,
}

impl StatementBuilder {
    /// Create a builder returning up to [`STATEMENT_ENTRIES`] entries.
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            max_entries: STATEMENT_ENTRIES,
        }
    }

    /// Build the statement for an account.
    #[instrument(skip(self), fields(account = %account_id))]
    pub async fn statement(&self, account_id: AccountId) -> Result<Statement> {
        let snapshot = self.store.snapshot(account_id, self.max_entries).await?;

        let mut entries = snapshot.entries;
        // Stable: equal commit times keep the store's tie order.
        entries.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
        entries.truncate(self.max_entries);

        Ok(Statement {
            balance: snapshot.summary,
            last_transactions: entries.into_iter().map(StatementLine::from).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use minibank_common::LedgerError;

    use crate::memory::InMemoryLedgerStore;
    use crate::store::LedgerStore;

    #[tokio::test]
    async fn test_empty_statement() {
        let store = Arc::new(InMemoryLedgerStore::seeded());
        let builder = StatementBuilder::new(store);

        let statement = builder.statement(AccountId::new(2)).await.unwrap();
        assert_eq!(statement.balance.total, 0);
        assert_eq!(statement.balance.limit, 80_000);
        assert!(statement.last_transactions.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_account() {
        let builder = StatementBuilder::new(Arc::new(InMemoryLedgerStore::seeded()));
        let err = builder.statement(AccountId::new(42)).await.unwrap_err();
        assert!(matches!(err, LedgerError::AccountNotFound(_)));
    }

    #[tokio::test]
    async fn test_statement_json_shape() {
        let store = Arc::new(InMemoryLedgerStore::seeded());
        store
            .append_entry(&TransactionEntry {
                account_id: AccountId::new(1),
                amount: Amount::new(10).unwrap(),
                kind: TransactionKind::Debit,
                description: Description::new("snack").unwrap(),
                occurred_at: minibank_common::now(),
            })
            .await
            .unwrap();

        let statement = StatementBuilder::new(store)
            .statement(AccountId::new(1))
            .await
            .unwrap();
        let json = serde_json::to_value(&statement).unwrap();

        assert_eq!(json["balance"]["limit"], 100_000);
        assert!(json["balance"]["as_of"].as_str().unwrap().ends_with('Z'));
        assert_eq!(json["last_transactions"][0]["kind"], "d");
        assert_eq!(json["last_transactions"][0]["amount"], 10);
        assert_eq!(json["last_transactions"][0]["description"], "snack");
    }
}
