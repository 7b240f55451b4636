//! In-memory ledger store.
//!
//! Used by tests, the simulator and local runs without a database. Each
//! account lives in its own `DashMap` entry; holding the entry guard is the
//! per-account lock, so movements on one account serialize while other
//! accounts proceed in parallel.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, warn};

use minibank_common::{now, AccountId, Amount, LedgerError, Result, TransactionKind};

use crate::account::Account;
use crate::balance::{AccountSnapshot, AppliedBalance, BalanceSummary};
use crate::journal::TransactionEntry;
use crate::store::LedgerStore;

/// Log entry tagged with its insertion sequence.
#[derive(Debug, Clone)]
struct StoredEntry {
    seq: u64,
    entry: TransactionEntry,
}

#[derive(Debug)]
struct AccountRow {
    account: Account,
    entries: Vec<StoredEntry>,
}

/// Thread-safe in-memory store.
pub struct InMemoryLedgerStore {
    rows: DashMap<AccountId, AccountRow>,
    next_seq: AtomicU64,
    fail_appends: AtomicBool,
}

impl InMemoryLedgerStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            rows: DashMap::new(),
            next_seq: AtomicU64::new(0),
            fail_appends: AtomicBool::new(false),
        }
    }

    /// Create a store holding the given accounts.
    pub fn with_accounts(accounts: impl IntoIterator<Item = Account>) -> Self {
        let store = Self::new();
        for account in accounts {
            store.insert_account(account);
        }
        store
    }

    /// Create a store with the five default accounts.
    pub fn seeded() -> Self {
        Self::with_accounts(default_accounts())
    }

    /// Provision (or replace) an account.
    pub fn insert_account(&self, account: Account) {
        self.rows.insert(
            account.id,
            AccountRow {
                account,
                entries: Vec::new(),
            },
        );
    }

    /// Make every subsequent append fail, or restore normal behavior.
    pub fn set_append_failure(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    /// Number of log entries stored for an account.
    pub fn entry_count(&self, account_id: AccountId) -> usize {
        self.rows
            .get(&account_id)
            .map(|row| row.entries.len())
            .unwrap_or(0)
    }
}

impl Default for InMemoryLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn apply_movement(
        &self,
        account_id: AccountId,
        kind: TransactionKind,
        amount: Amount,
    ) -> Result<AppliedBalance> {
        let mut row = self
            .rows
            .get_mut(&account_id)
            .ok_or(LedgerError::AccountNotFound(account_id))?;

        let balance = row.account.prospective_balance(kind, amount)?;
        row.account.balance = balance;

        debug!(account = %account_id, balance, "Movement applied");

        Ok(AppliedBalance {
            account_id,
            balance,
            limit: row.account.limit,
            committed_at: now(),
        })
    }

    async fn append_entry(&self, entry: &TransactionEntry) -> Result<()> {
        if self.fail_appends.load(Ordering::SeqCst) {
            warn!(account = %entry.account_id, "Injected append failure");
            return Err(LedgerError::Store("append failure injected".to_string()));
        }

        let mut row = self
            .rows
            .get_mut(&entry.account_id)
            .ok_or(LedgerError::AccountNotFound(entry.account_id))?;

        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        row.entries.push(StoredEntry {
            seq,
            entry: entry.clone(),
        });
        Ok(())
    }

    async fn snapshot(&self, account_id: AccountId, max_entries: usize) -> Result<AccountSnapshot> {
        let row = self
            .rows
            .get(&account_id)
            .ok_or(LedgerError::AccountNotFound(account_id))?;

        let summary = BalanceSummary {
            total: row.account.balance,
            limit: row.account.limit,
            as_of: now(),
        };

        let mut recent: Vec<&StoredEntry> = row.entries.iter().collect();
        recent.sort_by(|a, b| {
            b.entry
                .occurred_at
                .cmp(&a.entry.occurred_at)
                .then(b.seq.cmp(&a.seq))
        });

        let entries = recent
            .into_iter()
            .take(max_entries)
            .map(|stored| stored.entry.clone())
            .collect();

        Ok(AccountSnapshot { summary, entries })
    }

    async fn load_account(&self, account_id: AccountId) -> Result<Account> {
        self.rows
            .get(&account_id)
            .map(|row| row.account.clone())
            .ok_or(LedgerError::AccountNotFound(account_id))
    }
}

/// The five accounts provisioned by the default schema.
pub fn default_accounts() -> Vec<Account> {
    [(1, 100_000), (2, 80_000), (3, 1_000_000), (4, 10_000_000), (5, 500_000)]
        .into_iter()
        .map(|(id, limit)| Account::new(AccountId::new(id), limit))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use minibank_common::Description;

    fn entry(
        account: i32,
        amount: i64,
        occurred_at: chrono::DateTime<chrono::Utc>,
    ) -> TransactionEntry {
        TransactionEntry {
            account_id: AccountId::new(account),
            amount: Amount::new(amount).unwrap(),
            kind: TransactionKind::Credit,
            description: Description::new("t").unwrap(),
            occurred_at,
        }
    }

    #[tokio::test]
    async fn test_unknown_account() {
        let store = InMemoryLedgerStore::seeded();
        let err = store
            .apply_movement(AccountId::new(6), TransactionKind::Credit, Amount::new(1).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::AccountNotFound(_)));
        assert!(store.snapshot(AccountId::new(6), 10).await.is_err());
    }

    #[tokio::test]
    async fn test_snapshot_orders_by_commit_time_then_insertion() {
        let store = InMemoryLedgerStore::seeded();
        let base = now();
        let later = base + chrono::Duration::milliseconds(5);

        // Appended out of commit order, with a tie on `later`.
        store.append_entry(&entry(1, 1, later)).await.unwrap();
        store.append_entry(&entry(1, 2, base)).await.unwrap();
        store.append_entry(&entry(1, 3, later)).await.unwrap();

        let snapshot = store.snapshot(AccountId::new(1), 10).await.unwrap();
        let amounts: Vec<i64> = snapshot.entries.iter().map(|e| e.amount.value()).collect();
        assert_eq!(amounts, vec![3, 1, 2]);
    }

    #[tokio::test]
    async fn test_injected_append_failure() {
        let store = InMemoryLedgerStore::seeded();
        store.set_append_failure(true);
        assert!(store.append_entry(&entry(1, 1, now())).await.is_err());
        store.set_append_failure(false);
        assert!(store.append_entry(&entry(1, 1, now())).await.is_ok());
        assert_eq!(store.entry_count(AccountId::new(1)), 1);
    }

    #[test]
    fn test_default_accounts() {
        let accounts = default_accounts();
        assert_eq!(accounts.len(), 5);
        assert!(accounts.iter().all(|a| a.balance == 0 && a.is_within_limit()));
    }
}
