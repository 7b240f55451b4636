//! Storage contract for the ledger.

use std::sync::Arc;

use async_trait::async_trait;
use minibank_common::{AccountId, Amount, Result, TransactionKind};

use crate::account::Account;
use crate::balance::{AccountSnapshot, AppliedBalance};
use crate::journal::TransactionEntry;

/// Transactional storage backing the ledger.
///
/// Implementations must make [`LedgerStore::apply_movement`] a single
/// atomic, isolated read-check-write keyed by account id: two concurrent
/// movements on the same account serialize, movements on different accounts
/// do not contend, and a movement that would break `balance >= -limit` on a
/// debit leaves no trace.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Atomically apply a movement and return the committed balance.
    ///
    /// Fails with `AccountNotFound` or `LimitExceeded` without changing state.
    async fn apply_movement(
        &self,
        account_id: AccountId,
        kind: TransactionKind,
        amount: Amount,
    ) -> Result<AppliedBalance>;

    /// Append an entry to the transaction log.
    async fn append_entry(&self, entry: &TransactionEntry) -> Result<()>;

    /// Read an account with its newest `max_entries` log entries in one
    /// consistent read.
    async fn snapshot(&self, account_id: AccountId, max_entries: usize) -> Result<AccountSnapshot>;

    /// Load a single account row.
    async fn load_account(&self, account_id: AccountId) -> Result<Account>;
}

/// Shared store handle injected into ledger components.
pub type SharedStore = Arc<dyn LedgerStore>;
