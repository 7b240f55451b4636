//! Balance mutation.

use tracing::{debug, info, instrument};

use minibank_common::{AccountId, Amount, LedgerError, Result, TransactionKind};

use crate::balance::AppliedBalance;
use crate::store::SharedStore;

/// Applies signed movements to account balances under the overdraft limit.
///
/// The check-and-apply itself is delegated to the store as one atomic
/// operation; the mutator never reads a balance and writes it back.
#[derive(Clone)]
pub struct BalanceMutator {
    store: SharedStore,
}

impl BalanceMutator {
    /// Create a mutator over a store.
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Apply `amount` to an account as a credit or debit.
    ///
    /// `amount` is re-validated here even though the gateway already checked
    /// it; an invalid amount never reaches the store.
    #[instrument(skip(self), fields(account = %account_id, kind = %kind))]
    pub async fn apply(
        &self,
        account_id: AccountId,
        amount: i64,
        kind: TransactionKind,
    ) -> Result<AppliedBalance> {
        let amount = Amount::new(amount)?;

        match self.store.apply_movement(account_id, kind, amount).await {
            Ok(applied) => {
                debug!(balance = applied.balance, limit = applied.limit, "Movement committed");
                Ok(applied)
            }
            Err(e @ LedgerError::LimitExceeded { .. }) => {
                info!(amount = %amount, "Movement rejected: limit exceeded");
                Err(e)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::account::Account;
    use crate::memory::InMemoryLedgerStore;
    use crate::store::LedgerStore;

    fn mutator_with(limit: i64) -> (BalanceMutator, Arc<InMemoryLedgerStore>) {
        let store = Arc::new(InMemoryLedgerStore::with_accounts([Account::new(
            AccountId::new(1),
            limit,
        )]));
        (BalanceMutator::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_walkthrough() {
        let (mutator, store) = mutator_with(1000);
        let id = AccountId::new(1);

        let applied = mutator.apply(id, 500, TransactionKind::Debit).await.unwrap();
        assert_eq!(applied.balance, -500);
        assert_eq!(applied.limit, 1000);

        let err = mutator.apply(id, 600, TransactionKind::Debit).await.unwrap_err();
        assert!(matches!(err, LedgerError::LimitExceeded { attempted: -1100, .. }));
        assert_eq!(store.load_account(id).await.unwrap().balance, -500);

        let applied = mutator.apply(id, 500, TransactionKind::Credit).await.unwrap();
        assert_eq!(applied.balance, 0);
    }

    #[tokio::test]
    async fn test_rejects_non_positive_amount_without_store_access() {
        let (mutator, store) = mutator_with(1000);
        let id = AccountId::new(1);

        for amount in [0, -1] {
            let err = mutator.apply(id, amount, TransactionKind::Credit).await.unwrap_err();
            assert!(matches!(err, LedgerError::Validation { .. }));
        }
        assert_eq!(store.load_account(id).await.unwrap().balance, 0);
    }

    #[tokio::test]
    async fn test_debit_exactly_to_limit_is_accepted() {
        let (mutator, _) = mutator_with(1000);
        let applied = mutator
            .apply(AccountId::new(1), 1000, TransactionKind::Debit)
            .await
            .unwrap();
        assert_eq!(applied.balance, -1000);
    }

    #[tokio::test]
    async fn test_unknown_account() {
        let (mutator, _) = mutator_with(1000);
        let err = mutator
            .apply(AccountId::new(2), 10, TransactionKind::Debit)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::AccountNotFound(id) if id == AccountId::new(2)));
    }
}
