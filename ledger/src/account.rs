//! Account definitions for the ledger.

use minibank_common::{within_limit, AccountId, Amount, LedgerError, Result, TransactionKind};
use serde::{Deserialize, Serialize};

/// A bounded-overdraft ledger account.
///
/// Accounts are provisioned out of band. The ledger only ever reads them
/// and moves `balance`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique account identifier.
    pub id: AccountId,
    /// Current balance in minor units. Negative means overdrawn.
    pub balance: i64,
    /// Maximum overdraft. The account must satisfy `balance >= -limit`.
    pub limit: i64,
}

impl Account {
    /// Create an account with a zero balance.
    pub fn new(id: AccountId, limit: i64) -> Self {
        Self {
            id,
            balance: 0,
            limit,
        }
    }

    /// Check the overdraft invariant.
    pub fn is_within_limit(&self) -> bool {
        self.balance >= -self.limit
    }

    /// Compute the balance a movement would leave, enforcing the limit.
    ///
    /// Does not modify the account.
    pub fn prospective_balance(&self, kind: TransactionKind, amount: Amount) -> Result<i64> {
        let prospective = self
            .balance
            .checked_add(kind.signed_delta(amount))
            .ok_or_else(|| LedgerError::validation("amount out of range", "amount"))?;

        if !within_limit(kind, prospective, self.limit) {
            return Err(LedgerError::LimitExceeded {
                account_id: self.id,
                attempted: prospective,
                limit: self.limit,
            });
        }

        Ok(prospective)
    }
}
