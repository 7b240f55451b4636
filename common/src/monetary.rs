//! Monetary types for the ledger.
//!
//! All amounts are integers in minor currency units. There is no floating
//! point anywhere on the money path.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{LedgerError, Result};

/// Maximum description length, in characters.
pub const DESCRIPTION_MAX_CHARS: usize = 10;

/// Direction of a balance movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    /// Money in.
    #[serde(rename = "c")]
    Credit,
    /// Money out.
    #[serde(rename = "d")]
    Debit,
}

impl TransactionKind {
    /// Wire code used by the API and the transaction table.
    pub fn code(&self) -> &'static str {
        match self {
            TransactionKind::Credit => "c",
            TransactionKind::Debit => "d",
        }
    }

    /// Parse a wire code. Anything other than `"c"` or `"d"` is rejected.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "c" => Some(TransactionKind::Credit),
            "d" => Some(TransactionKind::Debit),
            _ => None,
        }
    }

    /// Signed delta this kind applies to a balance.
    pub fn signed_delta(&self, amount: Amount) -> i64 {
        match self {
            TransactionKind::Credit => amount.value(),
            TransactionKind::Debit => -amount.value(),
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A strictly positive amount in minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Amount(i64);

impl Amount {
    /// Create an amount, rejecting zero and negative values.
    pub fn new(value: i64) -> Result<Self> {
        if value <= 0 {
            return Err(LedgerError::validation(
                "amount must be a positive integer",
                "amount",
            ));
        }
        Ok(Self(value))
    }

    /// Get the raw value.
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for Amount {
    type Error = LedgerError;

    fn try_from(value: i64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Amount> for i64 {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Short free-text label attached to a transaction (1 to 10 characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Description(String);

impl Description {
    /// Create a description, enforcing the length bounds.
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        let len = text.chars().count();
        if len == 0 || len > DESCRIPTION_MAX_CHARS {
            return Err(LedgerError::validation(
                format!("description must be 1 to {DESCRIPTION_MAX_CHARS} characters"),
                "description",
            ));
        }
        Ok(Self(text))
    }

    /// Get the description as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Description {
    type Error = LedgerError;

    fn try_from(text: String) -> Result<Self> {
        Self::new(text)
    }
}

impl From<Description> for String {
    fn from(description: Description) -> Self {
        description.0
    }
}

impl fmt::Display for Description {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether a committed balance respects the overdraft limit for a movement
/// of the given kind.
///
/// Only debits are checked. A credit can only raise the balance, so it never
/// moves an account further past its limit.
pub fn within_limit(kind: TransactionKind, balance: i64, limit: i64) -> bool {
    match kind {
        TransactionKind::Credit => true,
        TransactionKind::Debit => balance >= -limit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_codes() {
        assert_eq!(TransactionKind::from_code("c"), Some(TransactionKind::Credit));
        assert_eq!(TransactionKind::from_code("d"), Some(TransactionKind::Debit));
        assert_eq!(TransactionKind::from_code("x"), None);
        assert_eq!(TransactionKind::from_code("C"), None);
        assert_eq!(TransactionKind::Debit.code(), "d");
    }

    #[test]
    fn test_signed_delta() {
        let amount = Amount::new(500).unwrap();
        assert_eq!(TransactionKind::Credit.signed_delta(amount), 500);
        assert_eq!(TransactionKind::Debit.signed_delta(amount), -500);
    }

    #[test]
    fn test_amount_must_be_positive() {
        assert!(Amount::new(1).is_ok());
        assert!(Amount::new(0).is_err());
        assert!(Amount::new(-10).is_err());
    }

    #[test]
    fn test_description_bounds() {
        assert!(Description::new("a").is_ok());
        assert!(Description::new("0123456789").is_ok());
        assert!(Description::new("").is_err());
        assert!(Description::new("01234567890").is_err());
        // counted in characters, not bytes
        assert!(Description::new("çãçãçãçãçã").is_ok());
    }

    #[test]
    fn test_within_limit_checks_debits_only() {
        assert!(within_limit(TransactionKind::Debit, -1000, 1000));
        assert!(!within_limit(TransactionKind::Debit, -1001, 1000));
        assert!(within_limit(TransactionKind::Credit, -5000, 1000));
    }

    #[test]
    fn test_kind_serde() {
        let json = serde_json::to_string(&TransactionKind::Credit).unwrap();
        assert_eq!(json, "\"c\"");
        let kind: TransactionKind = serde_json::from_str("\"d\"").unwrap();
        assert_eq!(kind, TransactionKind::Debit);
    }
}
