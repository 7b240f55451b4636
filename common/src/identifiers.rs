//! Identifier types for ledger entities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a pre-provisioned account.
///
/// Accounts are keyed by the integer primary key of the account table.
/// The value is supplied by callers and never generated by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(i32);

impl AccountId {
    /// Create a new account ID.
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    /// Get the underlying integer key.
    pub const fn get(&self) -> i32 {
        self.0
    }

    /// Parse a path segment into an account ID.
    ///
    /// Returns `None` for anything that cannot name an account, so callers
    /// can treat it the same as an unknown id.
    pub fn parse(s: &str) -> Option<Self> {
        s.trim().parse::<i32>().ok().map(Self)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_id_parse() {
        assert_eq!(AccountId::parse("1"), Some(AccountId::new(1)));
        assert_eq!(AccountId::parse(" 42 "), Some(AccountId::new(42)));
        assert_eq!(AccountId::parse("abc"), None);
        assert_eq!(AccountId::parse(""), None);
        assert_eq!(AccountId::parse("99999999999"), None);
    }

    #[test]
    fn test_account_id_display() {
        assert_eq!(AccountId::new(7).to_string(), "7");
    }
}
