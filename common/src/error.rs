//! Error types for ledger operations.

use crate::AccountId;
use thiserror::Error;

/// Main error type for ledger operations.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Malformed request. Raised before any store access.
    #[error("Invalid request: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// The account id is unknown to the store.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// The movement would take the account past its overdraft limit.
    #[error("Limit exceeded for account {account_id}: balance would be {attempted}, limit {limit}")]
    LimitExceeded {
        account_id: AccountId,
        attempted: i64,
        limit: i64,
    },

    /// Connectivity or driver failure. The mutation is treated as not applied.
    #[error("Store error: {0}")]
    Store(String),

    /// The service is shutting down and refuses new work.
    #[error("Service unavailable")]
    Unavailable,

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Build a validation error tied to a request field.
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        LedgerError::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Whether the error was caused by the caller rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            LedgerError::Validation { .. }
                | LedgerError::AccountNotFound(_)
                | LedgerError::LimitExceeded { .. }
        )
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            LedgerError::Validation { .. } => "INVALID_REQUEST",
            LedgerError::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            LedgerError::LimitExceeded { .. } => "LIMIT_EXCEEDED",
            LedgerError::Store(_) => "STORE_ERROR",
            LedgerError::Unavailable => "UNAVAILABLE",
            LedgerError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Result type alias for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(LedgerError::AccountNotFound(AccountId::new(9)).is_client_error());
        assert!(LedgerError::validation("bad", "amount").is_client_error());
        assert!(!LedgerError::Store("connection reset".into()).is_client_error());
        assert!(!LedgerError::Unavailable.is_client_error());
    }

    #[test]
    fn test_limit_exceeded_message() {
        let err = LedgerError::LimitExceeded {
            account_id: AccountId::new(1),
            attempted: -1100,
            limit: 1000,
        };
        assert_eq!(err.error_code(), "LIMIT_EXCEEDED");
        assert!(err.to_string().contains("-1100"));
    }
}
