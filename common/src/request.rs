//! Transaction request validation.
//!
//! Request bodies are decoded leniently into [`TransactionPayload`] and then
//! checked field by field, so every malformed input ends up as a
//! [`LedgerError::Validation`] instead of a decoder-specific rejection.

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};
use crate::monetary::{Amount, Description, TransactionKind};

/// Raw transaction body as received from a client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionPayload {
    /// Amount in minor units. Kept as a JSON number so fractional values can
    /// be rejected explicitly.
    pub amount: Option<serde_json::Number>,
    /// Wire code, `"c"` or `"d"`.
    pub kind: Option<String>,
    /// Free-text label.
    pub description: Option<String>,
}

impl TransactionPayload {
    /// Decode a request body. Syntax errors are validation errors.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|e| LedgerError::Validation {
            message: format!("malformed body: {e}"),
            field: None,
        })
    }

    /// Validate every field and produce a typed request.
    pub fn validate(self) -> Result<TransactionRequest> {
        let amount = self
            .amount
            .as_ref()
            .and_then(serde_json::Number::as_i64)
            .ok_or_else(|| LedgerError::validation("amount must be an integer", "amount"))
            .and_then(Amount::new)?;

        let kind = self
            .kind
            .as_deref()
            .and_then(TransactionKind::from_code)
            .ok_or_else(|| LedgerError::validation("kind must be \"c\" or \"d\"", "kind"))?;

        let description = self
            .description
            .ok_or_else(|| LedgerError::validation("description is required", "description"))
            .and_then(|text| Description::new(text))?;

        Ok(TransactionRequest {
            amount,
            kind,
            description,
        })
    }
}

/// A validated transaction request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub amount: Amount,
    pub kind: TransactionKind,
    pub description: Description,
}
