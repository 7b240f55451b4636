use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use thiserror::Error;

use minibank_common::LedgerError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Path segment that is not an account id. No account can match it.
    #[error("account not found: {0}")]
    UnknownAccount(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Ledger(err) => match err {
                LedgerError::Validation { .. } | LedgerError::LimitExceeded { .. } => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                LedgerError::AccountNotFound(_) => StatusCode::NOT_FOUND,
                LedgerError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
                LedgerError::Store(_) | LedgerError::Internal(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::UnknownAccount(_) => StatusCode::NOT_FOUND,
            ApiError::Io(_) | ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Ledger(err) => err.error_code(),
            ApiError::UnknownAccount(_) => "ACCOUNT_NOT_FOUND",
            ApiError::Io(_) | ApiError::Database(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        // Store details stay in the log.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "internal error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorBody {
            code: self.code(),
            message,
        };
        (status, Json(body)).into_response()
    }
}
