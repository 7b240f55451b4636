use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Json};
use serde::Serialize;
use serde_json::json;

use minibank_common::AccountId;
use minibank_ledger::Statement;

use crate::error::{ApiError, ApiResult};
use crate::service::LedgerService;

/// Response to an accepted transaction.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub balance: i64,
    pub limit: i64,
}

fn account_id(raw: &str) -> ApiResult<AccountId> {
    AccountId::parse(raw).ok_or_else(|| ApiError::UnknownAccount(raw.to_string()))
}

/// `POST /accounts/:id/transactions`
///
/// The raw body is handed to the service so malformed JSON is reported the
/// same way as any other invalid payload.
pub async fn create_transaction(
    State(service): State<Arc<LedgerService>>,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<TransactionResponse>> {
    let account_id = account_id(&raw_id)?;
    let applied = service.handle_transaction(account_id, &body).await?;

    Ok(Json(TransactionResponse {
        balance: applied.balance,
        limit: applied.limit,
    }))
}

/// `GET /accounts/:id/statement`
pub async fn get_statement(
    State(service): State<Arc<LedgerService>>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<Statement>> {
    let account_id = account_id(&raw_id)?;
    Ok(Json(service.handle_statement(account_id).await?))
}

/// Health check handler.
pub async fn health_handler(State(service): State<Arc<LedgerService>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": if service.is_accepting_requests() { "ok" } else { "unavailable" },
        "state": service.state(),
        "node_id": service.node_id(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Prometheus metrics handler.
pub async fn metrics_handler(State(service): State<Arc<LedgerService>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        service.render_metrics(),
    )
}
