use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handler;
use crate::service::LedgerService;

/// Build the axum router with all ledger endpoints.
pub fn build_router(service: Arc<LedgerService>) -> Router {
    Router::new()
        .route("/accounts/:id/transactions", post(handler::create_transaction))
        .route("/accounts/:id/statement", get(handler::get_statement))
        .route("/health", get(handler::health_handler))
        .route("/metrics", get(handler::metrics_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}
