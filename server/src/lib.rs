//! Minibank Server
//!
//! HTTP front for the ledger: accepts credit/debit transactions per account
//! and serves account statements.

pub mod config;
pub mod error;
pub mod handler;
pub mod metrics;
pub mod router;
pub mod server;
pub mod service;
pub mod state;

pub use config::{PoolConfig, ServerConfig, StoreBackend};
pub use error::{ApiError, ApiResult};
pub use server::LedgerServer;
pub use service::LedgerService;
pub use state::ServiceState;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use serde_json::Value;
    use tower::ServiceExt;

    use minibank_ledger::InMemoryLedgerStore;

    use super::*;

    fn app() -> (Router, Arc<LedgerService>) {
        let store = Arc::new(InMemoryLedgerStore::seeded());
        let service = Arc::new(LedgerService::new(
            ServerConfig::default(),
            "test-node".into(),
            store,
        ));
        service.start();
        (router::build_router(service.clone()), service)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    async fn post(app: &Router, account: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(format!("/accounts/{account}/transactions"))
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        send(app, request).await
    }

    async fn statement(app: &Router, account: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .uri(format!("/accounts/{account}/statement"))
            .body(Body::empty())
            .unwrap();
        send(app, request).await
    }

    #[tokio::test]
    async fn credit_then_debit_walkthrough() {
        let (app, service) = app();

        let (status, body) =
            post(&app, "1", r#"{"amount": 1000, "kind": "c", "description": "salary"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["balance"], 1000);
        assert_eq!(body["limit"], 100000);

        let (status, body) =
            post(&app, "1", r#"{"amount": 101001, "kind": "d", "description": "car"}"#).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "LIMIT_EXCEEDED");

        let (status, body) =
            post(&app, "1", r#"{"amount": 101000, "kind": "d", "description": "car"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["balance"], -100000);

        service.stop().await;

        let (status, body) = statement(&app, "1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["balance"]["total"], -100000);
        assert_eq!(body["balance"]["limit"], 100000);
        assert!(body["balance"]["as_of"].as_str().unwrap().ends_with('Z'));

        let lines = body["last_transactions"].as_array().unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["amount"], 101000);
        assert_eq!(lines[0]["kind"], "d");
        assert_eq!(lines[0]["description"], "car");
        assert_eq!(lines[1]["kind"], "c");
    }

    #[tokio::test]
    async fn unknown_accounts_are_not_found() {
        let (app, _) = app();

        let body = r#"{"amount": 1, "kind": "c", "description": "x"}"#;
        assert_eq!(post(&app, "6", body).await.0, StatusCode::NOT_FOUND);
        assert_eq!(post(&app, "abc", body).await.0, StatusCode::NOT_FOUND);
        assert_eq!(statement(&app, "6").await.0, StatusCode::NOT_FOUND);
        assert_eq!(statement(&app, "-1").await.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_bodies_are_unprocessable() {
        let (app, _) = app();

        let cases = [
            r#"{"amount": 1, "kind": "c", "description": "elevenchars"}"#,
            r#"{"amount": 1, "kind": "c", "description": ""}"#,
            r#"{"amount": 1.2, "kind": "c", "description": "x"}"#,
            r#"{"amount": 0, "kind": "c", "description": "x"}"#,
            r#"{"amount": 1, "kind": "x", "description": "x"}"#,
            r#"{"amount": 1, "kind": "c"}"#,
            r#"not json"#,
        ];

        for body in cases {
            let (status, json) = post(&app, "2", body).await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "body: {body}");
            assert_eq!(json["code"], "INVALID_REQUEST");
        }

        let (_, body) = statement(&app, "2").await;
        assert_eq!(body["balance"]["total"], 0);
        assert!(body["last_transactions"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn shutting_down_refuses_mutations() {
        let (app, service) = app();
        service.stop().await;

        let (status, body) =
            post(&app, "1", r#"{"amount": 1, "kind": "c", "description": "x"}"#).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], "UNAVAILABLE");
    }

    #[tokio::test]
    async fn health_and_metrics_endpoints() {
        let (app, _) = app();

        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "running");
        assert_eq!(body["node_id"], "test-node");

        post(&app, "3", r#"{"amount": 5, "kind": "d", "description": "fee"}"#).await;

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("minibank_mutations_accepted 1"));
    }
}
