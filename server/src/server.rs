use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing::{info, warn};

use minibank_ledger::{InMemoryLedgerStore, PgLedgerStore, SharedStore};

use crate::config::{ServerConfig, StoreBackend};
use crate::error::ApiResult;
use crate::router::build_router;
use crate::service::LedgerService;

/// Ledger HTTP server.
pub struct LedgerServer {
    config: ServerConfig,
    node_id: String,
}

impl LedgerServer {
    pub fn new(config: ServerConfig, node_id: String) -> Self {
        Self { config, node_id }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Open the store, serve until Ctrl+C, then drain and close.
    pub async fn run(self) -> ApiResult<()> {
        let (store, pg) = self.open_store().await?;

        let service = Arc::new(LedgerService::new(
            self.config.clone(),
            self.node_id.clone(),
            store,
        ));
        let app = build_router(service.clone());

        let bind_addr = format!("{}:{}", self.config.listen_addr, self.config.listen_port);
        let listener = TcpListener::bind(&bind_addr).await?;

        service.start();
        info!(
            node_id = %self.node_id,
            listen_addr = %bind_addr,
            store = ?self.config.store_backend,
            "Ledger server running"
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        service.stop().await;

        if let Some(pg) = pg {
            pg.close().await;
        }

        info!("Ledger server shutdown complete");
        Ok(())
    }

    async fn open_store(&self) -> ApiResult<(SharedStore, Option<Arc<PgLedgerStore>>)> {
        match self.config.store_backend {
            StoreBackend::Memory => {
                info!("Using in-memory store with default accounts");
                Ok((Arc::new(InMemoryLedgerStore::seeded()), None))
            }
            StoreBackend::Postgres => {
                let pool = PgPoolOptions::new()
                    .max_connections(self.config.pool.max_connections)
                    .min_connections(self.config.pool.min_connections)
                    .acquire_timeout(self.config.pool.acquire_timeout)
                    .connect(&self.config.database_url)
                    .await?;

                let store = Arc::new(PgLedgerStore::new(pool));
                if self.config.seed_accounts {
                    store.ensure_schema().await?;
                    info!("Schema applied and accounts seeded");
                }

                info!(
                    max_connections = self.config.pool.max_connections,
                    "Connected to Postgres"
                );
                let shared: SharedStore = store.clone();
                Ok((shared, Some(store)))
            }
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
