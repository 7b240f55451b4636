//! Ledger service: request admission, metrics and lifecycle around the engine.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{error, info, instrument, warn};

use minibank_common::{AccountId, LedgerError, Result, TransactionPayload};
use minibank_ledger::{AppliedBalance, LedgerEngine, SharedStore, Statement};

use crate::config::ServerConfig;
use crate::metrics::{Metrics, SharedMetrics};
use crate::state::ServiceState;

/// The service shared by all request handlers.
pub struct LedgerService {
    /// Configuration.
    config: ServerConfig,
    /// Node ID for this instance.
    node_id: String,
    /// Current lifecycle state.
    state: Arc<RwLock<ServiceState>>,
    /// Ledger engine.
    engine: Arc<LedgerEngine>,
    /// Service metrics.
    metrics: SharedMetrics,
}

impl LedgerService {
    /// Create a service over a store. Starts the recorder worker, so this
    /// must run inside a tokio runtime.
    pub fn new(config: ServerConfig, node_id: String, store: SharedStore) -> Self {
        let engine = Arc::new(LedgerEngine::new(store, config.recorder.clone()));

        Self {
            config,
            node_id,
            state: Arc::new(RwLock::new(ServiceState::Starting)),
            engine,
            metrics: Arc::new(Metrics::new()),
        }
    }

    /// Start accepting requests.
    #[instrument(skip(self))]
    pub fn start(&self) {
        *self.state.write() = ServiceState::Running;
        info!(node_id = %self.node_id, "Ledger service started");
    }

    /// Stop the service gracefully.
    ///
    /// New mutations are refused, in-flight ones are given up to the drain
    /// timeout to finish, then the recorder is drained.
    #[instrument(skip(self))]
    pub async fn stop(&self) {
        info!(node_id = %self.node_id, "Stopping ledger service");

        *self.state.write() = ServiceState::ShuttingDown;

        self.drain_active_mutations().await;
        self.engine.shutdown().await;

        *self.state.write() = ServiceState::Stopped;

        let recorder = self.engine.recorder_stats();
        info!(
            node_id = %self.node_id,
            written = recorder.written,
            failed = recorder.failed,
            dropped = recorder.dropped,
            "Ledger service stopped"
        );
    }

    /// Handle a transaction request body for an account.
    ///
    /// The mutation runs on its own task so a dropped client connection
    /// cannot abandon it between commit and recording.
    #[instrument(skip(self, body), fields(account = %account_id))]
    pub async fn handle_transaction(
        &self,
        account_id: AccountId,
        body: &[u8],
    ) -> Result<AppliedBalance> {
        self.metrics.mutation_started();
        if !self.is_accepting_requests() {
            self.metrics.mutation_refused();
            return Err(LedgerError::Unavailable);
        }

        let request = match TransactionPayload::from_slice(body).and_then(|p| p.validate()) {
            Ok(request) => request,
            Err(e) => {
                let outcome = Err(e);
                self.metrics.mutation_finished(&outcome);
                return outcome;
            }
        };

        let engine = self.engine.clone();
        let metrics = self.metrics.clone();

        let task = tokio::spawn(async move {
            let outcome = engine.submit(account_id, request).await;
            metrics.mutation_finished(&outcome);
            outcome
        });

        task.await.map_err(|e| {
            error!(error = %e, "Mutation task failed");
            LedgerError::Internal(e.to_string())
        })?
    }

    /// Build the statement for an account.
    #[instrument(skip(self), fields(account = %account_id))]
    pub async fn handle_statement(&self, account_id: AccountId) -> Result<Statement> {
        match self.engine.statement(account_id).await {
            Ok(statement) => {
                self.metrics.statement_served();
                Ok(statement)
            }
            Err(e) => {
                if !e.is_client_error() {
                    self.metrics.statement_failed();
                }
                Err(e)
            }
        }
    }

    /// Check if the service is accepting requests.
    pub fn is_accepting_requests(&self) -> bool {
        self.state.read().accepts_requests()
    }

    /// Get the current service state.
    pub fn state(&self) -> ServiceState {
        *self.state.read()
    }

    /// Get the node ID.
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Get the service metrics.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Render metrics, including recorder counters, in Prometheus format.
    pub fn render_metrics(&self) -> String {
        self.metrics.to_prometheus(&self.engine.recorder_stats())
    }

    async fn drain_active_mutations(&self) {
        use tokio::time::{timeout, Duration};

        let drained = timeout(self.config.drain_timeout, async {
            loop {
                let active = self.metrics.active_mutations();
                if active == 0 {
                    break;
                }
                info!(active, "Waiting for in-flight mutations");
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        })
        .await;

        if drained.is_err() {
            warn!(
                active = self.metrics.active_mutations(),
                "Drain timeout elapsed with mutations in flight"
            );
        }
    }
}
