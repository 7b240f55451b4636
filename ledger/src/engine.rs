//! Core ledger engine implementation.

use tracing::{info, instrument};

use minibank_common::{AccountId, Result, TransactionRequest};

use crate::balance::AppliedBalance;
use crate::journal::TransactionEntry;
use crate::mutator::BalanceMutator;
use crate::recorder::{RecorderConfig, RecorderStatsSnapshot, TransactionRecorder};
use crate::statement::{Statement, StatementBuilder};
use crate::store::SharedStore;

/// The ledger engine ties the mutator, the recorder and the statement
/// builder to one store.
pub struct LedgerEngine {
    mutator: BalanceMutator,
    recorder: TransactionRecorder,
    statements: StatementBuilder,
}

impl LedgerEngine {
    /// Create a ledger engine and start its recorder worker.
    pub fn new(store: SharedStore, recorder_config: RecorderConfig) -> Self {
        Self {
            mutator: BalanceMutator::new(store.clone()),
            recorder: TransactionRecorder::spawn(store.clone(), recorder_config),
            statements: StatementBuilder::new(store),
        }
    }

    /// Apply a validated transaction and queue its log entry.
    ///
    /// Returns as soon as the balance is committed. The log entry is written
    /// later and its failure does not affect the result.
    #[instrument(skip(self, request), fields(account = %account_id))]
    pub async fn submit(
        &self,
        account_id: AccountId,
        request: TransactionRequest,
    ) -> Result<AppliedBalance> {
        let applied = self
            .mutator
            .apply(account_id, request.amount.value(), request.kind)
            .await?;

        self.recorder
            .record(TransactionEntry::for_commit(&applied, &request));

        Ok(applied)
    }

    /// Build the statement for an account.
    pub async fn statement(&self, account_id: AccountId) -> Result<Statement> {
        self.statements.statement(account_id).await
    }

    /// Get the recorder counters.
    pub fn recorder_stats(&self) -> RecorderStatsSnapshot {
        self.recorder.stats()
    }

    /// Drain pending log entries.
    pub async fn shutdown(&self) {
        info!("Draining ledger engine");
        self.recorder.shutdown().await;
    }
}
