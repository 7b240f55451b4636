//! Simulation controller.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, ensure};
use futures::future::join_all;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use minibank_common::{
    AccountId, Amount, Description, LedgerError, TransactionKind, TransactionRequest,
};
use minibank_ledger::memory::default_accounts;
use minibank_ledger::{InMemoryLedgerStore, LedgerEngine, LedgerStore, RecorderConfig};

use crate::metrics::SimulationMetrics;
use crate::scenario::{AssertCondition, Expectation, FaultType, Scenario, ScenarioStep};

const DESCRIPTIONS: [&str; 6] = ["rent", "salary", "coffee", "fuel", "refund", "gift"];

/// Controls the simulation.
pub struct SimulationController {
    /// Submissions per second in continuous mode, per worker.
    rate: f64,
    /// Concurrent workers in continuous mode.
    workers: usize,
    /// Random number generator.
    rng: Arc<RwLock<StdRng>>,
    /// Store the engine writes to.
    store: Arc<InMemoryLedgerStore>,
    /// Ledger under test.
    engine: Arc<LedgerEngine>,
    /// Simulation metrics.
    metrics: Arc<RwLock<SimulationMetrics>>,
    /// Running flag.
    running: Arc<RwLock<bool>>,
    /// Accepted count of the most recent burst.
    last_burst_accepted: RwLock<Option<usize>>,
}

impl SimulationController {
    /// Create a controller over a freshly seeded in-memory ledger.
    pub fn new(workers: usize, rate: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };

        let store = Arc::new(InMemoryLedgerStore::seeded());
        let engine = Arc::new(LedgerEngine::new(store.clone(), RecorderConfig::default()));

        Self {
            rate,
            workers: workers.max(1),
            rng: Arc::new(RwLock::new(rng)),
            store,
            engine,
            metrics: Arc::new(RwLock::new(SimulationMetrics::new())),
            running: Arc::new(RwLock::new(false)),
            last_burst_accepted: RwLock::new(None),
        }
    }

    /// Run a scenario, failing on the first unmet expectation.
    pub async fn run_scenario(&self, scenario: Scenario) -> anyhow::Result<()> {
        info!("Running scenario: {} - {}", scenario.name, scenario.description);

        *self.running.write().await = true;

        for (index, step) in scenario.steps.iter().enumerate() {
            if !*self.running.read().await {
                break;
            }

            self.execute_step(step)
                .await
                .map_err(|e| e.context(format!("step {} of {}", index + 1, scenario.name)))?;
        }

        *self.running.write().await = false;

        info!("Scenario {} passed", scenario.name);
        Ok(())
    }

    /// Run random load until the duration elapses or Ctrl+C, then check
    /// every account against its limit.
    pub async fn run(&self, duration: Option<Duration>) -> anyhow::Result<()> {
        info!(
            workers = self.workers,
            rate = self.rate,
            "Running simulation in continuous mode"
        );

        *self.running.write().await = true;

        let handles: Vec<_> = (0..self.workers)
            .map(|_| {
                let engine = self.engine.clone();
                let metrics = self.metrics.clone();
                let rng = self.rng.clone();
                let running = self.running.clone();
                let delay = Duration::from_secs_f64(1.0 / self.rate.max(0.001));

                tokio::spawn(async move {
                    while *running.read().await {
                        let generated = random_request(&mut *rng.write().await);
                        match generated {
                            Ok((account, request)) => {
                                submit_and_measure(&engine, &metrics, account, request).await;
                            }
                            Err(e) => {
                                warn!(error = %e, "Generated an invalid request");
                                metrics.write().await.record_failure();
                            }
                        }
                        tokio::time::sleep(delay).await;
                    }
                })
            })
            .collect();

        match duration {
            Some(d) => {
                tokio::time::sleep(d).await;
            }
            None => {
                tokio::signal::ctrl_c().await?;
            }
        }

        *self.running.write().await = false;
        for handle in join_all(handles).await {
            handle?;
        }

        self.check_all_within_limit().await
    }

    /// Drain the recorder.
    pub async fn shutdown(&self) {
        self.engine.shutdown().await;
    }

    /// Execute a single scenario step.
    async fn execute_step(&self, step: &ScenarioStep) -> anyhow::Result<()> {
        match step {
            ScenarioStep::Wait { millis } => {
                tokio::time::sleep(Duration::from_millis(*millis)).await;
            }
            ScenarioStep::Submit {
                account,
                amount,
                kind,
                description,
                expect,
            } => {
                let account = AccountId::new(*account);
                let request = TransactionRequest {
                    amount: Amount::new(*amount)?,
                    kind: *kind,
                    description: Description::new(description.as_str())?,
                };

                let outcome =
                    submit_and_measure(&self.engine, &self.metrics, account, request).await;
                check_expectation(account, *expect, outcome)?;
            }
            ScenarioStep::Burst {
                account,
                count,
                amount,
                kind,
            } => {
                let account = AccountId::new(*account);
                let amount = Amount::new(*amount)?;
                info!(%account, count, %kind, "Submitting burst");

                let handles: Vec<_> = (0..*count)
                    .map(|i| -> anyhow::Result<_> {
                        let engine = self.engine.clone();
                        let metrics = self.metrics.clone();
                        let request = TransactionRequest {
                            amount,
                            kind: *kind,
                            description: Description::new(format!("burst{}", i % 1000))?,
                        };
                        Ok(tokio::spawn(async move {
                            submit_and_measure(&engine, &metrics, account, request).await
                        }))
                    })
                    .collect::<anyhow::Result<_>>()?;

                let mut accepted = 0;
                for result in join_all(handles).await {
                    match result? {
                        Ok(_) => accepted += 1,
                        Err(LedgerError::LimitExceeded { .. }) => {}
                        Err(e) => bail!("burst submission failed: {e}"),
                    }
                }

                info!(%account, accepted, "Burst complete");
                *self.last_burst_accepted.write().await = Some(accepted);
            }
            ScenarioStep::AwaitRecorder => {
                tokio::time::timeout(Duration::from_secs(5), async {
                    while self.engine.recorder_stats().pending() > 0 {
                        tokio::time::sleep(Duration::from_millis(5)).await;
                    }
                })
                .await
                .map_err(|_| anyhow::anyhow!("recorder did not drain within 5s"))?;
            }
            ScenarioStep::InjectFault { fault_type } => {
                info!("Injecting fault {:?}", fault_type);
                match fault_type {
                    FaultType::LogWriteFailure => self.store.set_append_failure(true),
                }
            }
            ScenarioStep::ClearFaults => {
                info!("Clearing faults");
                self.store.set_append_failure(false);
            }
            ScenarioStep::Assert { condition } => {
                debug!("Asserting condition: {:?}", condition);
                self.check_condition(condition).await?;
            }
        }

        Ok(())
    }

    async fn check_condition(&self, condition: &AssertCondition) -> anyhow::Result<()> {
        match condition {
            AssertCondition::BalanceEquals { account, balance } => {
                let loaded = self.store.load_account(AccountId::new(*account)).await?;
                ensure!(
                    loaded.balance == *balance,
                    "account {account} balance is {}, expected {balance}",
                    loaded.balance
                );
            }
            AssertCondition::AllWithinLimit => self.check_all_within_limit().await?,
            AssertCondition::BurstAccepted { count } => {
                let accepted = *self.last_burst_accepted.read().await;
                ensure!(
                    accepted == Some(*count),
                    "burst accepted {accepted:?}, expected {count}"
                );
            }
            AssertCondition::StatementLength { account, len } => {
                let statement = self.engine.statement(AccountId::new(*account)).await?;
                ensure!(
                    statement.last_transactions.len() == *len,
                    "account {account} statement has {} lines, expected {len}",
                    statement.last_transactions.len()
                );
            }
            AssertCondition::StatementAmounts { account, amounts } => {
                let statement = self.engine.statement(AccountId::new(*account)).await?;
                let listed: Vec<i64> = statement
                    .last_transactions
                    .iter()
                    .map(|line| line.amount.value())
                    .collect();
                ensure!(
                    &listed == amounts,
                    "account {account} statement lists {listed:?}, expected {amounts:?}"
                );
            }
            AssertCondition::RecorderFailedAtLeast { count } => {
                let failed = self.engine.recorder_stats().failed;
                ensure!(
                    failed >= *count,
                    "recorder failed {failed} writes, expected at least {count}"
                );
            }
        }

        Ok(())
    }

    async fn check_all_within_limit(&self) -> anyhow::Result<()> {
        for seeded in default_accounts() {
            let account = self.store.load_account(seeded.id).await?;
            ensure!(
                account.is_within_limit(),
                "account {} balance {} is past limit {}",
                account.id,
                account.balance,
                account.limit
            );
        }
        Ok(())
    }

    /// Get simulation metrics.
    pub async fn get_metrics(&self) -> SimulationMetrics {
        self.metrics.read().await.clone()
    }

    /// Get recorder counters.
    pub fn recorder_stats(&self) -> minibank_ledger::RecorderStatsSnapshot {
        self.engine.recorder_stats()
    }
}

fn random_request(rng: &mut StdRng) -> minibank_common::Result<(AccountId, TransactionRequest)> {
    let account = AccountId::new(rng.gen_range(1..=5));
    let kind = if rng.gen_bool(0.5) {
        TransactionKind::Credit
    } else {
        TransactionKind::Debit
    };

    let amount = Amount::new(rng.gen_range(1..=50_000))?;
    let description = Description::new(DESCRIPTIONS[rng.gen_range(0..DESCRIPTIONS.len())])?;

    Ok((
        account,
        TransactionRequest {
            amount,
            kind,
            description,
        },
    ))
}

async fn submit_and_measure(
    engine: &LedgerEngine,
    metrics: &RwLock<SimulationMetrics>,
    account: AccountId,
    request: TransactionRequest,
) -> minibank_common::Result<minibank_ledger::AppliedBalance> {
    let started = Instant::now();
    let outcome = engine.submit(account, request).await;
    let latency_us = started.elapsed().as_micros() as u64;

    let mut metrics = metrics.write().await;
    match &outcome {
        Ok(_) => metrics.record_accepted(latency_us),
        Err(LedgerError::LimitExceeded { .. }) => metrics.record_rejected(latency_us),
        Err(_) => metrics.record_failure(),
    }
    outcome
}

fn check_expectation(
    account: AccountId,
    expect: Expectation,
    outcome: minibank_common::Result<minibank_ledger::AppliedBalance>,
) -> anyhow::Result<()> {
    match (expect, outcome) {
        (Expectation::Accepted { balance }, Ok(applied)) => {
            ensure!(
                applied.balance == balance,
                "account {account} balance is {}, expected {balance}",
                applied.balance
            );
            Ok(())
        }
        (Expectation::Rejected, Err(LedgerError::LimitExceeded { .. })) => Ok(()),
        (Expectation::NotFound, Err(LedgerError::AccountNotFound(_))) => Ok(()),
        (expect, Ok(applied)) => bail!(
            "account {account}: expected {expect:?}, got balance {}",
            applied.balance
        ),
        (expect, Err(e)) => bail!("account {account}: expected {expect:?}, got {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scenarios_pass() {
        for name in Scenario::NAMES {
            let controller = SimulationController::new(1, 10.0, Some(7));
            controller
                .run_scenario(Scenario::load(name).unwrap())
                .await
                .unwrap_or_else(|e| panic!("{name}: {e:#}"));
            controller.shutdown().await;
        }
    }

    #[tokio::test]
    async fn test_failed_expectation_is_reported() {
        let controller = SimulationController::new(1, 10.0, Some(7));
        let scenario = Scenario {
            name: "bad".to_string(),
            description: "expects the wrong balance".to_string(),
            steps: vec![ScenarioStep::Submit {
                account: 1,
                amount: 10,
                kind: TransactionKind::Credit,
                description: "x".to_string(),
                expect: Expectation::Accepted { balance: 11 },
            }],
        };

        let err = controller.run_scenario(scenario).await.unwrap_err();
        assert!(format!("{err:#}").contains("expected 11"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_continuous_load_respects_limits() {
        let controller = SimulationController::new(8, 1000.0, Some(42));
        controller
            .run(Some(Duration::from_millis(200)))
            .await
            .unwrap();

        let metrics = controller.get_metrics().await;
        assert!(metrics.total_transactions > 0);
        assert_eq!(metrics.failed, 0);
        controller.shutdown().await;
    }
}
