//! Simulation scenarios.

use serde::{Deserialize, Serialize};

use minibank_common::TransactionKind;

/// A simulation scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Steps in the scenario.
    pub steps: Vec<ScenarioStep>,
}

/// A step in a scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScenarioStep {
    /// Wait for a duration.
    Wait { millis: u64 },
    /// Submit one transaction and check its outcome.
    Submit {
        account: i32,
        amount: i64,
        kind: TransactionKind,
        description: String,
        expect: Expectation,
    },
    /// Submit identical transactions concurrently.
    Burst {
        account: i32,
        count: usize,
        amount: i64,
        kind: TransactionKind,
    },
    /// Wait until every queued log entry has been written or has failed.
    AwaitRecorder,
    /// Inject a fault.
    InjectFault { fault_type: FaultType },
    /// Clear all faults.
    ClearFaults,
    /// Assert a condition.
    Assert { condition: AssertCondition },
}

/// Expected outcome of a single submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expectation {
    /// Accepted, leaving the given balance.
    Accepted { balance: i64 },
    /// Refused by the overdraft limit.
    Rejected,
    /// The account does not exist.
    NotFound,
}

/// Types of faults that can be injected.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum FaultType {
    /// Every log write fails.
    LogWriteFailure,
}

/// Conditions that can be asserted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AssertCondition {
    /// Account balance equals.
    BalanceEquals { account: i32, balance: i64 },
    /// Every seeded account is within its limit.
    AllWithinLimit,
    /// The last burst had this many accepted submissions.
    BurstAccepted { count: usize },
    /// The statement lists this many transactions.
    StatementLength { account: i32, len: usize },
    /// The statement lists these amounts, newest first.
    StatementAmounts { account: i32, amounts: Vec<i64> },
    /// The recorder reported at least this many failed writes.
    RecorderFailedAtLeast { count: u64 },
}

impl Scenario {
    /// Names accepted by [`Scenario::load`].
    pub const NAMES: [&'static str; 4] = [
        "walkthrough",
        "overdraft-race",
        "statement-window",
        "recorder-fault",
    ];

    /// Load a scenario by name.
    pub fn load(name: &str) -> anyhow::Result<Self> {
        match name {
            "walkthrough" => Ok(Self::walkthrough()),
            "overdraft-race" => Ok(Self::overdraft_race()),
            "statement-window" => Ok(Self::statement_window()),
            "recorder-fault" => Ok(Self::recorder_fault()),
            _ => Err(anyhow::anyhow!(
                "Unknown scenario: {} (expected one of {})",
                name,
                Self::NAMES.join(", ")
            )),
        }
    }

    /// Credit, rejected debit, debit to the limit, then a statement.
    fn walkthrough() -> Self {
        Self {
            name: "walkthrough".to_string(),
            description: "Credit and debit account 1 up to its overdraft limit".to_string(),
            steps: vec![
                submit(
                    1,
                    1000,
                    TransactionKind::Credit,
                    "salary",
                    Expectation::Accepted { balance: 1000 },
                ),
                submit(1, 101_001, TransactionKind::Debit, "car", Expectation::Rejected),
                submit(
                    1,
                    101_000,
                    TransactionKind::Debit,
                    "car",
                    Expectation::Accepted { balance: -100_000 },
                ),
                submit(6, 1, TransactionKind::Credit, "ghost", Expectation::NotFound),
                ScenarioStep::AwaitRecorder,
                ScenarioStep::Assert {
                    condition: AssertCondition::StatementAmounts {
                        account: 1,
                        amounts: vec![101_000, 1000],
                    },
                },
                ScenarioStep::Assert {
                    condition: AssertCondition::BalanceEquals {
                        account: 1,
                        balance: -100_000,
                    },
                },
            ],
        }
    }

    /// Many concurrent debits racing for the same overdraft room.
    fn overdraft_race() -> Self {
        Self {
            name: "overdraft-race".to_string(),
            description: "250 concurrent debits of 1000 against a 100000 limit".to_string(),
            steps: vec![
                ScenarioStep::Burst {
                    account: 1,
                    count: 250,
                    amount: 1000,
                    kind: TransactionKind::Debit,
                },
                ScenarioStep::Assert {
                    condition: AssertCondition::BurstAccepted { count: 100 },
                },
                ScenarioStep::Assert {
                    condition: AssertCondition::BalanceEquals {
                        account: 1,
                        balance: -100_000,
                    },
                },
                ScenarioStep::Assert {
                    condition: AssertCondition::AllWithinLimit,
                },
                ScenarioStep::AwaitRecorder,
                ScenarioStep::Assert {
                    condition: AssertCondition::StatementLength { account: 1, len: 10 },
                },
            ],
        }
    }

    /// Statements keep only the ten newest transactions.
    fn statement_window() -> Self {
        let mut steps: Vec<ScenarioStep> = (1..=15)
            .map(|amount| {
                submit(
                    3,
                    amount,
                    TransactionKind::Credit,
                    &format!("dep{amount}"),
                    Expectation::Accepted {
                        balance: (1..=amount).sum(),
                    },
                )
            })
            .collect();

        steps.push(ScenarioStep::AwaitRecorder);
        steps.push(ScenarioStep::Assert {
            condition: AssertCondition::StatementAmounts {
                account: 3,
                amounts: (6..=15).rev().collect(),
            },
        });

        Self {
            name: "statement-window".to_string(),
            description: "Fifteen credits, statement shows the newest ten".to_string(),
            steps,
        }
    }

    /// Log write failures never undo a committed balance.
    fn recorder_fault() -> Self {
        Self {
            name: "recorder-fault".to_string(),
            description: "Balance commits survive a failing transaction log".to_string(),
            steps: vec![
                ScenarioStep::InjectFault {
                    fault_type: FaultType::LogWriteFailure,
                },
                submit(
                    2,
                    500,
                    TransactionKind::Credit,
                    "lost",
                    Expectation::Accepted { balance: 500 },
                ),
                ScenarioStep::AwaitRecorder,
                ScenarioStep::Assert {
                    condition: AssertCondition::RecorderFailedAtLeast { count: 1 },
                },
                ScenarioStep::Assert {
                    condition: AssertCondition::StatementLength { account: 2, len: 0 },
                },
                ScenarioStep::ClearFaults,
                submit(
                    2,
                    500,
                    TransactionKind::Credit,
                    "kept",
                    Expectation::Accepted { balance: 1000 },
                ),
                ScenarioStep::AwaitRecorder,
                ScenarioStep::Assert {
                    condition: AssertCondition::StatementAmounts {
                        account: 2,
                        amounts: vec![500],
                    },
                },
                ScenarioStep::Assert {
                    condition: AssertCondition::BalanceEquals {
                        account: 2,
                        balance: 1000,
                    },
                },
            ],
        }
    }
}

fn submit(
    account: i32,
    amount: i64,
    kind: TransactionKind,
    description: &str,
    expect: Expectation,
) -> ScenarioStep {
    ScenarioStep::Submit {
        account,
        amount,
        kind,
        description: description.to_string(),
        expect,
    }
}
