//! Minibank Ledger Engine
//!
//! Bounded-overdraft accounts with an atomic balance-mutation protocol, an
//! asynchronous transaction log and short statements.

pub mod account;
pub mod balance;
pub mod engine;
pub mod journal;
pub mod memory;
pub mod mutator;
pub mod postgres;
pub mod recorder;
pub mod statement;
pub mod store;

pub use account::Account;
pub use balance::{AccountSnapshot, AppliedBalance, BalanceSummary};
pub use engine::LedgerEngine;
pub use journal::TransactionEntry;
pub use memory::InMemoryLedgerStore;
pub use mutator::BalanceMutator;
pub use postgres::PgLedgerStore;
pub use recorder::{RecorderConfig, RecorderStatsSnapshot, TransactionRecorder};
pub use statement::{Statement, StatementBuilder, StatementLine, STATEMENT_ENTRIES};
pub use store::{LedgerStore, SharedStore};
