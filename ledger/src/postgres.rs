//! Postgres-backed ledger store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::{Executor, Row};
use tracing::{debug, info, instrument};

use minibank_common::{
    within_limit, AccountId, Amount, Description, LedgerError, Result, TransactionKind,
};

use crate::account::Account;
use crate::balance::{AccountSnapshot, AppliedBalance, BalanceSummary};
use crate::journal::TransactionEntry;
use crate::store::LedgerStore;

/// Schema and seed accounts.
pub const SCHEMA: &str = include_str!("../migrations/0001_init.sql");

// The row lock taken by the UPDATE serializes concurrent movements on the
// same account until the enclosing transaction commits or rolls back.
const APPLY_MOVEMENT: &str = r#"
UPDATE accounts
SET balance = balance + $1
WHERE id = $2
RETURNING balance, account_limit, clock_timestamp() AS committed_at
"#;

const APPEND_ENTRY: &str = r#"
INSERT INTO transactions (account_id, amount, kind, description, occurred_at)
VALUES ($1, $2, $3, $4, $5)
"#;

const LOAD_ACCOUNT: &str = r#"
SELECT id, balance, account_limit FROM accounts WHERE id = $1
"#;

const SNAPSHOT: &str = r#"
SELECT a.balance, a.account_limit, statement_timestamp() AS as_of,
       t.amount, t.kind, t.description, t.occurred_at
FROM accounts a
LEFT JOIN LATERAL (
    SELECT id, amount, kind, description, occurred_at
    FROM transactions
    WHERE account_id = a.id
    ORDER BY occurred_at DESC, id DESC
    LIMIT $2
) t ON TRUE
WHERE a.id = $1
ORDER BY t.occurred_at DESC, t.id DESC
"#;

// SQLSTATE numeric_value_out_of_range
const OUT_OF_RANGE: &str = "22003";

/// Ledger store on a Postgres connection pool.
#[derive(Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    /// Wrap an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create tables and seed the default accounts if they are missing.
    pub async fn ensure_schema(&self) -> Result<()> {
        self.pool.execute(SCHEMA).await.map_err(store_error)?;
        info!("Ledger schema ensured");
        Ok(())
    }

    /// Close the pool, waiting for checked-out connections to return.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    #[instrument(skip(self), fields(account = %account_id))]
    async fn apply_movement(
        &self,
        account_id: AccountId,
        kind: TransactionKind,
        amount: Amount,
    ) -> Result<AppliedBalance> {
        // Dropping `tx` on any early return rolls it back.
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        let row = sqlx::query(APPLY_MOVEMENT)
            .bind(kind.signed_delta(amount))
            .bind(account_id.get())
            .fetch_optional(&mut *tx)
            .await
            .map_err(movement_error)?;

        let Some(row) = row else {
            tx.rollback().await.map_err(store_error)?;
            return Err(LedgerError::AccountNotFound(account_id));
        };

        let balance: i64 = row.try_get("balance").map_err(store_error)?;
        let limit: i64 = row.try_get("account_limit").map_err(store_error)?;
        let committed_at: DateTime<Utc> = row.try_get("committed_at").map_err(store_error)?;

        if !within_limit(kind, balance, limit) {
            tx.rollback().await.map_err(store_error)?;
            debug!(attempted = balance, limit, "Movement rolled back");
            return Err(LedgerError::LimitExceeded {
                account_id,
                attempted: balance,
                limit,
            });
        }

        tx.commit().await.map_err(store_error)?;

        Ok(AppliedBalance {
            account_id,
            balance,
            limit,
            committed_at,
        })
    }

    #[instrument(skip(self, entry), fields(account = %entry.account_id))]
    async fn append_entry(&self, entry: &TransactionEntry) -> Result<()> {
        sqlx::query(APPEND_ENTRY)
            .bind(entry.account_id.get())
            .bind(entry.amount.value())
            .bind(entry.kind.code())
            .bind(entry.description.as_str())
            .bind(entry.occurred_at)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    #[instrument(skip(self), fields(account = %account_id))]
    async fn snapshot(&self, account_id: AccountId, max_entries: usize) -> Result<AccountSnapshot> {
        let rows = sqlx::query(SNAPSHOT)
            .bind(account_id.get())
            .bind(i64::try_from(max_entries).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;

        let Some(first) = rows.first() else {
            return Err(LedgerError::AccountNotFound(account_id));
        };

        let summary = BalanceSummary {
            total: first.try_get("balance").map_err(store_error)?,
            limit: first.try_get("account_limit").map_err(store_error)?,
            as_of: first.try_get("as_of").map_err(store_error)?,
        };

        let mut entries = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(entry) = decode_entry(account_id, row)? {
                entries.push(entry);
            }
        }

        Ok(AccountSnapshot { summary, entries })
    }

    async fn load_account(&self, account_id: AccountId) -> Result<Account> {
        let row = sqlx::query(LOAD_ACCOUNT)
            .bind(account_id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?
            .ok_or(LedgerError::AccountNotFound(account_id))?;

        Ok(Account {
            id: account_id,
            balance: row.try_get("balance").map_err(store_error)?,
            limit: row.try_get("account_limit").map_err(store_error)?,
        })
    }
}

/// Decode the log columns of a snapshot row. The LEFT JOIN yields a single
/// all-NULL row for an account without entries.
fn decode_entry(account_id: AccountId, row: &PgRow) -> Result<Option<TransactionEntry>> {
    let amount: Option<i64> = row.try_get("amount").map_err(store_error)?;
    let Some(amount) = amount else {
        return Ok(None);
    };

    let kind: String = row.try_get("kind").map_err(store_error)?;
    let description: String = row.try_get("description").map_err(store_error)?;
    let occurred_at: DateTime<Utc> = row.try_get("occurred_at").map_err(store_error)?;

    Ok(Some(TransactionEntry {
        account_id,
        amount: Amount::new(amount).map_err(corrupt_row)?,
        kind: TransactionKind::from_code(&kind)
            .ok_or_else(|| LedgerError::Store(format!("corrupt row: unknown kind {kind:?}")))?,
        description: Description::new(description).map_err(corrupt_row)?,
        occurred_at,
    }))
}

fn store_error(e: sqlx::Error) -> LedgerError {
    LedgerError::Store(e.to_string())
}

fn movement_error(e: sqlx::Error) -> LedgerError {
    let out_of_range = e
        .as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == OUT_OF_RANGE);

    if out_of_range {
        LedgerError::validation("amount out of range", "amount")
    } else {
        store_error(e)
    }
}

fn corrupt_row(e: LedgerError) -> LedgerError {
    LedgerError::Store(format!("corrupt row: {e}"))
}
