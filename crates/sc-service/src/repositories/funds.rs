//! Fund ledgers with a cached running total.
//!
//! Each tenant (society or building) has ledger rows plus a `fund_total`
//! column on its own row. Writes go through a [`LedgerTransaction`] so the
//! ledger insert and the total update commit together or not at all.
//! Dropping an uncommitted transaction rolls it back.

use crate::errors::ScError;
use crate::models::{FundEntry, FundScope, NewFundEntry};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

#[async_trait]
pub trait FundLedger: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>, ScError>;

    /// Ledger rows for the tenant, newest first.
    async fn entries(&self, scope: FundScope) -> Result<Vec<FundEntry>, ScError>;

    /// The cached running total.
    async fn cached_total(&self, scope: FundScope) -> Result<i64, ScError>;

    /// Signed sum of every ledger row for the tenant.
    async fn ledger_sum(&self, scope: FundScope) -> Result<i64, ScError>;
}

/// An open ledger write.
#[async_trait]
pub trait LedgerTransaction: Send {
    async fn insert_entry(
        &mut self,
        scope: FundScope,
        entry: &NewFundEntry,
        created_by: i64,
    ) -> Result<FundEntry, ScError>;

    /// `total = total + delta`. Returns the new total; a missing tenant row is an error.
    async fn apply_delta(&mut self, scope: FundScope, delta_cents: i64) -> Result<i64, ScError>;

    async fn commit(self: Box<Self>) -> Result<(), ScError>;
}

pub struct PgFundLedger {
    pool: PgPool,
}

impl PgFundLedger {
    pub fn new(pool: PgPool) -> Self {
        PgFundLedger { pool }
    }
}

fn scope_id(scope: FundScope) -> i64 {
    match scope {
        FundScope::Society(s) => s.id(),
        FundScope::Building(b) => b.id(),
    }
}

const SIGNED_SUM: &str = "COALESCE(SUM(CASE WHEN entry_type = 'income' THEN amount_cents ELSE -amount_cents END), 0)::BIGINT";

#[async_trait]
impl FundLedger for PgFundLedger {
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>, ScError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| ScError::Database(format!("Failed to begin transaction: {}", e)))?;

        Ok(Box::new(PgLedgerTransaction { tx }))
    }

    async fn entries(&self, scope: FundScope) -> Result<Vec<FundEntry>, ScError> {
        let query = match scope {
            FundScope::Society(_) => {
                r#"
                SELECT id, amount_cents, entry_type, description, entry_date, created_at
                FROM society_fund
                WHERE society_id = $1
                ORDER BY entry_date DESC, id DESC
                "#
            }
            FundScope::Building(_) => {
                r#"
                SELECT id, amount_cents, entry_type, description, entry_date, created_at
                FROM building_fund
                WHERE building_id = $1
                ORDER BY entry_date DESC, id DESC
                "#
            }
        };

        sqlx::query_as::<_, FundEntry>(query)
            .bind(scope_id(scope))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ScError::Database(format!("Failed to list fund entries: {}", e)))
    }

    async fn cached_total(&self, scope: FundScope) -> Result<i64, ScError> {
        let query = match scope {
            FundScope::Society(_) => "SELECT fund_total FROM society WHERE id = $1",
            FundScope::Building(_) => "SELECT fund_total FROM buildings WHERE id = $1",
        };

        let total: Option<i64> = sqlx::query_scalar(query)
            .bind(scope_id(scope))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ScError::Database(format!("Failed to fetch fund total: {}", e)))?;

        total.ok_or_else(|| ScError::Database("Fund owner not found".to_string()))
    }

    async fn ledger_sum(&self, scope: FundScope) -> Result<i64, ScError> {
        let query = match scope {
            FundScope::Society(_) => {
                format!("SELECT {SIGNED_SUM} FROM society_fund WHERE society_id = $1")
            }
            FundScope::Building(_) => {
                format!("SELECT {SIGNED_SUM} FROM building_fund WHERE building_id = $1")
            }
        };

        sqlx::query_scalar::<_, i64>(&query)
            .bind(scope_id(scope))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| ScError::Database(format!("Failed to sum fund ledger: {}", e)))
    }
}

pub struct PgLedgerTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerTransaction for PgLedgerTransaction {
    async fn insert_entry(
        &mut self,
        scope: FundScope,
        entry: &NewFundEntry,
        created_by: i64,
    ) -> Result<FundEntry, ScError> {
        let query = match scope {
            FundScope::Society(_) => {
                r#"
                INSERT INTO society_fund
                    (society_id, amount_cents, entry_type, description, entry_date, created_by)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id, amount_cents, entry_type, description, entry_date, created_at
                "#
            }
            FundScope::Building(_) => {
                r#"
                INSERT INTO building_fund
                    (building_id, amount_cents, entry_type, description, entry_date, created_by)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id, amount_cents, entry_type, description, entry_date, created_at
                "#
            }
        };

        sqlx::query_as::<_, FundEntry>(query)
            .bind(scope_id(scope))
            .bind(entry.amount_cents)
            .bind(entry.entry_type.as_str())
            .bind(&entry.description)
            .bind(entry.entry_date)
            .bind(created_by)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| ScError::Database(format!("Failed to insert fund entry: {}", e)))
    }

    async fn apply_delta(&mut self, scope: FundScope, delta_cents: i64) -> Result<i64, ScError> {
        let query = match scope {
            FundScope::Society(_) => {
                "UPDATE society SET fund_total = fund_total + $1 WHERE id = $2 RETURNING fund_total"
            }
            FundScope::Building(_) => {
                "UPDATE buildings SET fund_total = fund_total + $1 WHERE id = $2 RETURNING fund_total"
            }
        };

        let total: Option<i64> = sqlx::query_scalar(query)
            .bind(delta_cents)
            .bind(scope_id(scope))
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| ScError::Database(format!("Failed to update fund total: {}", e)))?;

        total.ok_or_else(|| ScError::Database("Fund total update affected no rows".to_string()))
    }

    async fn commit(self: Box<Self>) -> Result<(), ScError> {
        self.tx
            .commit()
            .await
            .map_err(|e| ScError::Database(format!("Failed to commit fund entry: {}", e)))
    }
}
