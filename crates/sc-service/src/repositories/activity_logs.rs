//! Activity log writes.

use crate::errors::ScError;
use async_trait::async_trait;
use sqlx::PgPool;

/// One recorded user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityEntry {
    pub user_id: Option<i64>,
    pub action: &'static str,
    pub details: String,
    pub ip_address: Option<String>,
}

#[async_trait]
pub trait ActivityLog: Send + Sync {
    async fn record(&self, entry: &ActivityEntry) -> Result<(), ScError>;
}

pub struct PgActivityLog {
    pool: PgPool,
}

impl PgActivityLog {
    pub fn new(pool: PgPool) -> Self {
        PgActivityLog { pool }
    }
}

#[async_trait]
impl ActivityLog for PgActivityLog {
    async fn record(&self, entry: &ActivityEntry) -> Result<(), ScError> {
        sqlx::query(
            r#"
            INSERT INTO activity_logs (user_id, action, details, ip_address)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(entry.user_id)
        .bind(entry.action)
        .bind(&entry.details)
        .bind(entry.ip_address.as_deref())
        .execute(&self.pool)
        .await
        .map_err(|e| ScError::Database(format!("Failed to write activity log: {}", e)))?;

        Ok(())
    }
}
