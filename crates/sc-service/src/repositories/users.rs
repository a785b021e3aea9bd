//! User lookups for login and status revalidation.

use crate::errors::ScError;
use crate::models::UserRecord;
use async_trait::async_trait;
use sqlx::PgPool;

/// Point lookups over user records.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, ScError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>, ScError>;
}

pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        PgUserDirectory { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, ScError> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT
                id, name, email, password_hash, role,
                society_id, building_id, status
            FROM users
            WHERE email = $1
            LIMIT 1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ScError::Database(format!("Failed to fetch user by email: {}", e)))?;

        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>, ScError> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT
                id, name, email, password_hash, role,
                society_id, building_id, status
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ScError::Database(format!("Failed to fetch user by id: {}", e)))?;

        Ok(user)
    }
}
