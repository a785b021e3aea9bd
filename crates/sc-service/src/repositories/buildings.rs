//! Building lookups.
//!
//! `society_of` backs the cross-entity ownership check: it is the only
//! place a society-level caller's claim over a building is resolved.

use crate::errors::ScError;
use crate::models::{Building, SocietyScope};
use async_trait::async_trait;
use sqlx::PgPool;

#[async_trait]
pub trait BuildingDirectory: Send + Sync {
    /// Society that owns `building_id`, or `None` if no such building exists.
    async fn society_of(&self, building_id: i64) -> Result<Option<i64>, ScError>;

    async fn find(&self, building_id: i64) -> Result<Option<Building>, ScError>;

    async fn list_for_society(&self, society: SocietyScope) -> Result<Vec<Building>, ScError>;

    async fn create(&self, society: SocietyScope, building_name: &str) -> Result<Building, ScError>;
}

pub struct PgBuildingDirectory {
    pool: PgPool,
}

impl PgBuildingDirectory {
    pub fn new(pool: PgPool) -> Self {
        PgBuildingDirectory { pool }
    }
}

#[async_trait]
impl BuildingDirectory for PgBuildingDirectory {
    async fn society_of(&self, building_id: i64) -> Result<Option<i64>, ScError> {
        let society_id: Option<i64> =
            sqlx::query_scalar("SELECT society_id FROM buildings WHERE id = $1")
                .bind(building_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    ScError::Database(format!("Failed to fetch building owner: {}", e))
                })?;

        Ok(society_id)
    }

    async fn find(&self, building_id: i64) -> Result<Option<Building>, ScError> {
        let building = sqlx::query_as::<_, Building>(
            r#"
            SELECT id, society_id, building_name, fund_total AS fund_total_cents, created_at
            FROM buildings
            WHERE id = $1
            "#,
        )
        .bind(building_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ScError::Database(format!("Failed to fetch building: {}", e)))?;

        Ok(building)
    }

    async fn list_for_society(&self, society: SocietyScope) -> Result<Vec<Building>, ScError> {
        let buildings = sqlx::query_as::<_, Building>(
            r#"
            SELECT id, society_id, building_name, fund_total AS fund_total_cents, created_at
            FROM buildings
            WHERE society_id = $1
            ORDER BY building_name ASC, id ASC
            "#,
        )
        .bind(society.id())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ScError::Database(format!("Failed to list buildings: {}", e)))?;

        Ok(buildings)
    }

    async fn create(&self, society: SocietyScope, building_name: &str) -> Result<Building, ScError> {
        let building = sqlx::query_as::<_, Building>(
            r#"
            INSERT INTO buildings (society_id, building_name)
            VALUES ($1, $2)
            RETURNING id, society_id, building_name, fund_total AS fund_total_cents, created_at
            "#,
        )
        .bind(society.id())
        .bind(building_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| ScError::Database(format!("Failed to create building: {}", e)))?;

        Ok(building)
    }
}
