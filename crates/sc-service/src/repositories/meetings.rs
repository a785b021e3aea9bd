//! Society- and building-level meetings.

use crate::errors::ScError;
use crate::models::{BuildingScope, Meeting, NewMeeting, SocietyScope};
use async_trait::async_trait;
use sqlx::PgPool;

#[async_trait]
pub trait MeetingRepository: Send + Sync {
    async fn create(&self, meeting: &NewMeeting) -> Result<Meeting, ScError>;

    /// Society-level meetings of one society.
    async fn list_for_society(&self, society: SocietyScope) -> Result<Vec<Meeting>, ScError>;

    /// A building's own meetings plus the society-level meetings of `society_id`.
    async fn list_for_building(
        &self,
        building: BuildingScope,
        society_id: Option<i64>,
    ) -> Result<Vec<Meeting>, ScError>;
}

pub struct PgMeetingRepository {
    pool: PgPool,
}

impl PgMeetingRepository {
    pub fn new(pool: PgPool) -> Self {
        PgMeetingRepository { pool }
    }
}

#[async_trait]
impl MeetingRepository for PgMeetingRepository {
    async fn create(&self, meeting: &NewMeeting) -> Result<Meeting, ScError> {
        sqlx::query_as::<_, Meeting>(
            r#"
            INSERT INTO meetings (level, society_id, building_id, title, meeting_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, level, society_id, building_id, title, meeting_date, created_at
            "#,
        )
        .bind(meeting.level.as_str())
        .bind(meeting.society_id)
        .bind(meeting.building_id)
        .bind(&meeting.title)
        .bind(meeting.meeting_date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| ScError::Database(format!("Failed to create meeting: {}", e)))
    }

    async fn list_for_society(&self, society: SocietyScope) -> Result<Vec<Meeting>, ScError> {
        sqlx::query_as::<_, Meeting>(
            r#"
            SELECT id, level, society_id, building_id, title, meeting_date, created_at
            FROM meetings
            WHERE level = 'society' AND society_id = $1
            ORDER BY meeting_date DESC, id DESC
            "#,
        )
        .bind(society.id())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ScError::Database(format!("Failed to list society meetings: {}", e)))
    }

    async fn list_for_building(
        &self,
        building: BuildingScope,
        society_id: Option<i64>,
    ) -> Result<Vec<Meeting>, ScError> {
        sqlx::query_as::<_, Meeting>(
            r#"
            SELECT id, level, society_id, building_id, title, meeting_date, created_at
            FROM meetings
            WHERE (level = 'building' AND building_id = $1)
               OR (level = 'society' AND society_id = $2)
            ORDER BY meeting_date DESC, id DESC
            "#,
        )
        .bind(building.id())
        .bind(society_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ScError::Database(format!("Failed to list building meetings: {}", e)))
    }
}
