//! In-memory meeting repository.

use async_trait::async_trait;
use chrono::Utc;
use sc_service::errors::ScError;
use sc_service::models::{BuildingScope, Meeting, MeetingLevel, NewMeeting, SocietyScope};
use sc_service::repositories::MeetingRepository;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct MockMeetingRepository {
    meetings: Arc<Mutex<Vec<Meeting>>>,
}

impl MockMeetingRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<Meeting> {
        self.meetings.lock().unwrap().clone()
    }
}

#[async_trait]
impl MeetingRepository for MockMeetingRepository {
    async fn create(&self, meeting: &NewMeeting) -> Result<Meeting, ScError> {
        let mut meetings = self.meetings.lock().unwrap();
        let created = Meeting {
            id: meetings.len() as i64 + 1,
            level: meeting.level,
            society_id: meeting.society_id,
            building_id: meeting.building_id,
            title: meeting.title.clone(),
            meeting_date: meeting.meeting_date,
            created_at: Utc::now(),
        };
        meetings.push(created.clone());
        Ok(created)
    }

    async fn list_for_society(&self, society: SocietyScope) -> Result<Vec<Meeting>, ScError> {
        let meetings = self.meetings.lock().unwrap();
        Ok(meetings
            .iter()
            .filter(|m| m.level == MeetingLevel::Society && m.society_id == Some(society.id()))
            .cloned()
            .collect())
    }

    async fn list_for_building(
        &self,
        building: BuildingScope,
        society_id: Option<i64>,
    ) -> Result<Vec<Meeting>, ScError> {
        let meetings = self.meetings.lock().unwrap();
        Ok(meetings
            .iter()
            .filter(|m| match m.level {
                MeetingLevel::Building => m.building_id == Some(building.id()),
                MeetingLevel::Society => society_id.is_some() && m.society_id == society_id,
            })
            .cloned()
            .collect())
    }
}
