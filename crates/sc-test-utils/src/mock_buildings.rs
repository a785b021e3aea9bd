//! In-memory building directory.

use async_trait::async_trait;
use chrono::Utc;
use sc_service::errors::ScError;
use sc_service::models::{Building, SocietyScope};
use sc_service::repositories::BuildingDirectory;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct MockBuildingDirectory {
    buildings: Arc<Mutex<Vec<Building>>>,
    unavailable: Arc<AtomicBool>,
}

impl MockBuildingDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a building with a zero fund total.
    #[must_use]
    pub fn with_building(self, id: i64, society_id: i64, building_name: &str) -> Self {
        self.buildings.lock().unwrap().push(Building {
            id,
            society_id,
            building_name: building_name.to_string(),
            fund_total_cents: 0,
            created_at: Utc::now(),
        });
        self
    }

    pub fn all(&self) -> Vec<Building> {
        self.buildings.lock().unwrap().clone()
    }

    /// Make every lookup fail.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), ScError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ScError::Database("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl BuildingDirectory for MockBuildingDirectory {
    async fn society_of(&self, building_id: i64) -> Result<Option<i64>, ScError> {
        self.check_available()?;
        let buildings = self.buildings.lock().unwrap();
        Ok(buildings
            .iter()
            .find(|b| b.id == building_id)
            .map(|b| b.society_id))
    }

    async fn find(&self, building_id: i64) -> Result<Option<Building>, ScError> {
        self.check_available()?;
        let buildings = self.buildings.lock().unwrap();
        Ok(buildings.iter().find(|b| b.id == building_id).cloned())
    }

    async fn list_for_society(&self, society: SocietyScope) -> Result<Vec<Building>, ScError> {
        self.check_available()?;
        let buildings = self.buildings.lock().unwrap();
        Ok(buildings
            .iter()
            .filter(|b| b.society_id == society.id())
            .cloned()
            .collect())
    }

    async fn create(&self, society: SocietyScope, building_name: &str) -> Result<Building, ScError> {
        self.check_available()?;
        let mut buildings = self.buildings.lock().unwrap();
        let id = buildings.iter().map(|b| b.id).max().unwrap_or(0) + 1;
        let building = Building {
            id,
            society_id: society.id(),
            building_name: building_name.to_string(),
            fund_total_cents: 0,
            created_at: Utc::now(),
        };
        buildings.push(building.clone());
        Ok(building)
    }
}
