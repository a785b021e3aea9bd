//! In-memory user directory.

use async_trait::async_trait;
use sc_service::errors::ScError;
use sc_service::models::UserRecord;
use sc_service::repositories::UserDirectory;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// User directory backed by a vector of records.
///
/// Clones share state, so a test can keep a handle and change a user's
/// status after handing the directory to the app.
#[derive(Clone, Default)]
pub struct MockUserDirectory {
    records: Arc<Mutex<Vec<UserRecord>>>,
    unavailable: Arc<AtomicBool>,
}

impl MockUserDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_user(self, record: UserRecord) -> Self {
        self.insert(record);
        self
    }

    pub fn insert(&self, record: UserRecord) {
        self.records.lock().unwrap().push(record);
    }

    /// Set the stored status of a user ("active", "inactive", ...).
    pub fn set_status(&self, user_id: i64, status: &str) {
        let mut records = self.records.lock().unwrap();
        if let Some(record) = records.iter_mut().find(|r| r.id == user_id) {
            record.status = status.to_string();
        }
    }

    pub fn remove(&self, user_id: i64) {
        self.records.lock().unwrap().retain(|r| r.id != user_id);
    }

    /// Make every lookup fail, as if the database were unreachable.
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
impl UserDirectory for MockUserDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, ScError> {
        self.check_available()?;
        let records = self.records.lock().unwrap();
        Ok(records.iter().find(|r| r.email == email).cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>, ScError> {
        self.check_available()?;
        let records = self.records.lock().unwrap();
        Ok(records.iter().find(|r| r.id == id).cloned())
    }
}
