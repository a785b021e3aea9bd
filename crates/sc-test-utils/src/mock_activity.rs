//! Activity log that records entries in memory.

use async_trait::async_trait;
use sc_service::errors::ScError;
use sc_service::repositories::{ActivityEntry, ActivityLog};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Default)]
pub struct MockActivityLog {
    entries: Arc<Mutex<Vec<ActivityEntry>>>,
    failing: Arc<AtomicBool>,
}

impl MockActivityLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn entries(&self) -> Vec<ActivityEntry> {
        self.entries.lock().unwrap().clone()
    }

    /// Poll until an entry with `action` appears. Writes are spawned, so
    /// they can land after the response.
    pub async fn wait_for(&self, action: &str) -> Option<ActivityEntry> {
        for _ in 0..50 {
            if let Some(entry) = self.entries().into_iter().find(|e| e.action == action) {
                return Some(entry);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        None
    }
}

#[async_trait]
impl ActivityLog for MockActivityLog {
    async fn record(&self, entry: &ActivityEntry) -> Result<(), ScError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ScError::Database("activity log unavailable".to_string()));
        }
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }
}
