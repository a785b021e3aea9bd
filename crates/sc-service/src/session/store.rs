//! Session persistence.

use super::{SessionCommit, SessionData};
use crate::errors::ScError;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Backing store for server-side sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the session for `id`, treating sessions idle past the timeout as absent.
    async fn load(&self, id: &str, now: DateTime<Utc>) -> Result<Option<SessionData>, ScError>;

    async fn save(&self, id: &str, data: SessionData) -> Result<(), ScError>;

    async fn delete(&self, id: &str) -> Result<(), ScError>;

    /// Atomically apply the writes resolved at the end of a request.
    ///
    /// Retired ids are always deleted. The save is dropped when the commit
    /// was resumed from an id that is no longer stored, meaning a
    /// concurrent request logged out or rotated it. Returns whether the
    /// session is live afterwards.
    async fn apply(&self, commit: &SessionCommit) -> Result<bool, ScError>;
}

/// In-process session store with idle expiry.
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, SessionData>>,
    idle_timeout: Duration,
}

impl MemorySessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        MemorySessionStore {
            sessions: RwLock::new(HashMap::new()),
            idle_timeout,
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Drop every session idle past the timeout. Returns how many were removed.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, data| now - data.last_seen_at <= self.idle_timeout);
        let purged = before - sessions.len();
        if purged > 0 {
            debug!(target: "sc.session", purged, "Purged idle sessions");
        }
        purged
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &str, now: DateTime<Utc>) -> Result<Option<SessionData>, ScError> {
        {
            let sessions = self.sessions.read().await;
            match sessions.get(id) {
                None => return Ok(None),
                Some(data) if now - data.last_seen_at <= self.idle_timeout => {
                    return Ok(Some(data.clone()))
                }
                Some(_) => {}
            }
        }

        self.sessions.write().await.remove(id);
        debug!(target: "sc.session", "Session expired after idle timeout");
        Ok(None)
    }

    async fn save(&self, id: &str, data: SessionData) -> Result<(), ScError> {
        self.sessions.write().await.insert(id.to_string(), data);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), ScError> {
        self.sessions.write().await.remove(id);
        Ok(())
    }

    async fn apply(&self, commit: &SessionCommit) -> Result<bool, ScError> {
        let mut sessions = self.sessions.write().await;
        let source_live = commit
            .resumed_from
            .as_ref()
            .map_or(true, |id| sessions.contains_key(id));

        for id in &commit.delete {
            sessions.remove(id);
        }

        match &commit.save {
            Some((id, data)) if source_live => {
                sessions.insert(id.clone(), data.clone());
                Ok(true)
            }
            Some(_) => {
                debug!(target: "sc.session", "Dropped save for a session ended by another request");
                Ok(false)
            }
            None => Ok(false),
        }
    }
}
