//! Server-side sessions and CSRF tokens.
//!
//! A [`SessionContext`] is built once per request from whatever the
//! [`SessionStore`] holds for the presented cookie, handed to handlers as an
//! explicit value, and turned into a [`SessionCommit`] after the handler
//! returns. There is no process-wide session state.
//!
//! Identifiers rotate when the session has gone longer than the configured
//! interval without rotation, and on every login. Retired identifiers are
//! deleted from the store on commit, so an old cookie resolves to nothing.
//! A commit resumed from an id that a concurrent request has since deleted
//! is dropped by the store, so a stale request cannot bring it back.

pub mod store;

pub use store::{MemorySessionStore, SessionStore};

use crate::crypto;
use crate::errors::ScError;
use crate::models::{SessionUser, UserStatus};
use crate::observability::metrics::record_session_rotation;
use chrono::{DateTime, Duration, Utc};
use std::fmt;
use tracing::debug;

/// Everything persisted under one session id.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionData {
    pub user: Option<SessionUser>,
    /// Informational only; never compared against later requests.
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub csrf_token: Option<String>,
    pub last_rotated_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

impl SessionData {
    pub fn new(now: DateTime<Utc>) -> Self {
        SessionData {
            user: None,
            ip_address: None,
            user_agent: None,
            csrf_token: None,
            last_rotated_at: now,
            last_seen_at: now,
        }
    }

    /// True when there is nothing worth persisting.
    pub fn is_empty(&self) -> bool {
        self.user.is_none() && self.csrf_token.is_none()
    }
}

impl fmt::Debug for SessionData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionData")
            .field("user_id", &self.user.as_ref().map(|u| u.id))
            .field("csrf_token", &self.csrf_token.as_ref().map(|_| "[REDACTED]"))
            .field("last_rotated_at", &self.last_rotated_at)
            .field("last_seen_at", &self.last_seen_at)
            .finish_non_exhaustive()
    }
}

/// Client details recorded at login.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientBinding {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// What the cookie on the response should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieAction {
    Keep,
    Set(String),
    Clear,
}

/// Store writes and cookie change produced at the end of a request.
#[derive(Debug)]
pub struct SessionCommit {
    /// Stored id this request's data was loaded from.
    pub resumed_from: Option<String>,
    pub save: Option<(String, SessionData)>,
    pub delete: Vec<String>,
    pub cookie: CookieAction,
}

/// Request-scoped session.
pub struct SessionContext {
    id: Option<String>,
    presented_id: Option<String>,
    resumed_from: Option<String>,
    retired_ids: Vec<String>,
    data: SessionData,
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("has_id", &self.id.is_some())
            .field("retired", &self.retired_ids.len())
            .field("data", &self.data)
            .finish()
    }
}

impl SessionContext {
    /// Resume the stored session for `presented_id`, or start a fresh one.
    ///
    /// A resumed session whose last rotation is older than
    /// `rotation_interval` gets a new id; its data carries over.
    pub fn start_or_resume(
        presented_id: Option<String>,
        loaded: Option<SessionData>,
        now: DateTime<Utc>,
        rotation_interval: Duration,
    ) -> Result<Self, ScError> {
        let mut ctx = match loaded {
            Some(mut data) => {
                data.last_seen_at = now;
                SessionContext {
                    id: presented_id.clone(),
                    resumed_from: presented_id.clone(),
                    presented_id,
                    retired_ids: Vec::new(),
                    data,
                }
            }
            None => SessionContext {
                id: None,
                resumed_from: None,
                presented_id,
                retired_ids: Vec::new(),
                data: SessionData::new(now),
            },
        };

        if ctx.id.is_some() && now - ctx.data.last_rotated_at > rotation_interval {
            debug!(target: "sc.session", "Rotation interval elapsed");
            ctx.rotate_id(now)?;
        }

        Ok(ctx)
    }

    /// True only for a stored user with a positive id and active status.
    ///
    /// `Role` is a closed enum, so a present user always has a role.
    pub fn is_authenticated(&self) -> bool {
        match &self.data.user {
            Some(user) => user.id > 0 && user.status == UserStatus::Active,
            None => false,
        }
    }

    pub fn current_user(&self) -> Option<&SessionUser> {
        self.data.user.as_ref()
    }

    pub fn data(&self) -> &SessionData {
        &self.data
    }

    /// Current session id, if one has been assigned.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Return the session's CSRF token, generating one if absent.
    pub fn issue_csrf_token(&mut self) -> Result<String, ScError> {
        if let Some(token) = &self.data.csrf_token {
            return Ok(token.clone());
        }
        let token = crypto::generate_csrf_token()?;
        self.data.csrf_token = Some(token.clone());
        Ok(token)
    }

    /// Check a submitted token against the session's token in constant time.
    ///
    /// Fails when no token was ever issued or the candidate is empty.
    pub fn validate_csrf_token(&self, candidate: Option<&str>) -> bool {
        match (&self.data.csrf_token, candidate) {
            (Some(expected), Some(candidate)) if !candidate.is_empty() => {
                crypto::constant_time_eq(expected, candidate)
            }
            _ => false,
        }
    }

    /// Store an authenticated user and rotate the id.
    pub fn establish(
        &mut self,
        user: SessionUser,
        binding: ClientBinding,
        now: DateTime<Utc>,
    ) -> Result<(), ScError> {
        self.data.user = Some(user);
        self.data.ip_address = binding.ip_address;
        self.data.user_agent = binding.user_agent;
        self.rotate_id(now)
    }

    /// Replace the user snapshot with a freshly loaded record.
    pub fn refresh_user(&mut self, user: SessionUser) {
        self.data.user = Some(user);
    }

    /// Issue a new id for the same data; the old id is deleted on commit.
    pub fn rotate_id(&mut self, now: DateTime<Utc>) -> Result<(), ScError> {
        let new_id = crypto::generate_session_id()?;
        if let Some(old) = self.id.replace(new_id) {
            self.retired_ids.push(old);
        }
        self.data.last_rotated_at = now;
        record_session_rotation();
        Ok(())
    }

    /// Drop all session state.
    pub fn destroy(&mut self) {
        if let Some(old) = self.id.take() {
            self.retired_ids.push(old);
        }
        self.data = SessionData::new(self.data.last_seen_at);
    }

    /// Resolve store writes and the cookie change for this request.
    ///
    /// Drains the context: afterwards it holds an empty anonymous session.
    /// Empty sessions are never persisted.
    pub fn commit(&mut self) -> Result<SessionCommit, ScError> {
        let mut delete = std::mem::take(&mut self.retired_ids);
        let presented_id = self.presented_id.take();
        let resumed_from = self.resumed_from.take();
        let id = self.id.take();
        let last_seen_at = self.data.last_seen_at;
        let data = std::mem::replace(&mut self.data, SessionData::new(last_seen_at));

        if data.is_empty() {
            delete.extend(id);
            let cookie = if presented_id.is_some() {
                CookieAction::Clear
            } else {
                CookieAction::Keep
            };
            return Ok(SessionCommit {
                resumed_from,
                save: None,
                delete,
                cookie,
            });
        }

        let id = match id {
            Some(id) => id,
            None => crypto::generate_session_id()?,
        };
        let cookie = if presented_id.as_deref() == Some(id.as_str()) {
            CookieAction::Keep
        } else {
            CookieAction::Set(id.clone())
        };

        Ok(SessionCommit {
            resumed_from,
            save: Some((id, data)),
            delete,
            cookie,
        })
    }
}
