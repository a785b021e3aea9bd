//! Session middleware.
//!
//! Loads the session named by the cookie, hands it to the rest of the stack
//! as a [`SessionHandle`] request extension, and after the handler returns
//! writes the session back and sets or clears the cookie.

use crate::config::StatusPolicy;
use crate::errors::ScError;
use crate::routes::AppState;
use crate::services::auth_service;
use crate::session::{CookieAction, SessionContext};
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{error, instrument};

/// Shared handle to the request's session.
#[derive(Clone)]
pub struct SessionHandle(Arc<Mutex<SessionContext>>);

impl SessionHandle {
    pub fn new(ctx: SessionContext) -> Self {
        SessionHandle(Arc::new(Mutex::new(ctx)))
    }

    pub async fn lock(&self) -> MutexGuard<'_, SessionContext> {
        self.0.lock().await
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionHandle
where
    S: Send + Sync,
{
    type Rejection = ScError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<SessionHandle>().cloned().ok_or_else(|| {
            error!(target: "sc.session", "Session middleware not installed on this route");
            ScError::Internal
        })
    }
}

/// Read our session id from the Cookie headers. Malformed ids are ignored.
pub fn session_id_from_cookies(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value.trim())
        .filter(|value| value.len() == 64 && value.bytes().all(|b| b.is_ascii_hexdigit()))
        .map(str::to_string)
}

/// Build the Set-Cookie value for a cookie action, or `None` to leave it alone.
pub fn set_cookie_value(action: &CookieAction, cookie_name: &str, secure: bool) -> Option<String> {
    let secure = if secure { "; Secure" } else { "" };
    match action {
        CookieAction::Keep => None,
        CookieAction::Set(id) => Some(format!(
            "{cookie_name}={id}; Path=/; HttpOnly; SameSite=Lax{secure}"
        )),
        CookieAction::Clear => Some(format!(
            "{cookie_name}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0{secure}"
        )),
    }
}

/// Load, expose and persist the session around the inner service.
#[instrument(skip_all, name = "sc.middleware.session")]
pub async fn session_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let now = Utc::now();
    let cookie_name = state.config.session_cookie_name.as_str();
    let presented = session_id_from_cookies(req.headers(), cookie_name);

    let loaded = match &presented {
        Some(id) => match state.sessions.load(id, now).await {
            Ok(loaded) => loaded,
            Err(e) => {
                error!(target: "sc.session", error = %e, "Session load failed");
                return e.into_response();
            }
        },
        None => None,
    };

    let mut ctx = match SessionContext::start_or_resume(
        presented,
        loaded,
        now,
        state.config.session_rotation,
    ) {
        Ok(ctx) => ctx,
        Err(e) => return e.into_response(),
    };

    if state.config.status_policy == StatusPolicy::Revalidate && ctx.is_authenticated() {
        if let Err(e) = auth_service::revalidate_status(state.users.as_ref(), &mut ctx).await {
            error!(target: "sc.session", error = %e, "Session status revalidation failed");
            return e.into_response();
        }
    }

    let handle = SessionHandle::new(ctx);
    req.extensions_mut().insert(handle.clone());

    let mut response = next.run(req).await;

    let commit = match handle.lock().await.commit() {
        Ok(commit) => commit,
        Err(e) => return e.into_response(),
    };

    let cookie_action = match state.sessions.apply(&commit).await {
        Ok(false) if commit.save.is_some() => CookieAction::Clear,
        Ok(_) => commit.cookie,
        Err(e) => {
            error!(target: "sc.session", error = %e, "Session save failed");
            return e.into_response();
        }
    };

    if let Some(cookie) = set_cookie_value(
        &cookie_action,
        cookie_name,
        state.config.session_cookie_secure,
    ) {
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => {
                error!(target: "sc.session", error = %e, "Session cookie not encodable");
                return ScError::Internal.into_response();
            }
        }
    }

    response
}
