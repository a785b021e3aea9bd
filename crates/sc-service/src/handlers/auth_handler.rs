//! Login, logout, CSRF delivery and the role redirect.

use crate::errors::{ClientKind, Rejection, ScError};
use crate::middleware::SessionHandle;
use crate::models::LOGIN_PATH;
use crate::repositories::ActivityEntry;
use crate::routes::AppState;
use crate::services::{access_service, activity_service, auth_service};
use crate::session::ClientBinding;
use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequest, Request, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use chrono::Utc;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct CsrfResponse {
    pub csrf_token: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub redirect: &'static str,
}

#[derive(Deserialize)]
struct LoginFields {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

/// Login credentials from a urlencoded form or a JSON body.
///
/// An unreadable body counts as missing credentials.
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

#[async_trait]
impl<S> FromRequest<S> for Credentials
where
    S: Send + Sync,
{
    type Rejection = ScError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("application/json"));

        let fields = if is_json {
            Json::<LoginFields>::from_request(req, state)
                .await
                .map(|Json(fields)| fields)
                .map_err(|_| ScError::MissingCredentials)?
        } else {
            Form::<LoginFields>::from_request(req, state)
                .await
                .map(|Form(fields)| fields)
                .map_err(|_| ScError::MissingCredentials)?
        };

        Ok(Credentials {
            email: fields.email,
            password: SecretString::from(fields.password),
        })
    }
}

fn client_binding(connect: Option<ConnectInfo<SocketAddr>>, headers: &HeaderMap) -> ClientBinding {
    ClientBinding {
        ip_address: connect.map(|ConnectInfo(addr)| addr.ip().to_string()),
        user_agent: headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    }
}

/// GET /auth/login
///
/// An authenticated session goes straight to its landing page. Otherwise
/// the response carries the CSRF token the login form must post back.
pub async fn login_page(session: SessionHandle) -> Result<Response, ScError> {
    let mut session = session.lock().await;
    if session.is_authenticated() {
        return Ok(Redirect::to(access_service::landing_for(&session)).into_response());
    }

    let csrf_token = session.issue_csrf_token()?;
    Ok(Json(CsrfResponse { csrf_token }).into_response())
}

fn landing_response(client: ClientKind, redirect: &'static str) -> Response {
    match client {
        ClientKind::Browser => Redirect::to(redirect).into_response(),
        ClientKind::Api => Json(LoginResponse { redirect }).into_response(),
    }
}

/// POST /auth/login
///
/// An already authenticated session is sent to its landing page; submitted
/// credentials are ignored and the session user is left as it was.
pub async fn login(
    State(state): State<Arc<AppState>>,
    client: ClientKind,
    session: SessionHandle,
    connect: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    credentials: Result<Credentials, ScError>,
) -> Result<Response, Rejection> {
    let mut session = session.lock().await;
    if session.is_authenticated() {
        return Ok(landing_response(client, access_service::landing_for(&session)));
    }

    let credentials = credentials.map_err(client.reject())?;
    let binding = client_binding(connect, &headers);
    let ip_address = binding.ip_address.clone();

    let user = auth_service::login(
        state.users.as_ref(),
        &mut session,
        &credentials.email,
        &credentials.password,
        binding,
        Utc::now(),
    )
    .await
    .map_err(client.reject())?;

    activity_service::record(
        state.activity.clone(),
        ActivityEntry {
            user_id: Some(user.id),
            action: "login",
            details: "User logged in".to_string(),
            ip_address,
        },
    );

    Ok(landing_response(client, access_service::landing_for(&session)))
}

/// GET /auth/logout
pub async fn logout(session: SessionHandle) -> Redirect {
    auth_service::logout(&mut *session.lock().await);
    Redirect::to(LOGIN_PATH)
}

/// GET /auth/csrf
pub async fn csrf_token(session: SessionHandle) -> Result<Json<CsrfResponse>, ScError> {
    let csrf_token = session.lock().await.issue_csrf_token()?;
    Ok(Json(CsrfResponse { csrf_token }))
}

/// GET /
pub async fn redirect_by_role(session: SessionHandle) -> Redirect {
    Redirect::to(access_service::landing_for(&*session.lock().await))
}
