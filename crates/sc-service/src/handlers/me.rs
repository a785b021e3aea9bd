//! Current user handler.

use crate::errors::{ClientKind, Rejection};
use crate::middleware::SessionHandle;
use crate::models::{Role, SessionUser};
use crate::services::access_service;
use axum::Json;
use serde::Serialize;
use tracing::instrument;

/// Response for `/api/v1/me`.
#[derive(Debug, Clone, Serialize)]
pub struct MeResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub society_id: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub building_id: Option<i64>,

    /// Where this user lands after login.
    pub landing: &'static str,
}

impl MeResponse {
    fn new(user: &SessionUser, landing: &'static str) -> Self {
        MeResponse {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            society_id: user.society_id,
            building_id: user.building_id,
            landing,
        }
    }
}

/// GET /api/v1/me
///
/// Any authenticated role. Reads the session snapshot only.
#[instrument(skip_all, name = "sc.handlers.me")]
pub async fn get_me(client: ClientKind, session: SessionHandle) -> Result<Json<MeResponse>, Rejection> {
    let session = session.lock().await;
    let user = access_service::require_login(&session).map_err(client.reject())?;
    Ok(Json(MeResponse::new(user, access_service::landing_for(&session))))
}
