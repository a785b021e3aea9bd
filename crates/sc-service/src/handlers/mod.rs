//! HTTP request handlers.

pub mod auth_handler;
pub mod building_handler;
pub mod dashboard_handler;
pub mod health;
pub mod me;
pub mod metrics;
pub mod society_handler;

pub use auth_handler::{csrf_token, login, login_page, logout, redirect_by_role};
pub use building_handler::{
    create_building_fund_entry, get_building_fund, list_building_meetings, reconcile_building_fund,
};
pub use dashboard_handler::{admin_dashboard, building_dashboard, member_dashboard, pramukh_dashboard};
pub use health::health_check;
pub use me::get_me;
pub use metrics::metrics_handler;
pub use society_handler::{
    create_building, create_meeting, create_society_fund_entry, get_society_fund, list_buildings,
    list_society_meetings, reconcile_society_fund,
};

use crate::errors::{ClientKind, Rejection, ScError};
use crate::middleware::SessionHandle;
use crate::models::{BuildingScope, RoleSet, SocietyScope};
use crate::services::access_service;
use axum::extract::rejection::JsonRejection;
use axum::Json;

/// Caller id and society scope after the role check.
pub(crate) async fn society_caller(
    session: &SessionHandle,
    allowed: RoleSet,
    client: ClientKind,
) -> Result<(i64, SocietyScope), Rejection> {
    let session = session.lock().await;
    let user_id = access_service::require_role(&session, allowed)
        .map_err(client.reject())?
        .id;
    let scope = access_service::require_society_scope(&session).map_err(client.reject())?;
    Ok((user_id, scope))
}

/// Caller id and building scope after the role check.
pub(crate) async fn building_caller(
    session: &SessionHandle,
    allowed: RoleSet,
    client: ClientKind,
) -> Result<(i64, BuildingScope), Rejection> {
    let session = session.lock().await;
    let user_id = access_service::require_role(&session, allowed)
        .map_err(client.reject())?
        .id;
    let scope = access_service::require_building_scope(&session).map_err(client.reject())?;
    Ok((user_id, scope))
}

/// Unwrap a JSON body taken as `Result` so access checks run before body errors surface.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ScError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ScError::Validation(rejection.body_text()))
}
