//! Building-scoped endpoints: the building fund and meetings.

use super::building_caller;
use super::society_handler::{record_fund_entry, FundEntryRequest, FundView};
use crate::errors::{ClientKind, Rejection};
use crate::middleware::SessionHandle;
use crate::models::{FundScope, Meeting, Role, RoleSet, BUILDING_ROLES};
use crate::routes::AppState;
use crate::services::fund_service::{self, RecordedEntry, Reconciliation};
use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use std::sync::Arc;

const BUILDING_ADMIN: RoleSet = RoleSet::of(&[Role::BuildingAdmin]);

/// GET /api/v1/building/fund
pub async fn get_building_fund(
    State(state): State<Arc<AppState>>,
    client: ClientKind,
    session: SessionHandle,
) -> Result<Json<FundView>, Rejection> {
    let (_, scope) = building_caller(&session, BUILDING_ROLES, client).await?;
    let fund = FundScope::Building(scope);

    let fund_total_cents = state
        .ledger
        .cached_total(fund)
        .await
        .map_err(client.reject())?;
    let entries = state.ledger.entries(fund).await.map_err(client.reject())?;

    Ok(Json(FundView {
        fund_total_cents,
        entries,
    }))
}

/// POST /api/v1/building/fund
pub async fn create_building_fund_entry(
    State(state): State<Arc<AppState>>,
    client: ClientKind,
    session: SessionHandle,
    payload: Result<Json<FundEntryRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RecordedEntry>), Rejection> {
    let (user_id, scope) = building_caller(&session, BUILDING_ADMIN, client).await?;
    let recorded = record_fund_entry(&state, FundScope::Building(scope), user_id, payload)
        .await
        .map_err(client.reject())?;
    Ok((StatusCode::CREATED, Json(recorded)))
}

/// GET /api/v1/building/fund/reconcile
pub async fn reconcile_building_fund(
    State(state): State<Arc<AppState>>,
    client: ClientKind,
    session: SessionHandle,
) -> Result<Json<Reconciliation>, Rejection> {
    let (_, scope) = building_caller(&session, BUILDING_ADMIN, client).await?;
    let result = fund_service::reconcile(state.ledger.as_ref(), FundScope::Building(scope))
        .await
        .map_err(client.reject())?;
    Ok(Json(result))
}

/// GET /api/v1/building/meetings
///
/// The building's own meetings plus the society-level meetings of the
/// society it belongs to.
pub async fn list_building_meetings(
    State(state): State<Arc<AppState>>,
    client: ClientKind,
    session: SessionHandle,
) -> Result<Json<Vec<Meeting>>, Rejection> {
    let (_, scope) = building_caller(&session, BUILDING_ROLES, client).await?;
    let society_id = state
        .buildings
        .society_of(scope.id())
        .await
        .map_err(client.reject())?;
    let meetings = state
        .meetings
        .list_for_building(scope, society_id)
        .await
        .map_err(client.reject())?;
    Ok(Json(meetings))
}
