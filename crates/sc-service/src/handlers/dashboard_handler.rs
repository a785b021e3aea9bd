//! Role dashboards.
//!
//! Each dashboard is locked to exactly one role and reads only its own
//! tenant's data. They answer with a JSON summary.

use super::{building_caller, society_caller};
use crate::errors::{ClientKind, Rejection};
use crate::middleware::SessionHandle;
use crate::models::{BuildingScope, FundScope, Role, RoleSet, SocietyScope};
use crate::routes::AppState;
use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct SocietyDashboard {
    pub role: Role,
    pub society_id: i64,
    pub building_count: usize,
    pub meeting_count: usize,
    pub fund_total_cents: i64,
}

#[derive(Debug, Serialize)]
pub struct BuildingDashboard {
    pub role: Role,
    pub building_id: i64,
    pub building_name: Option<String>,
    pub meeting_count: usize,
    pub fund_total_cents: i64,
}

async fn society_summary(
    state: &AppState,
    role: Role,
    scope: SocietyScope,
    client: ClientKind,
) -> Result<Json<SocietyDashboard>, Rejection> {
    let buildings = state
        .buildings
        .list_for_society(scope)
        .await
        .map_err(client.reject())?;
    let meetings = state
        .meetings
        .list_for_society(scope)
        .await
        .map_err(client.reject())?;
    let fund_total_cents = state
        .ledger
        .cached_total(FundScope::Society(scope))
        .await
        .map_err(client.reject())?;

    Ok(Json(SocietyDashboard {
        role,
        society_id: scope.id(),
        building_count: buildings.len(),
        meeting_count: meetings.len(),
        fund_total_cents,
    }))
}

async fn building_summary(
    state: &AppState,
    role: Role,
    scope: BuildingScope,
    client: ClientKind,
) -> Result<Json<BuildingDashboard>, Rejection> {
    let building = state
        .buildings
        .find(scope.id())
        .await
        .map_err(client.reject())?;
    let society_id = building.as_ref().map(|b| b.society_id);
    let meetings = state
        .meetings
        .list_for_building(scope, society_id)
        .await
        .map_err(client.reject())?;
    let fund_total_cents = state
        .ledger
        .cached_total(FundScope::Building(scope))
        .await
        .map_err(client.reject())?;

    Ok(Json(BuildingDashboard {
        role,
        building_id: scope.id(),
        building_name: building.map(|b| b.building_name),
        meeting_count: meetings.len(),
        fund_total_cents,
    }))
}

/// GET /admin/dashboard
pub async fn admin_dashboard(
    State(state): State<Arc<AppState>>,
    client: ClientKind,
    session: SessionHandle,
) -> Result<Json<SocietyDashboard>, Rejection> {
    let (_, scope) = society_caller(&session, RoleSet::of(&[Role::SocietyAdmin]), client).await?;
    society_summary(&state, Role::SocietyAdmin, scope, client).await
}

/// GET /pramukh/dashboard
pub async fn pramukh_dashboard(
    State(state): State<Arc<AppState>>,
    client: ClientKind,
    session: SessionHandle,
) -> Result<Json<SocietyDashboard>, Rejection> {
    let (_, scope) = society_caller(&session, RoleSet::of(&[Role::SocietyPramukh]), client).await?;
    society_summary(&state, Role::SocietyPramukh, scope, client).await
}

/// GET /building/dashboard
pub async fn building_dashboard(
    State(state): State<Arc<AppState>>,
    client: ClientKind,
    session: SessionHandle,
) -> Result<Json<BuildingDashboard>, Rejection> {
    let (_, scope) = building_caller(&session, RoleSet::of(&[Role::BuildingAdmin]), client).await?;
    building_summary(&state, Role::BuildingAdmin, scope, client).await
}

/// GET /member/dashboard
pub async fn member_dashboard(
    State(state): State<Arc<AppState>>,
    client: ClientKind,
    session: SessionHandle,
) -> Result<Json<BuildingDashboard>, Rejection> {
    let (_, scope) = building_caller(&session, RoleSet::of(&[Role::Member]), client).await?;
    building_summary(&state, Role::Member, scope, client).await
}
