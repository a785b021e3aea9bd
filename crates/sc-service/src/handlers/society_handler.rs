//! Society-scoped endpoints: buildings, the society fund and meetings.
//!
//! The society id always comes from the session. A building id in a request
//! body is only acted on after the ownership check.

use super::{json_body, society_caller};
use crate::errors::{ClientKind, Rejection, ScError};
use crate::middleware::SessionHandle;
use crate::models::{
    Building, FundEntry, FundScope, Meeting, MeetingLevel, NewMeeting, Role, RoleSet,
    SOCIETY_ROLES,
};
use crate::repositories::ActivityEntry;
use crate::routes::AppState;
use crate::services::fund_service::{self, RecordedEntry, Reconciliation};
use crate::services::{access_service, activity_service};
use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const SOCIETY_ADMIN: RoleSet = RoleSet::of(&[Role::SocietyAdmin]);

pub const MAX_BUILDING_NAME_LEN: usize = 100;
pub const MAX_MEETING_TITLE_LEN: usize = 200;

#[derive(Debug, Deserialize)]
pub struct CreateBuildingRequest {
    pub building_name: String,
}

/// Fund entry as submitted. `amount` is a decimal string.
#[derive(Debug, Deserialize)]
pub struct FundEntryRequest {
    pub amount: String,
    pub entry_type: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub entry_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct CreateMeetingRequest {
    pub level: MeetingLevel,
    #[serde(default)]
    pub building_id: Option<i64>,
    pub title: String,
    pub meeting_date: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct FundView {
    pub fund_total_cents: i64,
    pub entries: Vec<FundEntry>,
}

fn bounded_text(raw: &str, field: &str, max: usize) -> Result<String, ScError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(ScError::Validation(format!("{field} is required")));
    }
    if text.chars().count() > max {
        return Err(ScError::Validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(text.to_string())
}

/// GET /api/v1/society/buildings
pub async fn list_buildings(
    State(state): State<Arc<AppState>>,
    client: ClientKind,
    session: SessionHandle,
) -> Result<Json<Vec<Building>>, Rejection> {
    let (_, scope) = society_caller(&session, SOCIETY_ROLES, client).await?;
    let buildings = state
        .buildings
        .list_for_society(scope)
        .await
        .map_err(client.reject())?;
    Ok(Json(buildings))
}

/// POST /api/v1/society/buildings
pub async fn create_building(
    State(state): State<Arc<AppState>>,
    client: ClientKind,
    session: SessionHandle,
    payload: Result<Json<CreateBuildingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Building>), Rejection> {
    let (user_id, scope) = society_caller(&session, SOCIETY_ADMIN, client).await?;
    let request = json_body(payload).map_err(client.reject())?;
    let name = bounded_text(&request.building_name, "Building name", MAX_BUILDING_NAME_LEN)
        .map_err(client.reject())?;

    let building = state
        .buildings
        .create(scope, &name)
        .await
        .map_err(client.reject())?;

    activity_service::record(
        state.activity.clone(),
        ActivityEntry {
            user_id: Some(user_id),
            action: "create_building",
            details: format!("Created building {}", building.id),
            ip_address: None,
        },
    );

    Ok((StatusCode::CREATED, Json(building)))
}

/// GET /api/v1/society/fund
pub async fn get_society_fund(
    State(state): State<Arc<AppState>>,
    client: ClientKind,
    session: SessionHandle,
) -> Result<Json<FundView>, Rejection> {
    let (_, scope) = society_caller(&session, SOCIETY_ROLES, client).await?;
    let fund = FundScope::Society(scope);

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

/// POST /api/v1/society/fund
pub async fn create_society_fund_entry(
    State(state): State<Arc<AppState>>,
    client: ClientKind,
    session: SessionHandle,
    payload: Result<Json<FundEntryRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RecordedEntry>), Rejection> {
    let (user_id, scope) = society_caller(&session, SOCIETY_ADMIN, client).await?;
    let recorded = record_fund_entry(&state, FundScope::Society(scope), user_id, payload)
        .await
        .map_err(client.reject())?;
    Ok((StatusCode::CREATED, Json(recorded)))
}

/// GET /api/v1/society/fund/reconcile
pub async fn reconcile_society_fund(
    State(state): State<Arc<AppState>>,
    client: ClientKind,
    session: SessionHandle,
) -> Result<Json<Reconciliation>, Rejection> {
    let (_, scope) = society_caller(&session, SOCIETY_ADMIN, client).await?;
    let result = fund_service::reconcile(state.ledger.as_ref(), FundScope::Society(scope))
        .await
        .map_err(client.reject())?;
    Ok(Json(result))
}

/// GET /api/v1/society/meetings
pub async fn list_society_meetings(
    State(state): State<Arc<AppState>>,
    client: ClientKind,
    session: SessionHandle,
) -> Result<Json<Vec<Meeting>>, Rejection> {
    let (_, scope) = society_caller(&session, SOCIETY_ROLES, client).await?;
    let meetings = state
        .meetings
        .list_for_society(scope)
        .await
        .map_err(client.reject())?;
    Ok(Json(meetings))
}

/// POST /api/v1/society/meetings
///
/// Building-level meetings need a building the caller's society owns.
pub async fn create_meeting(
    State(state): State<Arc<AppState>>,
    client: ClientKind,
    session: SessionHandle,
    payload: Result<Json<CreateMeetingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Meeting>), Rejection> {
    let (user_id, scope) = society_caller(&session, SOCIETY_ADMIN, client).await?;
    let request = json_body(payload).map_err(client.reject())?;
    let title = bounded_text(&request.title, "Title", MAX_MEETING_TITLE_LEN)
        .map_err(client.reject())?;

    let meeting = match request.level {
        MeetingLevel::Society => NewMeeting {
            level: MeetingLevel::Society,
            society_id: Some(scope.id()),
            building_id: None,
            title,
            meeting_date: request.meeting_date,
        },
        MeetingLevel::Building => {
            let building_id = request.building_id.ok_or_else(|| {
                client.reject()(ScError::Validation(
                    "building_id is required for building meetings".to_string(),
                ))
            })?;
            access_service::require_building_ownership(
                &*session.lock().await,
                state.buildings.as_ref(),
                building_id,
            )
            .await
            .map_err(client.reject())?;

            NewMeeting {
                level: MeetingLevel::Building,
                society_id: None,
                building_id: Some(building_id),
                title,
                meeting_date: request.meeting_date,
            }
        }
    };

    let created = state
        .meetings
        .create(&meeting)
        .await
        .map_err(client.reject())?;

    activity_service::record(
        state.activity.clone(),
        ActivityEntry {
            user_id: Some(user_id),
            action: "create_meeting",
            details: format!("Created {} meeting {}", created.level.as_str(), created.id),
            ip_address: None,
        },
    );

    Ok((StatusCode::CREATED, Json(created)))
}

/// Validate a submitted entry, write it, and log the action.
pub(crate) async fn record_fund_entry(
    state: &AppState,
    scope: FundScope,
    user_id: i64,
    payload: Result<Json<FundEntryRequest>, JsonRejection>,
) -> Result<RecordedEntry, ScError> {
    let request = json_body(payload)?;
    let entry = fund_service::build_entry(
        &request.amount,
        &request.entry_type,
        request.description.as_deref(),
        request.entry_date,
        Utc::now().date_naive(),
    )?;

    let recorded = fund_service::record_entry(state.ledger.as_ref(), scope, &entry, user_id).await?;

    activity_service::record(
        state.activity.clone(),
        ActivityEntry {
            user_id: Some(user_id),
            action: "fund_entry",
            details: format!(
                "Recorded {} of {} cents",
                entry.entry_type.as_str(),
                entry.amount_cents
            ),
            ip_address: None,
        },
    );

    Ok(recorded)
}
