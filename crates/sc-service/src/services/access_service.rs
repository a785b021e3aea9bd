//! Role guard, scope resolver and ownership checks.
//!
//! Every check reads the session snapshot only. Request parameters never
//! feed a scope: handlers get a [`SocietyScope`] or [`BuildingScope`] from
//! here and pass it to tenant-scoped queries.
//!
//! Per request the flow is: authenticated, role checked, scope resolved,
//! handler runs. Any step may end in a denial, which is final for the request.

use crate::errors::ScError;
use crate::models::{
    BuildingScope, Role, RoleSet, SessionUser, SocietyScope, LOGIN_PATH, LOGOUT_PATH,
};
use crate::observability::metrics::record_access_denial;
use crate::repositories::BuildingDirectory;
use crate::session::SessionContext;
use tracing::{error, warn};

fn deny(err: ScError) -> ScError {
    record_access_denial(err.reason());
    err
}

/// Require an authenticated session.
pub fn require_login(session: &SessionContext) -> Result<&SessionUser, ScError> {
    match session.current_user() {
        Some(user) if session.is_authenticated() => Ok(user),
        _ => Err(deny(ScError::NotAuthenticated)),
    }
}

/// Require an authenticated user whose role is in `allowed`.
///
/// Membership is exact; roles do not inherit from each other.
pub fn require_role(session: &SessionContext, allowed: RoleSet) -> Result<&SessionUser, ScError> {
    let user = require_login(session)?;
    if allowed.contains(user.role) {
        return Ok(user);
    }

    warn!(
        target: "sc.access",
        user_id = user.id,
        role = %user.role,
        required = %allowed,
        "Role check denied"
    );
    Err(deny(ScError::InsufficientRole {
        role: user.role,
        required: allowed,
    }))
}

/// Resolve the caller's society. Only society-level roles have one.
pub fn require_society_scope(session: &SessionContext) -> Result<SocietyScope, ScError> {
    let user = require_login(session)?;
    if !user.role.is_society_level() {
        warn!(target: "sc.access", user_id = user.id, role = %user.role, "Society scope requested by building-level role");
        return Err(deny(ScError::InvalidScope(
            "role is not society-level".to_string(),
        )));
    }

    match user.society_id {
        Some(id) if id > 0 => Ok(SocietyScope::new(id)),
        _ => {
            warn!(target: "sc.access", user_id = user.id, "Missing society id on session");
            Err(deny(ScError::InvalidScope("missing society id".to_string())))
        }
    }
}

/// Resolve the caller's building. Only building-level roles have one.
pub fn require_building_scope(session: &SessionContext) -> Result<BuildingScope, ScError> {
    let user = require_login(session)?;
    if !user.role.is_building_level() {
        warn!(target: "sc.access", user_id = user.id, role = %user.role, "Building scope requested by society-level role");
        return Err(deny(ScError::InvalidScope(
            "role is not building-level".to_string(),
        )));
    }

    match user.building_id {
        Some(id) if id > 0 => Ok(BuildingScope::new(id)),
        _ => {
            warn!(target: "sc.access", user_id = user.id, "Missing building id on session");
            Err(deny(ScError::InvalidScope("missing building id".to_string())))
        }
    }
}

/// True iff the caller is society-level and belongs to `candidate_society_id`.
pub fn verify_society_ownership(session: &SessionContext, candidate_society_id: i64) -> bool {
    match require_login(session) {
        Ok(user) => {
            user.role.is_society_level()
                && candidate_society_id > 0
                && user.society_id == Some(candidate_society_id)
        }
        Err(_) => false,
    }
}

/// True iff the caller may act on `candidate_building_id`.
///
/// Building-level callers must hold exactly that building. Society-level
/// callers must own it through their society, which takes a lookup; a
/// missing building or a failed lookup answers false.
pub async fn verify_building_ownership(
    session: &SessionContext,
    buildings: &dyn BuildingDirectory,
    candidate_building_id: i64,
) -> bool {
    let Ok(user) = require_login(session) else {
        return false;
    };
    if candidate_building_id <= 0 {
        return false;
    }

    if user.role.is_building_level() {
        return user.building_id == Some(candidate_building_id);
    }

    if !matches!(user.society_id, Some(id) if id > 0) {
        return false;
    }

    match buildings.society_of(candidate_building_id).await {
        Ok(Some(owner)) => verify_society_ownership(session, owner),
        Ok(None) => false,
        Err(e) => {
            error!(target: "sc.access", error = %e, "Building ownership lookup failed");
            false
        }
    }
}

/// [`verify_building_ownership`] as a guard.
pub async fn require_building_ownership(
    session: &SessionContext,
    buildings: &dyn BuildingDirectory,
    candidate_building_id: i64,
) -> Result<(), ScError> {
    if verify_building_ownership(session, buildings, candidate_building_id).await {
        return Ok(());
    }
    warn!(
        target: "sc.access",
        user_id = session.current_user().map(|u| u.id),
        building_id = candidate_building_id,
        "Building ownership denied"
    );
    Err(deny(ScError::OwnershipDenied))
}

/// Where the session should be sent by default.
///
/// Anonymous sessions go to the login page. A role without its scope id
/// is sent to forced logout.
pub fn landing_for(session: &SessionContext) -> &'static str {
    let Ok(user) = require_login(session) else {
        return LOGIN_PATH;
    };

    let scope_id = match user.role {
        Role::SocietyAdmin | Role::SocietyPramukh => user.society_id,
        Role::BuildingAdmin | Role::Member => user.building_id,
    };

    match scope_id {
        Some(id) if id > 0 => user.role.landing_path(),
        _ => LOGOUT_PATH,
    }
}
