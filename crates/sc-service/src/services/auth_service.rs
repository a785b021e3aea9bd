//! Login, logout and session status revalidation.

use crate::crypto;
use crate::errors::ScError;
use crate::models::{SessionUser, UserStatus};
use crate::observability::hash_for_correlation;
use crate::observability::metrics::record_login;
use crate::repositories::UserDirectory;
use crate::session::{ClientBinding, SessionContext};
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use std::time::Instant;
use tracing::{error, info, instrument, warn};

/// Authenticate `email`/`password` and establish the session.
///
/// # Outcomes
///
/// - Empty email or password: `MissingCredentials`.
/// - Unknown email, wrong password, failed lookup, unreadable hash or
///   unrecognised role: `InvalidCredentials`. Unknown emails still pay for
///   one bcrypt verification.
/// - Matching credentials on an inactive account: `AccountInactive`.
///
/// On success the user snapshot (without password hash) is stored, client
/// details are recorded and the session id rotates.
#[instrument(skip_all, fields(email_hash = %hash_for_correlation(email.trim())))]
pub async fn login(
    users: &dyn UserDirectory,
    session: &mut SessionContext,
    email: &str,
    password: &SecretString,
    binding: ClientBinding,
    now: DateTime<Utc>,
) -> Result<SessionUser, ScError> {
    let start = Instant::now();
    let result = authenticate(users, email, password).await;

    let outcome = match &result {
        Ok(_) => "success",
        Err(ScError::MissingCredentials) => "missing_credentials",
        Err(ScError::InvalidCredentials) => "invalid_credentials",
        Err(ScError::AccountInactive) => "account_inactive",
        Err(_) => "error",
    };
    record_login(outcome, start.elapsed());

    let user = result?;
    session.establish(user.clone(), binding, now)?;

    info!(target: "sc.auth", user_id = user.id, role = %user.role, "Login succeeded");
    Ok(user)
}

async fn authenticate(
    users: &dyn UserDirectory,
    email: &str,
    password: &SecretString,
) -> Result<SessionUser, ScError> {
    let email = email.trim();
    let password = password.expose_secret();
    if email.is_empty() || password.is_empty() {
        return Err(ScError::MissingCredentials);
    }

    let record = match users.find_by_email(email).await {
        Ok(record) => record,
        Err(e) => {
            // Same answer as an unknown email; the cause stays in the logs.
            error!(target: "sc.auth", error = %e, "User lookup failed during login");
            None
        }
    };

    let Some(record) = record else {
        crypto::verify_dummy_password(password);
        info!(target: "sc.auth", "Login failed");
        return Err(ScError::InvalidCredentials);
    };

    let password_matches = match crypto::verify_password(password, &record.password_hash) {
        Ok(matches) => matches,
        Err(e) => {
            error!(target: "sc.auth", user_id = record.id, error = %e, "Stored password hash unreadable");
            false
        }
    };
    if !password_matches {
        info!(target: "sc.auth", "Login failed");
        return Err(ScError::InvalidCredentials);
    }

    if UserStatus::parse(&record.status) != UserStatus::Active {
        info!(target: "sc.auth", user_id = record.id, "Login rejected for inactive account");
        return Err(ScError::AccountInactive);
    }

    let user_id = record.id;
    SessionUser::try_from(record).map_err(|e| {
        error!(target: "sc.auth", user_id, error = %e, "Unrecognised role on user record");
        ScError::InvalidCredentials
    })
}

/// Destroy all session state.
pub fn logout(session: &mut SessionContext) {
    let user_id = session.current_user().map(|u| u.id);
    session.destroy();
    info!(target: "sc.auth", user_id, "Logged out");
}

/// Re-read the session user's record and drop the session if the user is
/// gone, inactive or no longer has a recognised role.
///
/// Lookup failures propagate; they do not end the session.
pub async fn revalidate_status(
    users: &dyn UserDirectory,
    session: &mut SessionContext,
) -> Result<(), ScError> {
    let Some(user_id) = session.current_user().map(|u| u.id) else {
        return Ok(());
    };

    let refreshed = users
        .find_by_id(user_id)
        .await?
        .filter(|record| UserStatus::parse(&record.status) == UserStatus::Active)
        .and_then(|record| SessionUser::try_from(record).ok());

    match refreshed {
        Some(user) => session.refresh_user(user),
        None => {
            warn!(target: "sc.auth", user_id, "Session revoked: user missing or inactive");
            session.destroy();
        }
    }
    Ok(())
}
