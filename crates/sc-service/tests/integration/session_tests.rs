//! Session cookie lifecycle: issue, rotate, expire, destroy.

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use sc_service::services::auth_service;
use sc_service::session::{SessionContext, SessionStore};
use sc_test_utils::*;

/// Shift a stored session's timestamps into the past.
async fn age_session(app: &TestApp, rotated_ago: Duration, seen_ago: Duration) {
    let id = app.session_id().expect("session cookie").to_string();
    let now = Utc::now();
    let mut data = app
        .sessions
        .load(&id, now)
        .await
        .unwrap()
        .expect("stored session");
    data.last_rotated_at = now - rotated_ago;
    data.last_seen_at = now - seen_ago;
    app.sessions.save(&id, data).await.unwrap();
}

// ============================================================================
// Cookie issue
// ============================================================================

#[tokio::test]
async fn test_cookie_attributes() {
    let mut app = TestApp::new();

    let response = app.get_json("/auth/csrf").await;

    let cookie = response.set_cookie().expect("Set-Cookie on first token");
    assert!(cookie.starts_with("SOCIETYSESSID="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Path=/"));
    assert!(!cookie.contains("Secure"));
    assert_eq!(app.session_id().map(str::len), Some(64));
}

#[tokio::test]
async fn test_secure_flag_when_configured() {
    let mut app = TestApp::with_config(test_config_with(&[("SESSION_COOKIE_SECURE", "true")]));

    let response = app.get_json("/auth/csrf").await;

    assert!(response.set_cookie().unwrap().ends_with("; Secure"));
}

/// Anonymous requests that store nothing never get a session.
#[tokio::test]
async fn test_anonymous_browsing_creates_no_session() {
    let mut app = TestApp::new();

    let root = app.get("/").await;
    let dashboard = app.get("/admin/dashboard").await;

    assert_eq!(root.location(), Some("/auth/login"));
    assert_eq!(dashboard.location(), Some("/auth/login"));
    assert!(root.set_cookie().is_none());
    assert!(dashboard.set_cookie().is_none());
    assert!(app.sessions.is_empty().await);
}

#[tokio::test]
async fn test_cookie_is_stable_between_rotations() {
    let mut app = TestApp::new();
    app.login_as("admin@society.test").await;

    let response = app.get_json("/api/v1/me").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.set_cookie().is_none());
}

#[tokio::test]
async fn test_malformed_cookie_is_ignored() {
    let mut app = TestApp::new();
    app.set_session_id(Some("../../etc/passwd".to_string()));

    let response = app.get_json("/api/v1/me").await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Rotation
// ============================================================================

/// Login issues a new id and the pre-login id stops resolving.
#[tokio::test]
async fn test_login_rotates_session_id() {
    // Arrange
    let mut app = TestApp::new();
    app.csrf_token().await;
    let before = app.session_id().unwrap().to_string();

    // Act
    app.login_as("member@society.test").await;

    // Assert
    let after = app.session_id().unwrap().to_string();
    assert_ne!(before, after);
    assert!(app.sessions.load(&before, Utc::now()).await.unwrap().is_none());

    app.set_session_id(Some(before));
    let replay = app.get_json("/api/v1/me").await;
    assert_eq!(replay.status, StatusCode::UNAUTHORIZED);
}

/// The CSRF token survives the login rotation.
#[tokio::test]
async fn test_csrf_token_carries_over_login() {
    let mut app = TestApp::new();
    let before = app.csrf_token().await;

    app.login_as("member@society.test").await;

    assert_eq!(app.csrf_token().await, before);
}

#[tokio::test]
async fn test_rotation_after_interval_keeps_user() {
    // Arrange
    let mut app = TestApp::new();
    app.login_as("pramukh@society.test").await;
    age_session(&app, Duration::minutes(31), Duration::minutes(1)).await;
    let old = app.session_id().unwrap().to_string();

    // Act
    let response = app.get_json("/api/v1/me").await;

    // Assert
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["id"], PRAMUKH_ID);
    let new = app.session_id().unwrap().to_string();
    assert_ne!(old, new);
    assert!(app.sessions.load(&old, Utc::now()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_no_rotation_within_interval() {
    let mut app = TestApp::new();
    app.login_as("pramukh@society.test").await;
    age_session(&app, Duration::minutes(29), Duration::minutes(1)).await;
    let id = app.session_id().unwrap().to_string();

    let response = app.get_json("/api/v1/me").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(app.session_id(), Some(id.as_str()));
}

// ============================================================================
// Expiry and logout
// ============================================================================

#[tokio::test]
async fn test_idle_session_expires() {
    let mut app = TestApp::new();
    app.login_as("admin@society.test").await;
    age_session(&app, Duration::minutes(5), Duration::hours(2)).await;

    let response = app.get_json("/api/v1/me").await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(response.set_cookie().unwrap().contains("Max-Age=0"));
    assert!(app.session_id().is_none());
}

#[tokio::test]
async fn test_logout_destroys_session() {
    // Arrange
    let mut app = TestApp::new();
    app.login_as("admin@society.test").await;
    let id = app.session_id().unwrap().to_string();

    // Act
    let response = app.get("/auth/logout").await;

    // Assert
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/auth/login"));
    assert!(response.set_cookie().unwrap().contains("Max-Age=0"));
    assert!(app.session_id().is_none());
    assert!(app.sessions.is_empty().await);

    app.set_session_id(Some(id));
    let replay = app.get("/admin/dashboard").await;
    assert_eq!(replay.location(), Some("/auth/login"));
}

// ============================================================================
// Status policy
// ============================================================================

/// With the snapshot policy a deactivated user keeps their session.
#[tokio::test]
async fn test_snapshot_policy_trusts_login_status() {
    let mut app = TestApp::new();
    app.login_as("member@society.test").await;
    app.users.set_status(MEMBER_ID, "inactive");

    let response = app.get_json("/api/v1/me").await;

    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_revalidate_policy_ends_deactivated_session() {
    let mut app = TestApp::with_config(test_config_with(&[("SC_STATUS_POLICY", "revalidate")]));
    app.login_as("member@society.test").await;
    app.users.set_status(MEMBER_ID, "inactive");

    let response = app.get_json("/api/v1/me").await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(app.session_id().is_none());
}

#[tokio::test]
async fn test_revalidate_policy_ends_session_of_removed_user() {
    let mut app = TestApp::with_config(test_config_with(&[("SC_STATUS_POLICY", "revalidate")]));
    app.login_as("badmin@society.test").await;
    app.users.remove(BUILDING_ADMIN_ID);

    let response = app.get("/building/dashboard").await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/auth/login"));
}

#[tokio::test]
async fn test_revalidate_policy_keeps_active_user() {
    let mut app = TestApp::with_config(test_config_with(&[("SC_STATUS_POLICY", "revalidate")]));
    app.login_as("member@society.test").await;

    let response = app.get_json("/api/v1/me").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["id"], MEMBER_ID);
}

// ============================================================================
// Concurrent requests on one session
// ============================================================================

/// Resume the stored session the way a request carrying the cookie would.
async fn resume(app: &TestApp, id: &str) -> SessionContext {
    let now = Utc::now();
    let loaded = app.sessions.load(id, now).await.unwrap();
    SessionContext::start_or_resume(Some(id.to_string()), loaded, now, Duration::minutes(30))
        .unwrap()
}

/// A slow request that started before logout cannot restore the session.
#[tokio::test]
async fn test_in_flight_request_cannot_undo_logout() {
    // Arrange
    let mut app = TestApp::new();
    app.login_as("admin@society.test").await;
    let id = app.session_id().expect("session cookie").to_string();
    let mut logging_out = resume(&app, &id).await;
    let mut slow = resume(&app, &id).await;

    // Act
    auth_service::logout(&mut logging_out);
    app.sessions.apply(&logging_out.commit().unwrap()).await.unwrap();
    let slow_saved = app.sessions.apply(&slow.commit().unwrap()).await.unwrap();

    // Assert
    assert!(!slow_saved);
    assert!(app.sessions.load(&id, Utc::now()).await.unwrap().is_none());
    assert_eq!(app.get_json("/api/v1/me").await.status, StatusCode::UNAUTHORIZED);
}

/// Once an id is rotated away, a stale request cannot store under it again.
#[tokio::test]
async fn test_in_flight_request_cannot_revive_rotated_id() {
    let mut app = TestApp::new();
    app.login_as("admin@society.test").await;
    let id = app.session_id().expect("session cookie").to_string();
    let mut rotating = resume(&app, &id).await;
    let mut slow = resume(&app, &id).await;

    rotating.rotate_id(Utc::now()).unwrap();
    let rotated = rotating.commit().unwrap();
    app.sessions.apply(&rotated).await.unwrap();
    app.sessions.apply(&slow.commit().unwrap()).await.unwrap();

    assert!(app.sessions.load(&id, Utc::now()).await.unwrap().is_none());
    let (new_id, _) = rotated.save.expect("rotated session saved");
    assert!(app.sessions.load(&new_id, Utc::now()).await.unwrap().is_some());
    assert_eq!(app.sessions.len().await, 1);
}
