//! Unreachable user directory and failing activity log.

use axum::http::StatusCode;
use sc_test_utils::*;
use serde_json::json;

/// A lookup failure looks exactly like a wrong password.
#[tokio::test]
async fn test_user_directory_down_is_generic_login_failure() {
    // Arrange
    let mut app = TestApp::new();
    let wrong_password = app.login("admin@society.test", "nope").await;
    app.users.set_unavailable(true);

    // Act
    let response = app.login("admin@society.test", TEST_PASSWORD).await;

    // Assert
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body, wrong_password.body);
    assert!(!response.text().contains("connection refused"));
}

/// Under revalidation a lookup failure is a server error, not a logout.
#[tokio::test]
async fn test_revalidation_lookup_failure_keeps_session() {
    let mut app = TestApp::with_config(test_config_with(&[("SC_STATUS_POLICY", "revalidate")]));
    app.login_as("member@society.test").await;
    app.users.set_unavailable(true);

    let failed = app.get_json("/api/v1/me").await;
    assert_eq!(failed.status, StatusCode::INTERNAL_SERVER_ERROR);

    app.users.set_unavailable(false);
    let recovered = app.get_json("/api/v1/me").await;
    assert_eq!(recovered.status, StatusCode::OK);
}

/// Activity log failures never reach the caller.
#[tokio::test]
async fn test_activity_log_failure_does_not_fail_requests() {
    let mut app = TestApp::new();
    app.activity.set_failing(true);

    let login = app.login("admin@society.test", TEST_PASSWORD).await;
    let entry = app
        .post_json(
            "/api/v1/society/fund",
            &json!({ "amount": "15", "entry_type": "income" }),
        )
        .await;

    assert_eq!(login.status, StatusCode::SEE_OTHER);
    assert_eq!(entry.status, StatusCode::CREATED);
    assert_eq!(app.ledger.total(Tenant::Society(SOCIETY_ID)), Some(1_500));
    assert!(app.activity.wait_for("login").await.is_none());
}

/// Dashboards surface a generic error when a directory is down.
#[tokio::test]
async fn test_dashboard_with_building_directory_down() {
    let mut app = TestApp::new();
    app.login_as("admin@society.test").await;
    app.buildings.set_unavailable(true);

    let response = app.get_json("/admin/dashboard").await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.error_code(), "DATABASE_ERROR");
}
