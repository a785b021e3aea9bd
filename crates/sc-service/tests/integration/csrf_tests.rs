//! CSRF enforcement on state-changing requests.

use axum::http::{Method, StatusCode};
use sc_test_utils::*;
use serde_json::json;

fn income(amount: &str) -> serde_json::Value {
    json!({ "amount": amount, "entry_type": "income" })
}

#[tokio::test]
async fn test_login_without_token_is_rejected() {
    let mut app = TestApp::new();

    let response = app
        .post_form(
            "/auth/login",
            &[("email", "admin@society.test"), ("password", TEST_PASSWORD)],
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.error_code(), "CSRF_MISMATCH");
    assert_eq!(app.get_json("/api/v1/me").await.status, StatusCode::UNAUTHORIZED);
}

/// The token check runs before the handler, so nothing is written.
#[tokio::test]
async fn test_post_without_token_writes_nothing() {
    // Arrange
    let mut app = TestApp::new();
    app.login_as("admin@society.test").await;

    // Act
    let response = app
        .send_json(Method::POST, "/api/v1/society/fund", &income("100"), None)
        .await;

    // Assert
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.error_code(), "CSRF_MISMATCH");
    assert!(app.ledger.stored_entries(Tenant::Society(SOCIETY_ID)).is_empty());
    assert_eq!(app.ledger.total(Tenant::Society(SOCIETY_ID)), Some(0));
}

#[tokio::test]
async fn test_wrong_token_is_rejected() {
    let mut app = TestApp::new();
    app.login_as("admin@society.test").await;
    let token = app.csrf_token().await;
    let tampered: String = token.chars().rev().collect();

    let response = app
        .send_json(
            Method::POST,
            "/api/v1/society/fund",
            &income("100"),
            Some(&tampered),
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_token_from_another_session_is_rejected() {
    let mut app = TestApp::new();
    app.login_as("admin@society.test").await;
    let admin_token = app.csrf_token().await;

    app.set_session_id(None);
    app.login_as("pramukh@society.test").await;
    let response = app
        .send_json(
            Method::POST,
            "/api/v1/society/buildings",
            &json!({ "building_name": "Tower C" }),
            Some(&admin_token),
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.error_code(), "CSRF_MISMATCH");
}

/// Anonymous callers hit the CSRF check before the login check.
#[tokio::test]
async fn test_anonymous_post_is_csrf_rejected() {
    let mut app = TestApp::new();

    let response = app
        .send_json(Method::POST, "/api/v1/society/fund", &income("5"), None)
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.error_code(), "CSRF_MISMATCH");
}

/// A valid token does not bypass authentication.
#[tokio::test]
async fn test_valid_token_without_login_is_unauthenticated() {
    let mut app = TestApp::new();

    let response = app.post_json("/api/v1/society/fund", &income("5")).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_code(), "NOT_AUTHENTICATED");
}

#[tokio::test]
async fn test_token_is_stable_within_session() {
    let mut app = TestApp::new();

    let first = app.csrf_token().await;
    let second = app.csrf_token().await;

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_new_session_after_logout_gets_new_token() {
    let mut app = TestApp::new();
    app.login_as("member@society.test").await;
    let before = app.csrf_token().await;

    app.get("/auth/logout").await;

    assert_ne!(app.csrf_token().await, before);
}
