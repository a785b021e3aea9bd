//! Ownership checks on client-supplied building ids.

use axum::http::StatusCode;
use sc_test_utils::*;
use serde_json::{json, Value};

fn building_meeting(building_id: i64) -> Value {
    json!({
        "level": "building",
        "building_id": building_id,
        "title": "Water tank cleaning",
        "meeting_date": "2026-06-12",
    })
}

/// A society admin cannot schedule a meeting in another society's building.
#[tokio::test]
async fn test_foreign_building_meeting_is_denied() {
    // Arrange
    let mut app = TestApp::new();
    app.login_as("admin@society.test").await;

    // Act
    let response = app
        .post_json("/api/v1/society/meetings", &building_meeting(BUILDING_ID))
        .await;

    // Assert
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.error_code(), "OWNERSHIP_DENIED");
    assert!(app.meetings.all().is_empty());
}

#[tokio::test]
async fn test_owned_building_meeting_is_created() {
    let mut app = TestApp::new();
    app.login_as("admin@society.test").await;

    let response = app
        .post_json("/api/v1/society/meetings", &building_meeting(OWNED_BUILDING_ID))
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    let body = response.json();
    assert_eq!(body["level"], "building");
    assert_eq!(body["building_id"], OWNED_BUILDING_ID);
    assert!(body["society_id"].is_null());

    let entry = app.activity.wait_for("create_meeting").await.unwrap();
    assert_eq!(entry.user_id, Some(SOCIETY_ADMIN_ID));
}

#[tokio::test]
async fn test_unknown_and_non_positive_buildings_are_denied() {
    let mut app = TestApp::new();
    app.login_as("admin@society.test").await;

    for building_id in [999, 0, -4] {
        let response = app
            .post_json("/api/v1/society/meetings", &building_meeting(building_id))
            .await;
        assert_eq!(response.status, StatusCode::FORBIDDEN, "building {building_id}");
    }
    assert!(app.meetings.all().is_empty());
}

/// A failed ownership lookup denies rather than erroring.
#[tokio::test]
async fn test_ownership_lookup_failure_denies() {
    let mut app = TestApp::new();
    app.login_as("admin@society.test").await;
    app.buildings.set_unavailable(true);

    let response = app
        .post_json("/api/v1/society/meetings", &building_meeting(OWNED_BUILDING_ID))
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.error_code(), "OWNERSHIP_DENIED");
}

#[tokio::test]
async fn test_building_meeting_requires_building_id() {
    let mut app = TestApp::new();
    app.login_as("admin@society.test").await;

    let response = app
        .post_json(
            "/api/v1/society/meetings",
            &json!({ "level": "building", "title": "Lift", "meeting_date": "2026-06-12" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "VALIDATION_ERROR");
}

/// A society id in the body is ignored; the session decides.
#[tokio::test]
async fn test_society_meeting_uses_session_society() {
    let mut app = TestApp::new();
    app.login_as("admin@society.test").await;

    let response = app
        .post_json(
            "/api/v1/society/meetings",
            &json!({
                "level": "society",
                "society_id": OTHER_SOCIETY_ID,
                "title": "Annual general meeting",
                "meeting_date": "2026-07-01",
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.json()["society_id"], SOCIETY_ID);

    let listed = app.get_json("/api/v1/society/meetings").await.json();
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

/// Body errors surface only after the caller passes the role check.
#[tokio::test]
async fn test_role_check_runs_before_body_validation() {
    let mut app = TestApp::new();
    app.login_as("pramukh@society.test").await;

    let response = app
        .post_json("/api/v1/society/meetings", &json!({ "nonsense": true }))
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.error_code(), "INSUFFICIENT_ROLE");
}

#[tokio::test]
async fn test_created_building_belongs_to_session_society() {
    let mut app = TestApp::new();
    app.login_as("admin@society.test").await;

    let response = app
        .post_json(
            "/api/v1/society/buildings",
            &json!({ "building_name": "  Tower C  ", "society_id": OTHER_SOCIETY_ID }),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    let body = response.json();
    assert_eq!(body["society_id"], SOCIETY_ID);
    assert_eq!(body["building_name"], "Tower C");

    let blank = app
        .post_json("/api/v1/society/buildings", &json!({ "building_name": "   " }))
        .await;
    assert_eq!(blank.status, StatusCode::BAD_REQUEST);
}
