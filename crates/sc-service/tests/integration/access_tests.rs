//! Role guard and scope resolution through the routes.
//!
//! Browsers are redirected on denial; JSON callers get status codes.

use axum::http::StatusCode;
use chrono::NaiveDate;
use sc_service::models::{MeetingLevel, NewMeeting};
use sc_service::repositories::MeetingRepository;
use sc_test_utils::*;
use serde_json::json;

const DASHBOARDS: [&str; 4] = [
    "/admin/dashboard",
    "/pramukh/dashboard",
    "/building/dashboard",
    "/member/dashboard",
];

// ============================================================================
// Role matrix
// ============================================================================

/// Each role opens exactly its own dashboard; the others redirect home.
#[tokio::test]
async fn test_dashboard_role_matrix() {
    let users = [
        ("admin@society.test", "/admin/dashboard"),
        ("pramukh@society.test", "/pramukh/dashboard"),
        ("badmin@society.test", "/building/dashboard"),
        ("member@society.test", "/member/dashboard"),
    ];

    for (email, own) in users {
        let mut app = TestApp::new();
        app.login_as(email).await;

        for dashboard in DASHBOARDS {
            let response = app.get(dashboard).await;
            if dashboard == own {
                assert_eq!(response.status, StatusCode::OK, "{email} on {dashboard}");
            } else {
                assert_eq!(
                    response.status,
                    StatusCode::SEE_OTHER,
                    "{email} on {dashboard}"
                );
                assert_eq!(response.location(), Some(own), "{email} on {dashboard}");
            }
        }
    }
}

#[tokio::test]
async fn test_api_role_denial_is_forbidden() {
    let mut app = TestApp::new();
    app.login_as("member@society.test").await;

    let response = app.get_json("/admin/dashboard").await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.error_code(), "INSUFFICIENT_ROLE");
    assert!(!response.text().contains("society_admin"));
}

#[tokio::test]
async fn test_anonymous_api_request_is_unauthorized() {
    let mut app = TestApp::new();

    for uri in ["/api/v1/me", "/api/v1/society/fund", "/api/v1/building/fund"] {
        let response = app.get(uri).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(response.error_code(), "NOT_AUTHENTICATED");
    }
}

#[tokio::test]
async fn test_root_redirects_by_role() {
    let mut app = TestApp::new();
    assert_eq!(app.get("/").await.location(), Some("/auth/login"));

    app.login_as("badmin@society.test").await;

    assert_eq!(app.get("/").await.location(), Some("/building/dashboard"));
}

/// Society admin is not a superset of pramukh, and vice versa.
#[tokio::test]
async fn test_roles_do_not_inherit() {
    let mut app = TestApp::new();
    app.login_as("pramukh@society.test").await;

    let read = app.get_json("/api/v1/society/fund").await;
    let write = app
        .post_json(
            "/api/v1/society/fund",
            &json!({ "amount": "10", "entry_type": "income" }),
        )
        .await;
    let reconcile = app.get_json("/api/v1/society/fund/reconcile").await;

    assert_eq!(read.status, StatusCode::OK);
    assert_eq!(write.status, StatusCode::FORBIDDEN);
    assert_eq!(reconcile.status, StatusCode::FORBIDDEN);
}

/// A society role cannot reach building endpoints even with a matching id.
#[tokio::test]
async fn test_society_role_denied_on_building_endpoints() {
    let mut app = TestApp::new();
    app.login_as("admin@society.test").await;

    let response = app.get_json("/api/v1/building/fund").await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.error_code(), "INSUFFICIENT_ROLE");
}

// ============================================================================
// Scope resolution
// ============================================================================

/// Society 7's admin resolves scope 7 and cannot claim building 42, which
/// belongs to society 9; building 42's admin resolves scope 42.
#[tokio::test]
async fn test_two_society_scenario() {
    // Arrange
    let mut admin = TestApp::new();
    admin.login_as("admin@society.test").await;

    // Act
    let dashboard = admin.get_json("/admin/dashboard").await.json();
    let claim = admin
        .post_json(
            "/api/v1/society/meetings",
            &json!({
                "level": "building",
                "building_id": BUILDING_ID,
                "title": "Parking",
                "meeting_date": "2026-08-01",
            }),
        )
        .await;

    let mut building_admin = TestApp::new();
    building_admin.login_as("badmin@society.test").await;
    let building = building_admin.get_json("/building/dashboard").await.json();

    // Assert
    assert_eq!(dashboard["society_id"], SOCIETY_ID);
    assert_eq!(claim.status, StatusCode::FORBIDDEN);
    assert_eq!(building["building_id"], BUILDING_ID);
}

#[tokio::test]
async fn test_society_dashboard_is_scoped_to_session_society() {
    let mut app = TestApp::new();
    app.login_as("admin@society.test").await;

    let response = app.get_json("/admin/dashboard").await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["role"], "society_admin");
    assert_eq!(body["society_id"], SOCIETY_ID);
    assert_eq!(body["building_count"], 1);
}

#[tokio::test]
async fn test_building_dashboard_is_scoped_to_session_building() {
    let mut app = TestApp::new();
    app.login_as("badmin@society.test").await;

    let response = app.get_json("/building/dashboard").await;

    let body = response.json();
    assert_eq!(body["building_id"], BUILDING_ID);
    assert_eq!(body["building_name"], "Tower B");
}

/// Query parameters never widen the scope.
#[tokio::test]
async fn test_query_parameters_cannot_change_scope() {
    let mut app = TestApp::new();
    app.login_as("admin@society.test").await;

    let response = app
        .get_json("/api/v1/society/buildings?society_id=9")
        .await;

    let buildings = response.json();
    let ids: Vec<i64> = buildings
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![OWNED_BUILDING_ID]);
}

/// A society role without a society id is forced out.
#[tokio::test]
async fn test_missing_society_id_forces_logout() {
    let mut app = TestApp::new();
    app.users.insert(user_record(
        60,
        "orphan@society.test",
        "society_admin",
        None,
        None,
        "active",
    ));

    let login = app.login_as("orphan@society.test").await;
    assert_eq!(login.location(), Some("/auth/logout"));

    let browser = app.get("/admin/dashboard").await;
    assert_eq!(browser.status, StatusCode::SEE_OTHER);
    assert_eq!(browser.location(), Some("/auth/logout"));

    let api = app.get_json("/api/v1/society/fund").await;
    assert_eq!(api.status, StatusCode::FORBIDDEN);
    assert_eq!(api.error_code(), "INVALID_SCOPE");
}

#[tokio::test]
async fn test_non_positive_building_id_is_invalid_scope() {
    let mut app = TestApp::new();
    app.users.insert(user_record(
        61,
        "zero@society.test",
        "member",
        Some(OTHER_SOCIETY_ID),
        Some(0),
        "active",
    ));
    app.login_as("zero@society.test").await;

    let response = app.get_json("/api/v1/building/fund").await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.error_code(), "INVALID_SCOPE");
}

/// A member sees their building's meetings and their society's
/// society-level meetings, nothing from another tenant.
#[tokio::test]
async fn test_building_meetings_are_tenant_isolated() -> Result<(), anyhow::Error> {
    // Arrange
    let mut app = TestApp::new();
    let date = NaiveDate::from_ymd_opt(2026, 5, 1).ok_or_else(|| anyhow::anyhow!("bad date"))?;
    let meetings = [
        (MeetingLevel::Building, None, Some(BUILDING_ID), "Tower B lift"),
        (MeetingLevel::Building, None, Some(OWNED_BUILDING_ID), "Tower A roof"),
        (MeetingLevel::Society, Some(OTHER_SOCIETY_ID), None, "Society 9 AGM"),
        (MeetingLevel::Society, Some(SOCIETY_ID), None, "Society 7 AGM"),
    ];
    for (level, society_id, building_id, title) in meetings {
        app.meetings
            .create(&NewMeeting {
                level,
                society_id,
                building_id,
                title: title.to_string(),
                meeting_date: date,
            })
            .await?;
    }
    app.login_as("member@society.test").await;

    // Act
    let response = app.get_json("/api/v1/building/meetings").await;

    // Assert
    assert_eq!(response.status, StatusCode::OK);
    let mut titles: Vec<String> = response
        .json()
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["title"].as_str().unwrap().to_string())
        .collect();
    titles.sort();
    assert_eq!(titles, vec!["Society 9 AGM", "Tower B lift"]);
    Ok(())
}
