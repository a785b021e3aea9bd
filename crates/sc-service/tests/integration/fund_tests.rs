//! Fund ledger writes, reads and reconciliation.

use axum::http::StatusCode;
use sc_test_utils::*;
use serde_json::{json, Value};

fn entry(amount: &str, entry_type: &str) -> Value {
    json!({ "amount": amount, "entry_type": entry_type, "description": "Maintenance" })
}

// ============================================================================
// Society fund
// ============================================================================

#[tokio::test]
async fn test_income_entry_updates_total() {
    // Arrange
    let mut app = TestApp::new();
    app.login_as("admin@society.test").await;

    // Act
    let response = app
        .post_json("/api/v1/society/fund", &entry("1250.50", "income"))
        .await;

    // Assert
    assert_eq!(response.status, StatusCode::CREATED);
    let body = response.json();
    assert_eq!(body["fund_total_cents"], 125_050);
    assert_eq!(body["entry"]["amount_cents"], 125_050);
    assert_eq!(body["entry"]["entry_type"], "income");
    assert_eq!(app.ledger.total(Tenant::Society(SOCIETY_ID)), Some(125_050));

    let stored = app.ledger.stored_entries(Tenant::Society(SOCIETY_ID));
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].created_by, SOCIETY_ADMIN_ID);

    let activity = app.activity.wait_for("fund_entry").await.unwrap();
    assert_eq!(activity.user_id, Some(SOCIETY_ADMIN_ID));
}

/// Expense and use_money both subtract.
#[tokio::test]
async fn test_outgoing_entries_reduce_total() {
    let mut app = TestApp::new();
    app.login_as("admin@society.test").await;

    app.post_json("/api/v1/society/fund", &entry("1000", "income"))
        .await;
    app.post_json("/api/v1/society/fund", &entry("250.5", "expense"))
        .await;
    let last = app
        .post_json("/api/v1/society/fund", &entry("100", "use_money"))
        .await;

    assert_eq!(last.json()["fund_total_cents"], 64_950);

    let fund = app.get_json("/api/v1/society/fund").await.json();
    assert_eq!(fund["fund_total_cents"], 64_950);
    let entries = fund["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["entry_type"], "use_money");
}

#[tokio::test]
async fn test_invalid_entries_write_nothing() {
    let mut app = TestApp::new();
    app.login_as("admin@society.test").await;

    let cases = [
        entry("abc", "income"),
        entry("0", "income"),
        entry("-5", "income"),
        entry("10.123", "income"),
        entry("10", "donation"),
        json!({ "amount": "10" }),
    ];

    for body in &cases {
        let response = app.post_json("/api/v1/society/fund", body).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(response.error_code(), "VALIDATION_ERROR");
    }
    assert!(app.ledger.stored_entries(Tenant::Society(SOCIETY_ID)).is_empty());
    assert_eq!(app.ledger.total(Tenant::Society(SOCIETY_ID)), Some(0));
}

#[tokio::test]
async fn test_explicit_entry_date_is_kept() {
    let mut app = TestApp::new();
    app.login_as("admin@society.test").await;

    let response = app
        .post_json(
            "/api/v1/society/fund",
            &json!({ "amount": "75", "entry_type": "income", "entry_date": "2026-01-31" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.json()["entry"]["entry_date"], "2026-01-31");
}

#[tokio::test]
async fn test_society_writes_do_not_touch_other_tenants() {
    let mut app = TestApp::new();
    app.login_as("admin@society.test").await;

    app.post_json("/api/v1/society/fund", &entry("40", "income"))
        .await;

    assert_eq!(app.ledger.total(Tenant::Society(OTHER_SOCIETY_ID)), Some(0));
    assert_eq!(app.ledger.total(Tenant::Building(OWNED_BUILDING_ID)), Some(0));
}

// ============================================================================
// Building fund
// ============================================================================

#[tokio::test]
async fn test_building_admin_records_building_entry() {
    let mut app = TestApp::new();
    app.login_as("badmin@society.test").await;

    let response = app
        .post_json("/api/v1/building/fund", &entry("300", "income"))
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(app.ledger.total(Tenant::Building(BUILDING_ID)), Some(30_000));
    assert_eq!(app.ledger.total(Tenant::Society(OTHER_SOCIETY_ID)), Some(0));
}

/// Members read the building fund but cannot write to it.
#[tokio::test]
async fn test_member_reads_but_cannot_write_building_fund() {
    let mut app = TestApp::new();
    app.login_as("member@society.test").await;

    let read = app.get_json("/api/v1/building/fund").await;
    let write = app
        .post_json("/api/v1/building/fund", &entry("300", "income"))
        .await;

    assert_eq!(read.status, StatusCode::OK);
    assert_eq!(read.json()["fund_total_cents"], 0);
    assert_eq!(write.status, StatusCode::FORBIDDEN);
    assert!(app.ledger.stored_entries(Tenant::Building(BUILDING_ID)).is_empty());
}

// ============================================================================
// Reconciliation
// ============================================================================

#[tokio::test]
async fn test_reconcile_is_consistent_after_writes() {
    let mut app = TestApp::new();
    app.login_as("badmin@society.test").await;
    app.post_json("/api/v1/building/fund", &entry("500", "income"))
        .await;
    app.post_json("/api/v1/building/fund", &entry("120", "expense"))
        .await;

    let response = app.get_json("/api/v1/building/fund/reconcile").await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["ledger_sum_cents"], 38_000);
    assert_eq!(body["cached_total_cents"], 38_000);
    assert_eq!(body["consistent"], true);
}

#[tokio::test]
async fn test_reconcile_reports_drift() {
    let mut app = TestApp::new();
    app.login_as("admin@society.test").await;
    app.post_json("/api/v1/society/fund", &entry("10", "income"))
        .await;
    app.ledger.corrupt_total(Tenant::Society(SOCIETY_ID), 99_999);

    let body = app.get_json("/api/v1/society/fund/reconcile").await.json();

    assert_eq!(body["ledger_sum_cents"], 1_000);
    assert_eq!(body["cached_total_cents"], 99_999);
    assert_eq!(body["consistent"], false);
}
