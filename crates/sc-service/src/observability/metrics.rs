//! Prometheus metrics for the society service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `sc_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `outcome`: login outcomes (success, missing_credentials, invalid_credentials,
//!   account_inactive, error)
//! - `reason`: denial reasons from `ScError::reason`
//! - `scope`: society, building
//! - `path`: normalized against the known route table

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize the Prometheus recorder and return the handle used by `/metrics`.
///
/// # Errors
///
/// Returns error if a recorder is already installed in this process.
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("sc_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.200, 0.300, 0.500, 1.000, 2.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        // Login is dominated by bcrypt; coarse buckets only.
        .set_buckets_for_metric(
            Matcher::Full("sc_login_duration_seconds".to_string()),
            &[0.050, 0.100, 0.250, 0.500, 1.000, 2.000],
        )
        .map_err(|e| format!("Failed to set login buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// Authentication Metrics
// ============================================================================

/// Record a login attempt.
///
/// Metric: `sc_login_attempts_total`, `sc_login_duration_seconds`
/// Labels: `outcome`
pub fn record_login(outcome: &str, duration: Duration) {
    counter!("sc_login_attempts_total", "outcome" => outcome.to_string()).increment(1);
    histogram!("sc_login_duration_seconds").record(duration.as_secs_f64());
}

/// Record an access-control denial.
///
/// Metric: `sc_access_denials_total`
/// Labels: `reason`
pub fn record_access_denial(reason: &str) {
    counter!("sc_access_denials_total", "reason" => reason.to_string()).increment(1);
}

/// Record a CSRF check on a state-changing request.
///
/// Metric: `sc_csrf_validations_total`
/// Labels: `status` (valid, invalid)
pub fn record_csrf_validation(valid: bool) {
    let status = if valid { "valid" } else { "invalid" };
    counter!("sc_csrf_validations_total", "status" => status).increment(1);
}

/// Record a session id rotation.
///
/// Metric: `sc_session_rotations_total`
pub fn record_session_rotation() {
    counter!("sc_session_rotations_total").increment(1);
}

// ============================================================================
// Fund Metrics
// ============================================================================

/// Record a fund ledger write.
///
/// Metric: `sc_fund_entries_total`
/// Labels: `scope`, `status` (committed, rolled_back)
pub fn record_fund_entry(scope: &'static str, status: &'static str) {
    counter!("sc_fund_entries_total", "scope" => scope, "status" => status).increment(1);
}

// ============================================================================
// Activity Log Metrics
// ============================================================================

/// Record an activity log write failure.
///
/// Metric: `sc_activity_log_failures_total`
/// Labels: `action`
pub fn record_activity_log_failure(action: &'static str) {
    counter!("sc_activity_log_failures_total", "action" => action).increment(1);
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion
///
/// Metric: `sc_http_requests_total`, `sc_http_request_duration_seconds`
/// Labels: `method`, `path`, `status_code`
pub fn record_http_request(method: &str, path: &str, status_code: u16, duration: Duration) {
    let normalized_path = normalize_path(path);

    histogram!("sc_http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => normalized_path,
        "status_code" => status_code.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("sc_http_requests_total",
        "method" => method.to_string(),
        "path" => normalized_path,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

const KNOWN_PATHS: &[&str] = &[
    "/",
    "/health",
    "/metrics",
    "/auth/login",
    "/auth/logout",
    "/auth/csrf",
    "/admin/dashboard",
    "/pramukh/dashboard",
    "/building/dashboard",
    "/member/dashboard",
    "/api/v1/me",
    "/api/v1/society/buildings",
    "/api/v1/society/fund",
    "/api/v1/society/fund/reconcile",
    "/api/v1/society/meetings",
    "/api/v1/building/fund",
    "/api/v1/building/fund/reconcile",
    "/api/v1/building/meetings",
];

/// Map a request path onto the route table; anything else is `/other`.
fn normalize_path(path: &str) -> &'static str {
    KNOWN_PATHS
        .iter()
        .find(|known| **known == path)
        .copied()
        .unwrap_or("/other")
}
