//! Liveness probe.

/// GET /health
///
/// Does not touch the database; a failure means the process is stuck.
pub async fn health_check() -> &'static str {
    "OK"
}
