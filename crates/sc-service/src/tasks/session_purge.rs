//! Idle session purge.
//!
//! Expired sessions are already ignored on load; this task reclaims the
//! memory of sessions whose cookie never comes back. Exits when the
//! cancellation token fires.

use crate::session::MemorySessionStore;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

/// Default purge interval in seconds.
pub const DEFAULT_PURGE_INTERVAL_SECONDS: u64 = 60;

#[instrument(skip_all, name = "sc.task.session_purge")]
pub async fn start_session_purge(
    store: Arc<MemorySessionStore>,
    interval: Duration,
    cancel_token: CancellationToken,
) {
    info!(
        target: "sc.session",
        interval_seconds = interval.as_secs(),
        "Starting session purge task"
    );

    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                store.purge_expired(Utc::now()).await;
            }
            _ = cancel_token.cancelled() => {
                info!(target: "sc.session", "Session purge task received shutdown signal, exiting");
                break;
            }
        }
    }
}
