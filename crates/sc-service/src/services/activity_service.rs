//! Fire-and-forget activity logging.

use crate::observability::metrics::record_activity_log_failure;
use crate::repositories::{ActivityEntry, ActivityLog};
use std::sync::Arc;
use tracing::warn;

/// Write `entry` in the background.
///
/// The caller never waits for the write and never sees its failure; failures
/// are logged and counted.
pub fn record(log: Arc<dyn ActivityLog>, entry: ActivityEntry) {
    tokio::spawn(async move {
        if let Err(e) = log.record(&entry).await {
            record_activity_log_failure(entry.action);
            warn!(target: "sc.activity", action = entry.action, error = %e, "Activity log write failed");
        }
    });
}
