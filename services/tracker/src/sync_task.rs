//! services/tracker/src/sync_task.rs
//!
//! The background worker that periodically pulls the remote spreadsheet into local
//! storage. It runs until its `CancellationToken` is cancelled.

use production_tracker_core::TrackerService;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Syncs once immediately, then every `interval`. Failures are logged and the
/// next tick tries again.
pub async fn periodic_sync(
    service: Arc<TrackerService>,
    interval: Duration,
    cancellation_token: CancellationToken,
) {
    info!("Periodic sync started, every {:?}", interval);
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancellation_token.cancelled() => {
                info!("Periodic sync cancelled.");
                return;
            }
            _ = ticker.tick() => {}
        }

        if !service.is_remote_enabled() {
            debug!("No remote endpoint; skipping scheduled sync");
            continue;
        }
        // A sync already in flight is allowed to finish before shutdown proceeds.
        match service.sync_with_remote().await {
            Ok(report) => debug!(replaced = ?report.replaced(), "Scheduled sync finished"),
            Err(e) => warn!("Scheduled sync failed: {}", e),
        }
    }
}
