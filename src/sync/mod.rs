use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::gateway::PlayerRecordGateway;
use crate::types::UserData;

/// Drain the pending-write queue and deliver record snapshots to the
/// gateway.
///
/// Mutations enqueue optimistically and never wait for delivery. Queued
/// snapshots are coalesced last-write-wins: only the newest one is sent,
/// both when draining a backlog and when retrying after a failure. A failed
/// save is retried after `retry_delay` without touching local state.
pub async fn start_persist_loop(
    gateway: PlayerRecordGateway,
    mut pending: mpsc::UnboundedReceiver<UserData>,
    retry_delay: Duration,
) {
    info!(
        "Persistence loop started (retry after {}s on failure)",
        retry_delay.as_secs()
    );

    while let Some(mut snapshot) = pending.recv().await {
        // Coalesce any backlog to the newest snapshot
        while let Ok(newer) = pending.try_recv() {
            snapshot = newer;
        }

        loop {
            match gateway.save(&snapshot).await {
                Ok(saved_at) => {
                    debug!("Record snapshot persisted (savedAt {})", saved_at);
                    break;
                }
                Err(e) => {
                    warn!(
                        "Record save failed: {}. Retrying in {}s",
                        e,
                        retry_delay.as_secs()
                    );
                    tokio::time::sleep(retry_delay).await;
                    // A newer snapshot supersedes the failed one
                    while let Ok(newer) = pending.try_recv() {
                        snapshot = newer;
                    }
                }
            }
        }
    }

    info!("Persistence loop stopped (queue closed)");
}
