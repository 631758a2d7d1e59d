// src/tasks/transcript_sync.rs

use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::services::sync_service::{SyncOptions, TranscriptSyncService};

/// Spawns a background task that runs a sync pass on a fixed interval.
///
/// Each pass is incremental; failed transcripts fall inside the next pass's
/// window automatically because the watermark only advances on committed
/// rows.
pub fn spawn_transcript_sync_task(
    sync_service: Arc<TranscriptSyncService>,
    interval_secs: u64,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        loop {
            interval.tick().await;
            match sync_service.perform_sync(SyncOptions::default()).await {
                Ok(summary) => {
                    info!(
                        "Scheduled sync pass done => synced={}, failed={}",
                        summary.synced, summary.failed
                    );
                }
                Err(e) => {
                    error!("Scheduled sync pass failed: {:?}", e);
                }
            }
        }
    })
}
