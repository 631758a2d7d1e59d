// File: convosync-core/src/services/sync_service.rs
//
// The top-level batch driver: window selection, remote pagination, bounded
// concurrency fetch + ingest, and result aggregation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::{stream, StreamExt};
use serde_json::Value;
use tracing::{info, warn};

use convosync_common::models::RawTranscript;

use crate::platforms::voiceflow::{extract_logs, TranscriptSource, TranscriptSummary};
use crate::repositories::postgres::TranscriptRepo;
use crate::services::ingest_service::TranscriptIngestor;
use crate::Error;

/// Options for one sync pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Ignore the watermark and run a full sync.
    pub force: bool,
}

/// Aggregated outcome of one sync pass.
#[derive(Debug, Clone, Default)]
pub struct SyncSummary {
    pub synced: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

/// Tunables for one pass. Fetch concurrency runs higher than ingest
/// concurrency because each ingestion holds a transactional connection.
#[derive(Debug, Clone, Copy)]
pub struct SyncConfig {
    pub page_size: u32,
    /// Hard cap on listing pages, defensive against a remote that never
    /// returns a short page.
    pub max_pages: u32,
    pub fetch_concurrency: usize,
    pub ingest_concurrency: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            page_size: 100,
            max_pages: 50,
            fetch_concurrency: 8,
            ingest_concurrency: 3,
        }
    }
}

/// Drives one batch pass over the remote transcript listing.
pub struct TranscriptSyncService {
    source: Arc<dyn TranscriptSource>,
    ingestor: Arc<dyn TranscriptIngestor>,
    transcripts: Arc<dyn TranscriptRepo>,
    config: SyncConfig,
}

impl TranscriptSyncService {
    pub fn new(
        source: Arc<dyn TranscriptSource>,
        ingestor: Arc<dyn TranscriptIngestor>,
        transcripts: Arc<dyn TranscriptRepo>,
    ) -> Self {
        Self {
            source,
            ingestor,
            transcripts,
            config: SyncConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Run one sync pass. The watermark is computed once here and threaded
    /// down; it is never re-read mid-pass.
    pub async fn perform_sync(&self, options: SyncOptions) -> Result<SyncSummary, Error> {
        let since: Option<DateTime<Utc>> = if options.force {
            None
        } else {
            self.transcripts.latest_updated_at().await?
        };
        match since {
            Some(ts) => info!("Starting incremental sync pass (since {})", ts),
            None => info!("Starting full sync pass"),
        }

        let summaries = self.list_all(since).await?;
        info!("Listed {} transcript summaries", summaries.len());

        let mut summary = SyncSummary::default();

        // Fetch full bodies with bounded concurrency; per-id failures are
        // recorded and the batch continues.
        let fetched: Vec<(TranscriptSummary, Result<Value, Error>)> =
            stream::iter(summaries.into_iter().map(|s| {
                let source = Arc::clone(&self.source);
                async move {
                    match s.external_id().map(str::to_string) {
                        Some(id) => {
                            let body = source.fetch_transcript(&id).await;
                            (s, body)
                        }
                        None => (
                            s,
                            Err(Error::Parse(
                                "transcript summary carries neither transcript id nor session id"
                                    .to_string(),
                            )),
                        ),
                    }
                }
            }))
            .buffer_unordered(self.config.fetch_concurrency)
            .collect()
            .await;

        // Map: the summary is authoritative for declared properties, the
        // body for the raw log.
        let mut batch: Vec<RawTranscript> = Vec::new();
        for (s, result) in fetched {
            let label = s.external_id().unwrap_or("<unknown>").to_string();
            match result.and_then(|body| map_transcript(&s, &body)) {
                Ok(raw) => batch.push(raw),
                Err(e) => {
                    warn!("Skipping transcript '{}': {}", label, e);
                    summary.failed += 1;
                    summary.errors.push(format!("{}: {}", label, e));
                }
            }
        }

        // Ingest with its own (lower) concurrency bound.
        let results: Vec<(String, crate::services::ingest_service::IngestionResult)> =
            stream::iter(batch.into_iter().map(|raw| {
                let ingestor = Arc::clone(&self.ingestor);
                async move {
                    let result = ingestor.ingest_transcript(&raw).await;
                    (raw.external_id, result)
                }
            }))
            .buffer_unordered(self.config.ingest_concurrency)
            .collect()
            .await;

        for (external_id, result) in results {
            if result.success {
                summary.synced += 1;
            } else {
                summary.failed += 1;
            }
            for err in result.errors {
                summary.errors.push(format!("{}: {}", external_id, err));
            }
        }

        info!(
            "Sync pass complete => synced={}, failed={}, errors={}",
            summary.synced,
            summary.failed,
            summary.errors.len()
        );
        Ok(summary)
    }

    /// Paginate the remote listing until a short page or the safety cap.
    async fn list_all(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<TranscriptSummary>, Error> {
        let page_size = self.config.page_size;
        let mut all = Vec::new();
        for page in 0..self.config.max_pages {
            let offset = page * page_size;
            let items = self
                .source
                .list_transcripts(offset, page_size, since)
                .await?;
            let count = items.len() as u32;
            all.extend(items);
            if count < page_size {
                return Ok(all);
            }
        }
        warn!(
            "Transcript listing hit the {}-page safety cap; remote kept returning full pages",
            self.config.max_pages
        );
        Ok(all)
    }
}

/// Merge one listing summary with its fetched body into the ingestion
/// engine's input shape.
pub fn map_transcript(summary: &TranscriptSummary, body: &Value) -> Result<RawTranscript, Error> {
    let external_id = summary
        .external_id()
        .ok_or_else(|| {
            Error::Parse("transcript summary carries neither transcript id nor session id".to_string())
        })?
        .to_string();
    let session_id = summary
        .session_id
        .clone()
        .unwrap_or_else(|| external_id.clone());

    Ok(RawTranscript {
        external_id,
        session_id,
        user_id: summary.user_id.clone(),
        environment: summary.environment.clone(),
        started_at: summary.created_at_utc(),
        ended_at: summary.ended_at_utc(),
        last_interaction_at: summary.last_interaction_at_utc(),
        remote_updated_at: summary.updated_at_utc(),
        properties: summary.properties.clone().unwrap_or_default(),
        logs: extract_logs(body),
    })
}
