// File: convosync-core/src/services/ingest_service.rs
//
// The ingestion engine: one atomic transaction per transcript covering the
// raw transcript row, its dialogue turns, the reconstructed session and the
// inferred events.

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, error, warn};
use uuid::Uuid;

use convosync_common::models::{DialogueTurn, RawTranscript, Session};

use crate::db::Database;
use crate::platforms::voiceflow::traces::extract_turns;
use crate::repositories::postgres::{
    PostgresDialogueTurnRepository, PostgresSessionEventRepository, PostgresSessionRepository,
    PostgresTranscriptRepository,
};
use crate::services::event_inference::infer_events;
use crate::services::reconstruction::{reconstruct_state, validate_state};
use crate::Error;

/// Outcome of ingesting one transcript. `errors` carries business-rule
/// violations even when `success` is true.
#[derive(Debug, Clone, Default)]
pub struct IngestionResult {
    pub success: bool,
    pub turns_count: usize,
    pub events_count: usize,
    pub errors: Vec<String>,
}

/// Seam between the sync orchestrator and the ingestion engine.
#[async_trait]
pub trait TranscriptIngestor: Send + Sync {
    async fn ingest_transcript(&self, raw: &RawTranscript) -> IngestionResult;
}

/// Transactionally persists one transcript and everything derived from it.
pub struct TranscriptIngestService {
    db: Database,
    transcripts: PostgresTranscriptRepository,
    turns: PostgresDialogueTurnRepository,
    sessions: PostgresSessionRepository,
    events: PostgresSessionEventRepository,
}

impl TranscriptIngestService {
    pub fn new(db: Database) -> Self {
        let pool = db.pool().clone();
        Self {
            transcripts: PostgresTranscriptRepository::new(pool.clone()),
            turns: PostgresDialogueTurnRepository::new(pool.clone()),
            sessions: PostgresSessionRepository::new(pool.clone()),
            events: PostgresSessionEventRepository::new(pool),
            db,
        }
    }

    async fn ingest_inner(&self, raw: &RawTranscript) -> Result<IngestionResult, Error> {
        let now = Utc::now();
        let mut tx = self.db.pool().begin().await?;

        // 1) Raw transcript row. The hash is stored for change detection;
        //    updated_at bumps even when content is identical.
        let raw_payload = raw.to_raw_value();
        let content_hash = raw.content_hash();
        let transcript_id = self
            .transcripts
            .upsert(&mut tx, raw, &raw_payload, &content_hash, now)
            .await?;

        // 2) Dialogue turns, re-indexed densely after empty entries drop out.
        let extracted = extract_turns(&raw.logs);
        let turns_count = extracted.len();
        for (index, turn) in extracted.into_iter().enumerate() {
            let row = DialogueTurn {
                turn_id: Uuid::new_v4(),
                transcript_id,
                turn_index: index as i32,
                role: turn.role,
                text: turn.text,
                raw: turn.raw,
                ts: turn.ts,
            };
            self.turns.upsert(&mut tx, &row).await?;
        }

        // 3) Reconstructed state; violations are warnings, not failures.
        let state = reconstruct_state(raw);
        let violations = validate_state(&state);
        for violation in &violations {
            warn!(
                "Session '{}' failed validation: {}",
                raw.session_id, violation
            );
        }

        // 4) Session row, merged additively into whatever earlier passes knew.
        let session = Session {
            session_id: raw.session_id.clone(),
            user_id: raw.user_id.clone(),
            transcript_external_id: Some(raw.external_id.clone()),
            user_category: state.user_category,
            location_type: state.location_type,
            location_value: state.location_value.clone(),
            rating: state.rating,
            feedback: state.feedback.clone(),
            started_at: state.started_at,
            ended_at: state.ended_at,
            created_at: now,
            updated_at: now,
        };
        self.sessions.upsert(&mut tx, &session).await?;

        // 5) Inferred events; duplicates from earlier passes are no-ops.
        let inferred = infer_events(
            &raw.session_id,
            raw.user_id.as_deref(),
            &state,
            &raw.logs,
            now,
        );
        let mut events_count = 0;
        for event in &inferred {
            if self.events.insert(&mut tx, event, now).await? {
                events_count += 1;
            }
        }

        tx.commit().await?;

        Ok(IngestionResult {
            success: true,
            turns_count,
            events_count,
            errors: violations,
        })
    }
}

#[async_trait]
impl TranscriptIngestor for TranscriptIngestService {
    async fn ingest_transcript(&self, raw: &RawTranscript) -> IngestionResult {
        match self.ingest_inner(raw).await {
            Ok(result) => {
                debug!(
                    "Ingested transcript '{}' => {} turns, {} new events",
                    raw.external_id, result.turns_count, result.events_count
                );
                result
            }
            // The transaction dropped without commit, so every write for
            // this transcript rolled back; the batch keeps going.
            Err(e) => {
                error!("Ingestion failed for transcript '{}': {:?}", raw.external_id, e);
                IngestionResult {
                    success: false,
                    turns_count: 0,
                    events_count: 0,
                    errors: vec![e.to_string()],
                }
            }
        }
    }
}
