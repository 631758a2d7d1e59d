// src/repositories/postgres/transcripts.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{Pool, Postgres, Row, Transaction};
use uuid::Uuid;

use convosync_common::models::{RawTranscript, Transcript};
use crate::Error;

/// Read side of the transcripts relation; the write side runs inside the
/// ingestion engine's per-transcript transaction (see
/// [`PostgresTranscriptRepository::upsert`]).
#[async_trait]
pub trait TranscriptRepo: Send + Sync + 'static {
    async fn get_by_external_id(&self, external_id: &str) -> Result<Option<Transcript>, Error>;

    /// The incremental-sync watermark: the most recent `updated_at` of any
    /// successfully committed transcript.
    async fn latest_updated_at(&self) -> Result<Option<DateTime<Utc>>, Error>;
}

/// Postgres-based transcript repository.
#[derive(Clone)]
pub struct PostgresTranscriptRepository {
    pool: Pool<Postgres>,
}

impl PostgresTranscriptRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Upsert one transcript keyed by its external id, returning the
    /// internal row id.
    ///
    /// The raw payload and content hash are overwritten and `updated_at`
    /// bumps even when the content is identical; identity-carrying fields
    /// never regress to null.
    pub async fn upsert(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        raw: &RawTranscript,
        raw_payload: &Value,
        content_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Uuid, Error> {
        let row = sqlx::query(
            r#"
            INSERT INTO transcripts (
                transcript_id, external_id, session_id, user_id, environment,
                started_at, ended_at, raw, content_hash, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
            ON CONFLICT (external_id) DO UPDATE
              SET session_id   = EXCLUDED.session_id,
                  user_id      = COALESCE(EXCLUDED.user_id, transcripts.user_id),
                  environment  = COALESCE(EXCLUDED.environment, transcripts.environment),
                  started_at   = COALESCE(EXCLUDED.started_at, transcripts.started_at),
                  ended_at     = COALESCE(EXCLUDED.ended_at, transcripts.ended_at),
                  raw          = EXCLUDED.raw,
                  content_hash = EXCLUDED.content_hash,
                  updated_at   = EXCLUDED.updated_at
            RETURNING transcript_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&raw.external_id)
        .bind(&raw.session_id)
        .bind(&raw.user_id)
        .bind(&raw.environment)
        .bind(raw.started_at)
        .bind(raw.ended_at)
        .bind(raw_payload)
        .bind(content_hash)
        .bind(now)
        .fetch_one(&mut **tx)
        .await?;

        Ok(row.try_get("transcript_id")?)
    }
}

#[async_trait]
impl TranscriptRepo for PostgresTranscriptRepository {
    async fn get_by_external_id(&self, external_id: &str) -> Result<Option<Transcript>, Error> {
        let row = sqlx::query_as::<_, Transcript>(
            r#"
            SELECT transcript_id, external_id, session_id, user_id, environment,
                   started_at, ended_at, raw, content_hash, created_at, updated_at
            FROM transcripts
            WHERE external_id = $1
            "#,
        )
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn latest_updated_at(&self) -> Result<Option<DateTime<Utc>>, Error> {
        let row = sqlx::query(
            r#"
            SELECT MAX(updated_at) AS latest
            FROM transcripts
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_get("latest")?)
    }
}
