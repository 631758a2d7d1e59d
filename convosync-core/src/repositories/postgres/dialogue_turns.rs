// src/repositories/postgres/dialogue_turns.rs
use async_trait::async_trait;
use sqlx::{Pool, Postgres, Transaction};
use uuid::Uuid;

use convosync_common::models::DialogueTurn;
use crate::Error;

/// Read side of the dialogue_turns relation.
#[async_trait]
pub trait DialogueTurnRepo: Send + Sync + 'static {
    /// All turns for a transcript, ordered by position.
    async fn list_for_transcript(&self, transcript_id: Uuid) -> Result<Vec<DialogueTurn>, Error>;
}

/// Postgres-based dialogue turn repository.
#[derive(Clone)]
pub struct PostgresDialogueTurnRepository {
    pool: Pool<Postgres>,
}

impl PostgresDialogueTurnRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Upsert one turn at its `(transcript, turn_index)` slot so that
    /// re-ingestion updates in place instead of duplicating.
    pub async fn upsert(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        turn: &DialogueTurn,
    ) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO dialogue_turns (
                turn_id, transcript_id, turn_index, role, text, raw, ts
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (transcript_id, turn_index) DO UPDATE
              SET role = EXCLUDED.role,
                  text = EXCLUDED.text,
                  raw  = EXCLUDED.raw,
                  ts   = EXCLUDED.ts
            "#,
        )
        .bind(turn.turn_id)
        .bind(turn.transcript_id)
        .bind(turn.turn_index)
        .bind(turn.role)
        .bind(&turn.text)
        .bind(&turn.raw)
        .bind(turn.ts)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl DialogueTurnRepo for PostgresDialogueTurnRepository {
    async fn list_for_transcript(&self, transcript_id: Uuid) -> Result<Vec<DialogueTurn>, Error> {
        let rows = sqlx::query_as::<_, DialogueTurn>(
            r#"
            SELECT turn_id, transcript_id, turn_index, role, text, raw, ts
            FROM dialogue_turns
            WHERE transcript_id = $1
            ORDER BY turn_index ASC
            "#,
        )
        .bind(transcript_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
