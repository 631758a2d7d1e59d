// src/repositories/postgres/sessions.rs
use async_trait::async_trait;
use sqlx::{Pool, Postgres, Transaction};

use convosync_common::models::Session;
use crate::Error;

/// Read side of the sessions relation.
#[async_trait]
pub trait SessionRepo: Send + Sync + 'static {
    async fn get(&self, session_id: &str) -> Result<Option<Session>, Error>;
}

/// Postgres-based session repository.
#[derive(Clone)]
pub struct PostgresSessionRepository {
    pool: Pool<Postgres>,
}

impl PostgresSessionRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Coalesce-on-conflict upsert: a pass only fills gaps or replaces with
    /// newer non-null data; it never overwrites a known value with an
    /// absent one.
    pub async fn upsert(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        session: &Session,
    ) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO sessions (
                session_id, user_id, transcript_external_id,
                user_category, location_type, location_value,
                rating, feedback, started_at, ended_at,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
            ON CONFLICT (session_id) DO UPDATE
              SET user_id                = COALESCE(EXCLUDED.user_id, sessions.user_id),
                  transcript_external_id = COALESCE(EXCLUDED.transcript_external_id, sessions.transcript_external_id),
                  user_category          = COALESCE(EXCLUDED.user_category, sessions.user_category),
                  location_type          = COALESCE(EXCLUDED.location_type, sessions.location_type),
                  location_value         = COALESCE(EXCLUDED.location_value, sessions.location_value),
                  rating                 = COALESCE(EXCLUDED.rating, sessions.rating),
                  feedback               = COALESCE(EXCLUDED.feedback, sessions.feedback),
                  started_at             = COALESCE(EXCLUDED.started_at, sessions.started_at),
                  ended_at               = COALESCE(EXCLUDED.ended_at, sessions.ended_at),
                  updated_at             = EXCLUDED.updated_at
            "#,
        )
        .bind(&session.session_id)
        .bind(&session.user_id)
        .bind(&session.transcript_external_id)
        .bind(session.user_category)
        .bind(session.location_type)
        .bind(&session.location_value)
        .bind(session.rating)
        .bind(&session.feedback)
        .bind(session.started_at)
        .bind(session.ended_at)
        .bind(session.updated_at)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl SessionRepo for PostgresSessionRepository {
    async fn get(&self, session_id: &str) -> Result<Option<Session>, Error> {
        let row = sqlx::query_as::<_, Session>(
            r#"
            SELECT session_id, user_id, transcript_external_id,
                   user_category, location_type, location_value,
                   rating, feedback, started_at, ended_at,
                   created_at, updated_at
            FROM sessions
            WHERE session_id = $1
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}
