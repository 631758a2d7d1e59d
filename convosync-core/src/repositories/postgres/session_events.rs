// src/repositories/postgres/session_events.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Transaction};

use convosync_common::models::SessionEvent;
use crate::Error;

/// Read side of the session_events relation.
#[async_trait]
pub trait SessionEventRepo: Send + Sync + 'static {
    /// All events for a session, oldest first.
    async fn list_for_session(&self, session_id: &str) -> Result<Vec<SessionEvent>, Error>;
}

/// Postgres-based session event repository.
#[derive(Clone)]
pub struct PostgresSessionEventRepository {
    pool: Pool<Postgres>,
}

impl PostgresSessionEventRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Append one event; re-inserting the same fact on a later pass is a
    /// no-op rather than a duplicate. Returns whether a row was written.
    ///
    /// Trace-timestamped events dedupe on the
    /// `(session_id, event_type, event_ts)` uniqueness. Estimated timestamps
    /// change on every pass, so those events instead dedupe against any
    /// existing estimated event of the same type (and metadata, which keeps
    /// distinct CTA labels apart).
    pub async fn insert(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        event: &SessionEvent,
        now: DateTime<Utc>,
    ) -> Result<bool, Error> {
        let sql = if event.ts_estimated {
            r#"
            INSERT INTO session_events (
                event_id, session_id, user_id, event_type, event_ts, ts_estimated,
                user_category, location_type, location_value, rating, feedback,
                metadata, created_at
            )
            SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13
            WHERE NOT EXISTS (
                SELECT 1 FROM session_events
                WHERE session_id = $2
                  AND event_type = $4
                  AND ts_estimated
                  AND metadata IS NOT DISTINCT FROM $12
            )
            "#
        } else {
            r#"
            INSERT INTO session_events (
                event_id, session_id, user_id, event_type, event_ts, ts_estimated,
                user_category, location_type, location_value, rating, feedback,
                metadata, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (session_id, event_type, event_ts) WHERE NOT ts_estimated
            DO NOTHING
            "#
        };

        let result = sqlx::query(sql)
            .bind(event.event_id)
            .bind(&event.session_id)
            .bind(&event.user_id)
            .bind(event.event_type)
            .bind(event.event_ts)
            .bind(event.ts_estimated)
            .bind(&event.user_category)
            .bind(&event.location_type)
            .bind(&event.location_value)
            .bind(event.rating)
            .bind(&event.feedback)
            .bind(&event.metadata)
            .bind(now)
            .execute(&mut **tx)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl SessionEventRepo for PostgresSessionEventRepository {
    async fn list_for_session(&self, session_id: &str) -> Result<Vec<SessionEvent>, Error> {
        let rows = sqlx::query_as::<_, SessionEvent>(
            r#"
            SELECT event_id, session_id, user_id, event_type, event_ts, ts_estimated,
                   user_category, location_type, location_value, rating, feedback,
                   metadata
            FROM session_events
            WHERE session_id = $1
            ORDER BY event_ts ASC
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
