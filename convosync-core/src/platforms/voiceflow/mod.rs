// File: convosync-core/src/platforms/voiceflow/mod.rs

pub mod client;
pub mod properties;
pub mod traces;

pub use client::VoiceflowClient;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::Error;

/// JSON shape of one entry in the remote transcript listing.
///
/// The summary is the source of truth for the declared session properties;
/// every field is optional because the remote API omits what it does not
/// know.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TranscriptSummary {
    #[serde(rename = "_id", alias = "id")]
    pub id: Option<String>,
    #[serde(rename = "sessionID", alias = "sessionId")]
    pub session_id: Option<String>,
    #[serde(rename = "userID", alias = "userId")]
    pub user_id: Option<String>,
    #[serde(rename = "projectID", alias = "projectId")]
    pub project_id: Option<String>,
    #[serde(alias = "tag")]
    pub environment: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<String>,
    #[serde(rename = "endedAt")]
    pub ended_at: Option<String>,
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<String>,
    #[serde(rename = "lastInteractionAt")]
    pub last_interaction_at: Option<String>,
    pub properties: Option<Map<String, Value>>,
}

impl TranscriptSummary {
    /// Identity for ingestion: the external transcript id when present,
    /// otherwise the session id.
    pub fn external_id(&self) -> Option<&str> {
        self.id.as_deref().or(self.session_id.as_deref())
    }

    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        self.created_at.as_deref().and_then(traces::parse_timestamp_str)
    }

    pub fn ended_at_utc(&self) -> Option<DateTime<Utc>> {
        self.ended_at.as_deref().and_then(traces::parse_timestamp_str)
    }

    pub fn updated_at_utc(&self) -> Option<DateTime<Utc>> {
        self.updated_at.as_deref().and_then(traces::parse_timestamp_str)
    }

    pub fn last_interaction_at_utc(&self) -> Option<DateTime<Utc>> {
        self.last_interaction_at
            .as_deref()
            .and_then(traces::parse_timestamp_str)
    }
}

/// Pull the ordered raw log out of a fetched transcript body.
///
/// The body endpoint has returned both a bare array of log entries and an
/// object wrapping them, depending on API version; accept either.
pub fn extract_logs(body: &Value) -> Vec<Value> {
    match body {
        Value::Array(entries) => entries.clone(),
        Value::Object(obj) => {
            for key in ["logs", "trace", "turns"] {
                if let Some(Value::Array(entries)) = obj.get(key) {
                    return entries.clone();
                }
            }
            Vec::new()
        }
        _ => Vec::new(),
    }
}

/// Remote transcript API, abstracted so the sync orchestrator can be tested
/// without a network.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// One page of transcript summaries. `since` is the incremental-sync
    /// lower bound; `None` means full sync.
    async fn list_transcripts(
        &self,
        offset: u32,
        limit: u32,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<TranscriptSummary>, Error>;

    /// The full transcript body (raw log) for one id.
    async fn fetch_transcript(&self, transcript_id: &str) -> Result<Value, Error>;
}
