// File: convosync-common/src/models/transcript.rs

use std::fmt;
use std::str::FromStr;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use sqlx::FromRow;
use uuid::Uuid;

/// One stored transcript row: the raw payload plus its identifiers.
#[derive(Clone, Debug, FromRow)]
pub struct Transcript {
    pub transcript_id: Uuid,
    /// External transcript id when the platform supplied one, otherwise the
    /// session id. Unique; the upsert key for re-ingestion.
    pub external_id: String,
    pub session_id: String,
    pub user_id: Option<String>,
    pub environment: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub raw: Value,
    pub content_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Who produced a dialogue turn.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash, sqlx::Type)]
#[sqlx(type_name = "TEXT")]
#[sqlx(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
    System,
}

impl fmt::Display for TurnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnRole::User => write!(f, "user"),
            TurnRole::Assistant => write!(f, "assistant"),
            TurnRole::System => write!(f, "system"),
        }
    }
}

impl FromStr for TurnRole {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(TurnRole::User),
            "assistant" => Ok(TurnRole::Assistant),
            "system" => Ok(TurnRole::System),
            _ => Err(format!("Unknown turn role: {}", s)),
        }
    }
}

/// One utterance extracted from a transcript's raw log.
///
/// `turn_index` values are dense and zero-based within a transcript;
/// re-ingestion updates the turn at the same index instead of duplicating it.
#[derive(Clone, Debug, FromRow)]
pub struct DialogueTurn {
    pub turn_id: Uuid,
    pub transcript_id: Uuid,
    pub turn_index: i32,
    pub role: TurnRole,
    pub text: String,
    /// The original log entry, kept verbatim for audit.
    pub raw: Value,
    pub ts: Option<DateTime<Utc>>,
}

/// The ingestion engine's input shape: one remote transcript after the
/// listing summary (authoritative for declared properties) and the fetched
/// body (authoritative for the raw log) have been merged.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RawTranscript {
    pub external_id: String,
    pub session_id: String,
    pub user_id: Option<String>,
    pub environment: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub last_interaction_at: Option<DateTime<Utc>>,
    pub remote_updated_at: Option<DateTime<Utc>>,
    pub properties: Map<String, Value>,
    pub logs: Vec<Value>,
}

impl RawTranscript {
    /// The full raw payload as stored in the `transcripts.raw` column.
    pub fn to_raw_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Hex sha-256 of the canonical JSON rendering of the payload.
    ///
    /// `serde_json` maps are key-ordered, so re-serializing identical content
    /// always yields the same hash.
    pub fn content_hash(&self) -> String {
        let canonical = self.to_raw_value().to_string();
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}
