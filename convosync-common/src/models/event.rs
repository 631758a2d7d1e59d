// File: convosync-common/src/models/event.rs

use std::fmt;
use std::str::FromStr;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// The discrete facts we infer about a session's progression.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash, sqlx::Type)]
#[sqlx(type_name = "TEXT")]
#[sqlx(rename_all = "snake_case")]
pub enum EventType {
    CategorySelected,
    LocationSelected,
    RatingSubmitted,
    FeedbackSubmitted,
    CtaClicked,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventType::CategorySelected => write!(f, "category_selected"),
            EventType::LocationSelected => write!(f, "location_selected"),
            EventType::RatingSubmitted => write!(f, "rating_submitted"),
            EventType::FeedbackSubmitted => write!(f, "feedback_submitted"),
            EventType::CtaClicked => write!(f, "cta_clicked"),
        }
    }
}

impl FromStr for EventType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "category_selected" => Ok(EventType::CategorySelected),
            "location_selected" => Ok(EventType::LocationSelected),
            "rating_submitted" => Ok(EventType::RatingSubmitted),
            "feedback_submitted" => Ok(EventType::FeedbackSubmitted),
            "cta_clicked" => Ok(EventType::CtaClicked),
            _ => Err(format!("Unknown event type: {}", s)),
        }
    }
}

/// One inferred, timestamped, append-only fact about a session.
///
/// `(session_id, event_type, event_ts)` is unique in storage for
/// trace-timestamped events; estimated-timestamp events dedupe on
/// type + metadata instead. Either way, re-inserting the same fact on a
/// later pass is a no-op, so repeated passes over an unchanged transcript
/// do not inflate event counts.
#[derive(Clone, Debug, FromRow)]
pub struct SessionEvent {
    pub event_id: Uuid,
    pub session_id: String,
    pub user_id: Option<String>,
    pub event_type: EventType,
    pub event_ts: DateTime<Utc>,
    /// True when no matching trace carried a timestamp and we fell back to
    /// the wall clock at ingestion time.
    pub ts_estimated: bool,
    pub user_category: Option<String>,
    pub location_type: Option<String>,
    pub location_value: Option<String>,
    pub rating: Option<i32>,
    pub feedback: Option<String>,
    pub metadata: Option<Value>,
}
