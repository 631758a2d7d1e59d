// File: convosync-core/src/services/event_inference.rs
//
// Derives the ordered sequence of discrete domain events from a
// reconstructed session state and its log timeline. Performs no I/O; the
// wall clock is passed in so identical inputs always produce identical
// output.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use convosync_common::models::{EventType, SessionEvent, SessionState};

use crate::platforms::voiceflow::traces::{extract_cta_clicks, first_set_timestamp};

/// Infer the session's events, sorted by timestamp ascending.
///
/// Each event's timestamp comes from the first trace that set the matching
/// variable; when no such trace exists, `now` is used and the event is
/// marked `ts_estimated`.
pub fn infer_events(
    session_id: &str,
    user_id: Option<&str>,
    state: &SessionState,
    logs: &[Value],
    now: DateTime<Utc>,
) -> Vec<SessionEvent> {
    let mut events = Vec::new();

    if let Some(category) = state.user_category {
        let mut event = base_event(session_id, user_id, EventType::CategorySelected, logs, "typeuser", now);
        event.user_category = Some(category.to_string());
        events.push(event);
    }

    if let (Some(category), Some(location_value)) = (state.user_category, state.location_value.as_deref()) {
        let mut event = base_event(
            session_id,
            user_id,
            EventType::LocationSelected,
            logs,
            category.location_variable(),
            now,
        );
        event.user_category = Some(category.to_string());
        event.location_type = state.location_type.map(|lt| lt.to_string());
        event.location_value = Some(location_value.to_string());
        events.push(event);
    }

    if let Some(rating) = state.rating {
        let mut event = base_event(session_id, user_id, EventType::RatingSubmitted, logs, "rating", now);
        event.rating = Some(rating);
        events.push(event);

        // Feedback is only meaningful under a qualifying rating.
        if let Some(feedback) = state.feedback.as_deref() {
            let mut event =
                base_event(session_id, user_id, EventType::FeedbackSubmitted, logs, "feedback", now);
            event.rating = Some(rating);
            event.feedback = Some(feedback.to_string());
            events.push(event);
        }
    }

    for click in extract_cta_clicks(logs) {
        let (event_ts, ts_estimated) = match click.ts {
            Some(ts) => (ts, false),
            None => (now, true),
        };
        events.push(SessionEvent {
            event_id: Uuid::new_v4(),
            session_id: session_id.to_string(),
            user_id: user_id.map(str::to_string),
            event_type: EventType::CtaClicked,
            event_ts,
            ts_estimated,
            user_category: None,
            location_type: None,
            location_value: None,
            rating: None,
            feedback: None,
            metadata: Some(json!({ "label": click.label })),
        });
    }

    events.sort_by_key(|e| e.event_ts);
    events
}

fn base_event(
    session_id: &str,
    user_id: Option<&str>,
    event_type: EventType,
    logs: &[Value],
    variable: &str,
    now: DateTime<Utc>,
) -> SessionEvent {
    let (event_ts, ts_estimated) = match first_set_timestamp(logs, variable) {
        Some(ts) => (ts, false),
        None => (now, true),
    };
    SessionEvent {
        event_id: Uuid::new_v4(),
        session_id: session_id.to_string(),
        user_id: user_id.map(str::to_string),
        event_type,
        event_ts,
        ts_estimated,
        user_category: None,
        location_type: None,
        location_value: None,
        rating: None,
        feedback: None,
        metadata: None,
    }
}
