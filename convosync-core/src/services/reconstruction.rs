// File: convosync-core/src/services/reconstruction.rs
//
// Composes the property parser and the trace scanner into one authoritative
// session state per transcript. Declared properties win; the raw log is the
// fallback.

use convosync_common::models::{RawTranscript, SessionState};

use crate::platforms::voiceflow::properties::{self, extract_rating, parse_properties};
use crate::platforms::voiceflow::traces::find_variable_set;

/// Reconstruct the session state for one transcript.
///
/// Hybrid, properties-first: the declared property bag is parsed first, and
/// the raw log is only scanned for fields the properties did not declare
/// (the category, and the category-scoped location). Feedback is kept only
/// under a rating of 3 or less; with a higher rating it is dropped from the
/// state — the raw transcript still holds it for audit.
pub fn reconstruct_state(raw: &RawTranscript) -> SessionState {
    let props = parse_properties(&raw.properties);

    let user_category = props.user_category.or_else(|| {
        find_variable_set(&raw.logs, "typeuser").and_then(|m| m.value.parse().ok())
    });

    let (location_type, location_value) = match user_category {
        Some(category) => {
            let value = props
                .location_for(category)
                .map(str::to_string)
                .or_else(|| {
                    find_variable_set(&raw.logs, category.location_variable())
                        .map(|m| properties::normalize_location(&m.value))
                });
            (value.as_ref().map(|_| category.location_type()), value)
        }
        // A location cannot be scoped without a category.
        None => (None, None),
    };

    let rating = props.raw_rating.as_deref().and_then(extract_rating);
    let feedback = match rating {
        Some(r) if r <= 3 => props.feedback,
        _ => None,
    };

    SessionState {
        user_category,
        location_type,
        location_value,
        rating,
        feedback,
        started_at: raw.started_at,
        ended_at: raw
            .ended_at
            .or(raw.last_interaction_at)
            .or(raw.remote_updated_at),
    }
}

/// Check cross-field business invariants on a reconstructed state.
///
/// Violations are reported as human-readable messages and do not block
/// ingestion; the ingestion engine persists the state regardless and
/// surfaces them on its result.
pub fn validate_state(state: &SessionState) -> Vec<String> {
    let mut violations = Vec::new();

    if state.feedback.is_some() {
        match state.rating {
            Some(r) if r <= 3 => {}
            Some(r) => violations.push(format!(
                "feedback present but rating {} does not qualify (must be <= 3)",
                r
            )),
            None => violations.push("feedback present without a rating".to_string()),
        }
    }

    if let Some(location_type) = state.location_type {
        match state.user_category {
            Some(category) if category.location_type() == location_type => {}
            Some(category) => violations.push(format!(
                "location_type '{}' does not match user category '{}'",
                location_type, category
            )),
            None => violations.push(format!(
                "location_type '{}' set without a user category",
                location_type
            )),
        }
    }

    violations
}
