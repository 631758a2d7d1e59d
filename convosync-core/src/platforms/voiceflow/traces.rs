// File: convosync-core/src/platforms/voiceflow/traces.rs
//
// Scanning of a transcript's raw interaction log. Log entries are
// heterogeneous JSON documents; every accessor here tolerates missing or
// oddly-shaped fields by skipping the entry.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use convosync_common::models::TurnRole;

/// First assignment found for a requested variable.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceMatch {
    pub value: String,
    pub ts: Option<DateTime<Utc>>,
}

/// One utterance pulled out of the raw log, before indexing.
#[derive(Debug, Clone)]
pub struct ExtractedTurn {
    pub role: TurnRole,
    pub text: String,
    pub ts: Option<DateTime<Utc>>,
    pub raw: Value,
}

/// One call-to-action click found in the raw log.
#[derive(Debug, Clone, PartialEq)]
pub struct CtaClick {
    pub label: String,
    pub ts: Option<DateTime<Utc>>,
}

/// Find the first "variable set" entry whose key matches `name`
/// (case-insensitive) and return its stringified value plus the entry
/// timestamp.
///
/// Single forward pass, first-write-wins: later assignments to the same
/// variable within one transcript are ignored, on the theory that the first
/// value is the one the user settled on before moving through the flow.
pub fn find_variable_set(logs: &[Value], name: &str) -> Option<TraceMatch> {
    for entry in logs {
        if entry_type(entry) != Some("set") {
            continue;
        }
        let key = entry
            .get("payload")
            .and_then(|p| p.get("key").or_else(|| p.get("variable")))
            .or_else(|| entry.get("key"))
            .and_then(Value::as_str);
        let Some(key) = key else { continue };
        if !key.eq_ignore_ascii_case(name) {
            continue;
        }
        let value = entry
            .get("payload")
            .and_then(|p| p.get("value"))
            .or_else(|| entry.get("value"))
            .and_then(value_as_string);
        if let Some(value) = value {
            return Some(TraceMatch {
                value,
                ts: entry_timestamp(entry),
            });
        }
    }
    None
}

/// When was `name` first assigned, if any assignment carried a timestamp.
pub fn first_set_timestamp(logs: &[Value], name: &str) -> Option<DateTime<Utc>> {
    find_variable_set(logs, name).and_then(|m| m.ts)
}

/// Extract user/assistant/system utterances from the raw log, in log order.
/// Entries that do not resolve to non-empty text are dropped.
pub fn extract_turns(logs: &[Value]) -> Vec<ExtractedTurn> {
    let mut turns = Vec::new();
    for entry in logs {
        let role = match entry_type(entry) {
            Some("request") => TurnRole::User,
            Some("text") | Some("speak") => TurnRole::Assistant,
            Some("system") => TurnRole::System,
            _ => continue,
        };
        let Some(text) = entry_text(entry) else { continue };
        turns.push(ExtractedTurn {
            role,
            text,
            ts: entry_timestamp(entry),
            raw: entry.clone(),
        });
    }
    turns
}

/// Extract call-to-action clicks: action/button entries carrying a
/// human-readable label.
pub fn extract_cta_clicks(logs: &[Value]) -> Vec<CtaClick> {
    let mut clicks = Vec::new();
    for entry in logs {
        match entry_type(entry) {
            Some("action") | Some("button") => {}
            _ => continue,
        }
        let label = entry
            .get("payload")
            .and_then(|p| p.get("label").or_else(|| p.get("name")))
            .or_else(|| entry.get("label"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|l| !l.is_empty());
        if let Some(label) = label {
            clicks.push(CtaClick {
                label: label.to_string(),
                ts: entry_timestamp(entry),
            });
        }
    }
    clicks
}

/// The entry's own type, falling back to the payload's type.
fn entry_type(entry: &Value) -> Option<&str> {
    entry
        .get("type")
        .and_then(Value::as_str)
        .or_else(|| entry.get("payload").and_then(|p| p.get("type")).and_then(Value::as_str))
}

fn entry_text(entry: &Value) -> Option<String> {
    let payload = entry.get("payload")?;
    let candidates = [
        payload.get("message"),
        payload.get("text"),
        payload.get("query"),
        payload.get("payload").and_then(|p| p.get("query")),
        payload.get("payload").and_then(|p| p.get("message")),
    ];
    candidates
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|t| !t.is_empty())
        .map(str::to_string)
}

/// Per-entry timestamp, wherever the platform put it.
pub fn entry_timestamp(entry: &Value) -> Option<DateTime<Utc>> {
    ["timestamp", "ts", "startTime", "createdAt"]
        .iter()
        .filter_map(|key| entry.get(*key))
        .find_map(timestamp_from_value)
}

/// Lenient timestamp parsing: epoch milliseconds, epoch seconds, or an
/// RFC 3339 string. Integers at or above 1e12 are read as milliseconds.
pub fn timestamp_from_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => {
            let n = n.as_i64()?;
            epoch_to_utc(n)
        }
        Value::String(s) => parse_timestamp_str(s),
        _ => None,
    }
}

/// RFC 3339 first, then numeric-string epochs.
pub fn parse_timestamp_str(s: &str) -> Option<DateTime<Utc>> {
    let trimmed = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    trimmed.parse::<i64>().ok().and_then(epoch_to_utc)
}

fn epoch_to_utc(n: i64) -> Option<DateTime<Utc>> {
    if n >= 1_000_000_000_000 {
        Utc.timestamp_millis_opt(n).single()
    } else {
        Utc.timestamp_opt(n, 0).single()
    }
}

fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
