// File: convosync-core/src/platforms/voiceflow/properties.rs
//
// Parsing of a transcript's declared property bag. Everything here is pure
// and never errors: absent or unrecognized fields are simply omitted from
// the result.

use std::collections::HashMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use convosync_common::models::UserCategory;

/// Fields recovered from a transcript's declared properties. Partial by
/// design; the reconstructor fills gaps from the raw log where it can.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedProperties {
    pub user_category: Option<UserCategory>,
    /// Kept raw; numeric extraction is deferred to `extract_rating`.
    pub raw_rating: Option<String>,
    pub feedback: Option<String>,
    pub rental_location: Option<String>,
    pub investor_location: Option<String>,
    pub owner_occupier_location: Option<String>,
}

impl ParsedProperties {
    /// The declared location scoped to `category`, if any.
    pub fn location_for(&self, category: UserCategory) -> Option<&str> {
        match category {
            UserCategory::Tenant => self.rental_location.as_deref(),
            UserCategory::Investor => self.investor_location.as_deref(),
            UserCategory::OwnerOccupier => self.owner_occupier_location.as_deref(),
        }
    }
}

/// Known misspellings mapped to their canonical suburb names.
const LOCATION_ALIASES: &[(&str, &str)] = &[
    ("woollongong", "wollongong"),
    ("woolongong", "wollongong"),
    ("wollongog", "wollongong"),
    ("shell harbour", "shellharbour"),
    ("kiama downs", "kiama"),
];

/// Extract typed session fields from a declared property bag.
///
/// Keys are matched case-insensitively after trimming; values are
/// stringified (strings trimmed, numbers and booleans rendered, anything
/// else skipped).
pub fn parse_properties(props: &Map<String, Value>) -> ParsedProperties {
    let mut normalized: HashMap<String, String> = HashMap::new();
    for (key, value) in props {
        if let Some(text) = value_to_string(value) {
            if !text.is_empty() {
                normalized.insert(key.trim().to_lowercase(), text);
            }
        }
    }

    ParsedProperties {
        user_category: normalized
            .get("typeuser")
            .and_then(|v| v.parse::<UserCategory>().ok()),
        raw_rating: normalized.get("rating").cloned(),
        feedback: normalized.get("feedback").cloned(),
        rental_location: normalized.get("rentallocation").map(|v| normalize_location(v)),
        investor_location: normalized
            .get("investorlocation")
            .map(|v| normalize_location(v)),
        owner_occupier_location: normalized
            .get("owneroccupierlocation")
            .map(|v| normalize_location(v)),
    }
}

/// Lowercase, trim, and run a location value through the alias table.
pub fn normalize_location(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    for (alias, canonical) in LOCATION_ALIASES {
        if lowered == *alias {
            return (*canonical).to_string();
        }
    }
    lowered
}

static FIRST_INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

/// Best-effort extraction of a 1-5 satisfaction rating from a raw value.
///
/// Takes the first embedded integer. Values in [1,5] are accepted as-is;
/// values in [1,100] are treated as a percentage and rescaled to the nearest
/// integer in [1,5]. Anything else fails extraction. This is a heuristic,
/// not a guaranteed-correct parse.
pub fn extract_rating(raw: &str) -> Option<i32> {
    let matched = FIRST_INTEGER.find(raw)?;
    let n: i64 = matched.as_str().parse().ok()?;

    if (1..=5).contains(&n) {
        return Some(n as i32);
    }
    if (1..=100).contains(&n) {
        let rescaled = ((n as f64 / 100.0) * 5.0).round() as i64;
        if (1..=5).contains(&rescaled) {
            return Some(rescaled as i32);
        }
    }
    None
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
