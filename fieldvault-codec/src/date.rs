//! Date detection and re-hydration for JSON payloads.
//!
//! JSON trees carry no native date type, so dates decoded out of an `o:`
//! payload are normalized to canonical RFC 3339 UTC strings. A string is
//! date-looking when it contains the shape `YYYY-MM-DDTHH:MM:SS` anywhere.

use crate::error::CodecResult;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Returns true when `s` contains an ISO-8601 date-time shape
/// (`\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}`) at any position.
pub fn looks_like_datetime(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() < DATETIME_SHAPE.len() {
        return false;
    }
    (0..=bytes.len() - DATETIME_SHAPE.len()).any(|i| matches_shape(&bytes[i..]))
}

// 'd' = ASCII digit, anything else matches itself.
const DATETIME_SHAPE: &[u8] = b"dddd-dd-ddTdd:dd:dd";

fn matches_shape(bytes: &[u8]) -> bool {
    DATETIME_SHAPE.iter().zip(bytes).all(|(pat, b)| match pat {
        b'd' => b.is_ascii_digit(),
        _ => pat == b,
    })
}

/// Recursively normalizes every date-looking string in the tree to
/// canonical RFC 3339 UTC. Strings that look like dates but fail to parse
/// as RFC 3339 are left unchanged.
pub fn rehydrate_dates(value: &mut Value) {
    match value {
        Value::String(s) if looks_like_datetime(s) => {
            if let Ok(parsed) = DateTime::parse_from_rfc3339(s) {
                *s = parsed.with_timezone(&Utc).to_rfc3339();
            }
        }
        Value::Array(items) => items.iter_mut().for_each(rehydrate_dates),
        Value::Object(map) => map.values_mut().for_each(rehydrate_dates),
        _ => {}
    }
}

/// Parses a JSON document, re-hydrating date-looking strings anywhere in
/// the resulting tree.
pub fn parse_json_with_dates(payload: &str) -> CodecResult<Value> {
    let mut value: Value = serde_json::from_str(payload)?;
    rehydrate_dates(&mut value);
    Ok(value)
}
