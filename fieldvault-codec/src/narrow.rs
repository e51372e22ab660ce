//! Narrow codec for DB-native field transforms.
//!
//! Tags only numbers (`n:`) and booleans (`b:`) so that typed values
//! survive the string-only ciphertext round trip. Strings pass through
//! untagged; a plaintext string that happens to begin with a known tag is
//! indistinguishable from tagged data (no escaping scheme is defined, an
//! accepted ambiguity).

use serde_json::Value;

/// Encodes a scalar field value for encryption.
///
/// Numbers and booleans gain a two-character type tag; strings are
/// returned as-is. Containers and null never reach the codec (the walker
/// descends into containers and skips null leaves).
pub fn encode(value: &Value) -> String {
    match value {
        Value::Number(n) => format!("n:{n}"),
        Value::Bool(b) => format!("b:{b}"),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Decodes a value previously produced by [`encode`].
///
/// Inspects the first two characters; input without a known tag is
/// returned unchanged as a string. A tagged payload that fails to parse
/// is also returned unchanged rather than corrupted.
pub fn decode(encoded: &str) -> Value {
    let Some((tag, rest)) = split_tag(encoded) else {
        return Value::String(encoded.to_string());
    };
    match tag {
        "n:" => parse_number(rest).unwrap_or_else(|| Value::String(encoded.to_string())),
        "b:" => Value::Bool(rest == "true"),
        _ => Value::String(encoded.to_string()),
    }
}

/// Recursively decodes every string leaf of a document tree in place.
///
/// Applied to query projections so that typed numbers and booleans are
/// restored without a full decryption pass. Non-string leaves and null
/// are left untouched.
pub fn decode_tree(value: &mut Value) {
    match value {
        Value::String(s) => *value = decode(s),
        Value::Array(items) => items.iter_mut().for_each(decode_tree),
        Value::Object(map) => map.values_mut().for_each(decode_tree),
        _ => {}
    }
}

// A `:` at byte 1 implies both bytes are ASCII, so the slices below are
// valid UTF-8 boundaries.
fn split_tag(encoded: &str) -> Option<(&str, &str)> {
    if encoded.as_bytes().get(1) == Some(&b':') {
        Some((&encoded[..2], &encoded[2..]))
    } else {
        None
    }
}

/// Parses a numeric payload, preferring integer representations so that
/// integers round-trip without becoming floats.
pub(crate) fn parse_number(payload: &str) -> Option<Value> {
    if let Ok(i) = payload.parse::<i64>() {
        return Some(Value::from(i));
    }
    if let Ok(u) = payload.parse::<u64>() {
        return Some(Value::from(u));
    }
    payload
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
}
