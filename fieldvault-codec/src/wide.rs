//! Wide codec for opaque payload encryption.
//!
//! Every supported value gains a type tag before encryption, so the
//! decrypted string can be decoded back to its original type without any
//! out-of-band schema. Used by the payload encryption helpers, not by the
//! per-field document engine (which uses [`crate::narrow`]).

use crate::date::parse_json_with_dates;
use crate::error::{CodecError, CodecResult};
use crate::narrow::parse_number;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// A decoded payload value.
///
/// `Json` holds object or array trees; scalars use the dedicated
/// variants. Dates are first-class here even though JSON trees cannot
/// carry them.
#[derive(Clone, Debug, PartialEq)]
pub enum PlainValue {
    /// A UTF-8 string.
    String(String),
    /// A number (integer representations are preserved).
    Number(serde_json::Number),
    /// A boolean.
    Bool(bool),
    /// A timezone-aware date-time.
    Date(DateTime<Utc>),
    /// An object or array tree.
    Json(Value),
}

impl PlainValue {
    /// Converts into a `serde_json::Value`, rendering dates as RFC 3339
    /// UTC strings.
    pub fn into_value(self) -> Value {
        match self {
            PlainValue::String(s) => Value::String(s),
            PlainValue::Number(n) => Value::Number(n),
            PlainValue::Bool(b) => Value::Bool(b),
            PlainValue::Date(d) => Value::String(d.to_rfc3339()),
            PlainValue::Json(v) => v,
        }
    }
}

/// Encodes a value into its tagged string representation.
///
/// Fails with [`CodecError::UnsupportedType`] for values that have no
/// tag: JSON null and scalar values wrapped in `Json` (scalars must use
/// their dedicated variants).
pub fn encode(value: &PlainValue) -> CodecResult<String> {
    match value {
        PlainValue::String(s) => Ok(format!("s:{s}")),
        PlainValue::Number(n) => Ok(format!("n:{n}")),
        PlainValue::Bool(b) => Ok(format!("b:{b}")),
        PlainValue::Date(d) => Ok(format!("d:{}", d.to_rfc3339())),
        PlainValue::Json(v) if v.is_object() || v.is_array() => {
            Ok(format!("o:{}", serde_json::to_string(v)?))
        }
        PlainValue::Json(Value::Null) => Err(CodecError::UnsupportedType("null")),
        PlainValue::Json(_) => Err(CodecError::UnsupportedType("scalar in Json variant")),
    }
}

/// Decodes a tagged string produced by [`encode`].
///
/// Untagged input (no `:` in the second position) is returned as a plain
/// string; an unknown tag is an error. `o:` payloads are re-parsed as
/// JSON with date-looking strings re-hydrated to canonical RFC 3339 UTC,
/// recursively.
pub fn decode(encoded: &str) -> CodecResult<PlainValue> {
    if encoded.as_bytes().get(1) != Some(&b':') {
        return Ok(PlainValue::String(encoded.to_string()));
    }
    let (tag, payload) = (&encoded[..2], &encoded[2..]);
    match tag {
        "s:" => Ok(PlainValue::String(payload.to_string())),
        "n:" => match parse_number(payload) {
            Some(Value::Number(n)) => Ok(PlainValue::Number(n)),
            _ => Err(CodecError::InvalidPayload {
                expected: "number",
                payload: payload.to_string(),
            }),
        },
        "b:" => Ok(PlainValue::Bool(payload == "true")),
        "d:" => DateTime::parse_from_rfc3339(payload)
            .map(|d| PlainValue::Date(d.with_timezone(&Utc)))
            .map_err(|_| CodecError::InvalidPayload {
                expected: "date",
                payload: payload.to_string(),
            }),
        "o:" => Ok(PlainValue::Json(parse_json_with_dates(payload)?)),
        other => Err(CodecError::UnknownTag(other.to_string())),
    }
}
