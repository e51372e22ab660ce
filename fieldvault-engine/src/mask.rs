//! Display-value masking.
//!
//! Masked values are one-way display placeholders; the recoverable value
//! lives encrypted under `original_attributes`.

use serde_json::Value;

/// Masks a display value.
///
/// Email-shaped strings keep their domain, with the local part replaced
/// by `*` repeated to its length. Everything else becomes `*` repeated
/// to the stringified length.
pub fn mask_value(value: &Value) -> Value {
    let masked = match value {
        Value::String(s) => mask_string(s),
        other => "*".repeat(other.to_string().chars().count()),
    };
    Value::String(masked)
}

fn mask_string(s: &str) -> String {
    match split_email(s) {
        Some((local, domain)) => format!("{}@{}", "*".repeat(local.chars().count()), domain),
        None => "*".repeat(s.chars().count()),
    }
}

// Email-shaped: non-empty local part, one `@`, dotted domain, no
// whitespace. Deliverability is not this module's concern.
fn split_email(s: &str) -> Option<(&str, &str)> {
    let (local, domain) = s.split_once('@')?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return None;
    }
    if s.contains(char::is_whitespace) {
        return None;
    }
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return None;
    }
    Some((local, domain))
}
