//! Storage escaping for criteria keys.
//!
//! Criteria keys are user-controlled and routinely contain `.` (JSON-path
//! style keys like `payload.level`) and occasionally `$`. The original
//! document store reserved both characters in field names, so keys are
//! rewritten at the storage boundary: `$` becomes U+FF04 (fullwidth dollar
//! sign) and `.` becomes U+FF0E (fullwidth full stop) on write, and the
//! inverse on read. The transform applies recursively to nested objects
//! and touches keys only, never values, so in-memory criteria round-trip
//! byte-for-byte.

use serde_json::{Map, Value};

const DOLLAR: &str = "$";
const DOT: &str = ".";
const ESCAPED_DOLLAR: &str = "\u{FF04}";
const ESCAPED_DOT: &str = "\u{FF0E}";

fn transform_keys(value: &Value, transform: &dyn Fn(&str) -> String) -> Value {
    match value {
        Value::Object(map) => {
            let mut escaped = Map::with_capacity(map.len());
            for (key, nested) in map {
                escaped.insert(transform(key), transform_keys(nested, transform));
            }
            Value::Object(escaped)
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| transform_keys(item, transform))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Rewrite reserved characters in object keys for storage.
pub fn escape_chars(value: &Value) -> Value {
    transform_keys(value, &|key| {
        key.replace(DOLLAR, ESCAPED_DOLLAR).replace(DOT, ESCAPED_DOT)
    })
}

/// Restore original object keys after reading from storage.
pub fn unescape_chars(value: &Value) -> Value {
    transform_keys(value, &|key| {
        key.replace(ESCAPED_DOLLAR, DOLLAR).replace(ESCAPED_DOT, DOT)
    })
}
