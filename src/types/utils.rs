//! Shared utility functions for pulling typed values out of loosely-typed JSON.
//!
//! ## JSON Extraction Helpers
//!
//! Provides ergonomic helpers for extracting values from `serde_json::Value`:
//! - `json_string`, `json_string_or` - Extract strings
//! - `json_string_array` - Extract string arrays
//! - `json_i64_field`, `json_f64_field` - Extract numbers, rejecting non-numeric values
//! - `json_objects` - Extract arrays of objects

use serde_json::Value;

use super::error::{GuardError, Result};

// =============================================================================
// JSON Value Extraction Helpers
// =============================================================================

/// Extract string from JSON value by key.
///
/// Replaces verbose `v.get("key")?.as_str()?.to_string()` patterns.
#[inline]
pub fn json_string(value: &Value, key: &str) -> Option<String> {
    value.get(key)?.as_str().map(String::from)
}

/// Extract string with default value.
#[inline]
pub fn json_string_or(value: &Value, key: &str, default: &str) -> String {
    json_string(value, key).unwrap_or_else(|| default.to_string())
}

/// Extract string array from JSON value by key.
#[inline]
pub fn json_string_array(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|s| s.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

/// Extract an integer field, defaulting only when `key` is absent or null.
///
/// Models sometimes emit `75.0` or `"75"` for integer fields; both read as 75.
/// Fractional values are rounded to the nearest integer. Any other value
/// present under `key` is a malformed response naming `{scope}{key}`.
pub fn json_i64_field(value: &Value, scope: &str, key: &str, default: i64) -> Result<i64> {
    let parsed = match value.get(key) {
        None | Some(Value::Null) => return Ok(default),
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().map(|f| f.round() as i64),
        Some(_) => None,
    };
    parsed.ok_or_else(|| invalid_field(scope, key, "an integer", value.get(key)))
}

/// Extract a floating-point field, defaulting only when `key` is absent or null.
pub fn json_f64_field(value: &Value, scope: &str, key: &str, default: f64) -> Result<f64> {
    let parsed = match value.get(key) {
        None | Some(Value::Null) => return Ok(default),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        Some(_) => None,
    };
    parsed.ok_or_else(|| invalid_field(scope, key, "a number", value.get(key)))
}

fn invalid_field(scope: &str, key: &str, expected: &str, found: Option<&Value>) -> GuardError {
    let found = found.map(Value::to_string).unwrap_or_default();
    GuardError::malformed(format!(
        "field {}{} must be {}, got {}",
        scope, key, expected, found
    ))
}

/// Extract the object elements of an array field, skipping anything else.
pub fn json_objects<'a>(value: &'a Value, key: &str) -> Vec<&'a Value> {
    value
        .get(key)
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter(|v| v.is_object()).collect())
        .unwrap_or_default()
}

// =============================================================================
// Type Parsing
// =============================================================================

/// Enum fields read from model output.
///
/// An absent, null or blank field takes `default_value()`. A value outside
/// the known set is rejected rather than replaced.
pub trait ParseWithDefault: Sized {
    /// The name of this type for error messages.
    fn type_name() -> &'static str;

    /// The value used when the field is absent.
    fn default_value() -> Self;

    /// Try to parse the string, returning None if invalid.
    fn try_parse(s: &str) -> Option<Self>;

    /// Read `key` from a JSON object; `scope` prefixes the field in errors.
    fn from_json_field(value: &Value, scope: &str, key: &str) -> Result<Self> {
        match value.get(key) {
            None | Some(Value::Null) => Ok(Self::default_value()),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(Self::default_value()),
            Some(Value::String(s)) => Self::try_parse(s).ok_or_else(|| {
                GuardError::malformed(format!(
                    "field {}{} has unknown {} value '{}'",
                    scope,
                    key,
                    Self::type_name(),
                    s
                ))
            }),
            Some(other) => Err(invalid_field(scope, key, "a string", Some(other))),
        }
    }
}
