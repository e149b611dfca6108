//! Reusable field filters
//!
//! These filters transform field values before validation

use serde_json::Value;

/// Filter: trim whitespace from string
pub fn trim() -> impl Fn(&str, Value) -> Value + Send + Sync + Clone {
    |_: &str, value: Value| match value {
        Value::String(s) => Value::String(s.trim().to_string()),
        other => other,
    }
}

/// Filter: convert string to lowercase
pub fn lowercase() -> impl Fn(&str, Value) -> Value + Send + Sync + Clone {
    |_: &str, value: Value| match value {
        Value::String(s) => Value::String(s.to_lowercase()),
        other => other,
    }
}

/// Filter: treat an empty string as an absent value
pub fn blank_as_null() -> impl Fn(&str, Value) -> Value + Send + Sync + Clone {
    |_: &str, value: Value| match value {
        Value::String(s) if s.is_empty() => Value::Null,
        other => other,
    }
}
