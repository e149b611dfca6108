//! Reusable field validators
//!
//! A validator receives the field name and its (already filtered) JSON value
//! and returns a human-readable message on failure. Absent fields arrive as
//! `Value::Null`; every validator except [`required`] lets null through.

use serde_json::Value;

/// Validator: field is required (not null)
pub fn required() -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    |field: &str, value: &Value| {
        if value.is_null() {
            Err(format!("'{}' is required", field))
        } else {
            Ok(())
        }
    }
}

/// Validator: value must be a string
pub fn string() -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    |field: &str, value: &Value| {
        if value.is_null() || value.is_string() {
            Ok(())
        } else {
            Err(format!("'{}' must be a string", field))
        }
    }
}

/// Validator: string must not be empty
pub fn non_empty() -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    |field: &str, value: &Value| match value.as_str() {
        Some("") => Err(format!("'{}' must not be empty", field)),
        _ => Ok(()),
    }
}

/// Validator: value must be a JSON number
///
/// Numeric strings are rejected: the wire contract requires a number.
pub fn number() -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    |field: &str, value: &Value| {
        if value.is_null() || value.is_number() {
            Ok(())
        } else {
            Err(format!("'{}' must be a number (got {})", field, value))
        }
    }
}

/// Validator: number must be zero or greater
pub fn non_negative() -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    |field: &str, value: &Value| match value.as_f64() {
        Some(num) if num < 0.0 => Err(format!(
            "'{}' must not be negative (value: {})",
            field, num
        )),
        _ => Ok(()),
    }
}

/// Validator: value must be in allowed list
pub fn in_list(
    allowed: &'static [&'static str],
) -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    move |field: &str, value: &Value| match value.as_str() {
        Some(s) if !allowed.contains(&s) => Err(format!(
            "'{}' must be one of {:?} (value: {})",
            field, allowed, s
        )),
        _ => Ok(()),
    }
}

/// Validator: date must match format
pub fn date_format(
    format: &'static str,
) -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    move |field: &str, value: &Value| {
        if let Some(s) = value.as_str() {
            match chrono::NaiveDate::parse_from_str(s, format) {
                Ok(_) => Ok(()),
                Err(_) => Err(format!(
                    "'{}' must use the format {} (value: {})",
                    field, format, s
                )),
            }
        } else {
            Ok(())
        }
    }
}
