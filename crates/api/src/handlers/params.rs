//! Loosely typed JSON body access.
//!
//! The editor posts ids and coordinates either as numbers or as numeric
//! strings, so the media handlers read their bodies as `serde_json::Value`
//! and pull fields out through these helpers.

use clipstudio_core::delegate::{form_value, integer_value};
use clipstudio_core::error::CoreError;
use clipstudio_core::types::DbId;
use serde_json::Value;

use crate::error::AppError;

/// Integer id at `field`; `message` is the 400 text when absent or malformed.
pub(crate) fn require_id(body: &Value, field: &str, message: &str) -> Result<DbId, AppError> {
    body.get(field)
        .and_then(integer_value)
        .ok_or_else(|| validation(message))
}

/// Scalar at `field` rendered as a form value.
pub(crate) fn require_value(body: &Value, field: &str, message: &str) -> Result<String, AppError> {
    optional_value(body, field).ok_or_else(|| validation(message))
}

pub(crate) fn optional_value(body: &Value, field: &str) -> Option<String> {
    body.get(field).and_then(form_value)
}

/// Checkbox-style flag: `true`, `"true"`, `1` and `"1"` are set.
pub(crate) fn flag(body: &Value, field: &str) -> bool {
    match body.get(field) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_i64() == Some(1),
        Some(Value::String(s)) => matches!(s.trim(), "true" | "1" | "on"),
        _ => false,
    }
}

pub(crate) fn validation(message: &str) -> AppError {
    AppError::Core(CoreError::Validation(message.to_string()))
}
