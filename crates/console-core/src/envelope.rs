//! Response normalization
//!
//! The backend answers with either a bare JSON body or a
//! `{ success, data, message }` envelope, depending on the endpoint. Every
//! response goes through [`normalize`] before it reaches typed code.

use crate::error::{ConsoleError, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Keys an envelope object may carry besides `data`
const ENVELOPE_KEYS: [&str; 6] = ["success", "data", "message", "count", "total", "error"];

/// Unwrap an envelope if present, leaving bare bodies untouched
///
/// `success: false` becomes [`ConsoleError::Rejected`] with the envelope's
/// message. An envelope without `data` unwraps to `null`.
pub fn unwrap_envelope(body: Value) -> Result<Value> {
    let Value::Object(mut map) = body else {
        return Ok(body);
    };

    let has_success = matches!(map.get("success"), Some(Value::Bool(_)));
    let only_envelope_keys = map.contains_key("data")
        && map.keys().all(|k| ENVELOPE_KEYS.contains(&k.as_str()));

    if !has_success && !only_envelope_keys {
        return Ok(Value::Object(map));
    }

    if map.get("success") == Some(&Value::Bool(false)) {
        let message = message_of(&Value::Object(map.clone()))
            .unwrap_or_else(|| "request was not successful".to_string());
        return Err(ConsoleError::Rejected(message));
    }

    Ok(map.remove("data").unwrap_or(Value::Null))
}

/// Normalize a response body into `T`
pub fn normalize<T: DeserializeOwned>(body: Value) -> Result<T> {
    let data = unwrap_envelope(body)?;
    serde_json::from_value(data).map_err(ConsoleError::from)
}

/// Normalize a list response
///
/// Tolerates `null` as an empty list.
pub fn normalize_list<T: DeserializeOwned>(body: Value) -> Result<Vec<T>> {
    match unwrap_envelope(body)? {
        Value::Null => Ok(Vec::new()),
        data @ Value::Array(_) => serde_json::from_value(data).map_err(ConsoleError::from),
        other => Err(ConsoleError::InvalidResponse(format!(
            "expected a list, got {}",
            type_name(&other)
        ))),
    }
}

/// Extract a human message from an error body
///
/// Looks at `message`, then `error` (string or `{ message }`).
#[must_use]
pub fn message_of(body: &Value) -> Option<String> {
    if let Some(msg) = body.get("message").and_then(Value::as_str) {
        return Some(msg.to_string());
    }
    match body.get("error") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(inner @ Value::Object(_)) => message_of(inner),
        _ => None,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
