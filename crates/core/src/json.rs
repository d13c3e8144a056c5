//! Helpers for navigating the keyed (JSON) payloads

use serde_json::Value;

use crate::error::DecodeError;

/// Lowest `RESULT.STATUS` value the API uses for errors
pub(crate) const ERROR_STATUS_FLOOR: u32 = 100;

/// Status meaning "completed normally, but no matching data"
pub(crate) const STATUS_NO_DATA: u32 = 1;

pub(crate) fn status_to_result(status: Option<u32>, message: &str) -> Result<(), DecodeError> {
    match status {
        Some(status) if status >= ERROR_STATUS_FLOOR => Err(DecodeError::Api {
            status,
            message: message.trim().to_string(),
        }),
        _ => Ok(()),
    }
}

/// Follow `keys` from `root`, failing with the dotted path walked so far
pub(crate) fn descend<'a>(root: &'a Value, keys: &[&str]) -> Result<&'a Value, DecodeError> {
    let mut current = root;
    for (i, key) in keys.iter().enumerate() {
        current = current
            .get(key)
            .ok_or_else(|| DecodeError::MissingField(keys[..=i].join(".")))?;
    }
    Ok(current)
}

/// Records may be a single object or an array of objects
pub(crate) fn one_or_many<'a>(value: &'a Value, path: &str) -> Result<Vec<&'a Value>, DecodeError> {
    match value {
        Value::Object(_) => Ok(vec![value]),
        Value::Array(items) => {
            if let Some(bad) = items.iter().find(|v| !v.is_object()) {
                return Err(DecodeError::Shape {
                    path: path.to_string(),
                    detail: format!("expected objects, found {bad}"),
                });
            }
            Ok(items.iter().collect())
        }
        Value::Null => Ok(Vec::new()),
        other => Err(DecodeError::Shape {
            path: path.to_string(),
            detail: format!("expected object or array, found {other}"),
        }),
    }
}

/// Display text of a scalar, or of the `$` member of an object
pub(crate) fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Object(map) => map.get("$").map(text_of).unwrap_or_default(),
        Value::Null | Value::Array(_) => String::new(),
    }
}

/// `RESULT.STATUS` under the given envelope, checked for API errors
pub(crate) fn check_result(envelope: &Value) -> Result<Option<u32>, DecodeError> {
    let Some(result) = envelope.get("RESULT") else {
        return Ok(None);
    };
    let status = result.get("STATUS").and_then(|s| match s {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    });
    let message = result.get("ERROR_MSG").map(text_of).unwrap_or_default();

    status_to_result(status, &message)?;
    Ok(status)
}
