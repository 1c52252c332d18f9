//! Diff validation.

use serde_json::Value;

use super::error::ValidationError;

/// Size ceiling enforced by the size-capped entry point, in characters.
pub const MAX_DIFF_CHARS: usize = 50_000;

/// Extracts and validates the `diff` field of a request body.
///
/// Length is measured in Unicode scalar values, not bytes.
pub fn validate_request(body: &Value, max_chars: Option<usize>) -> Result<&str, ValidationError> {
    let object = body.as_object().ok_or(ValidationError::MalformedBody)?;
    validate_diff(object.get("diff"), max_chars)
}

/// Validates a single diff value.
pub fn validate_diff(value: Option<&Value>, max_chars: Option<usize>) -> Result<&str, ValidationError> {
    let diff = match value {
        None | Some(Value::Null) => return Err(ValidationError::Missing),
        Some(Value::String(diff)) => diff.as_str(),
        Some(_) => return Err(ValidationError::NotAString),
    };

    if diff.trim().is_empty() {
        return Err(ValidationError::Missing);
    }

    if let Some(max) = max_chars {
        // Cheap byte check first; chars <= bytes.
        if diff.len() > max {
            let len = diff.chars().count();
            if len > max {
                return Err(ValidationError::TooLarge { len, max });
            }
        }
    }

    Ok(diff)
}
