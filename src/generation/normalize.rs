//! Defensive extraction of `{title, summary}` from model output.
//!
//! The model is instructed, not guaranteed, to use the exact field names. Each
//! output field is therefore resolved from an ordered list of accepted keys,
//! falling back to a fixed default so the result shape always holds.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::GenerateError;

/// A generated commit message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitMessage {
    /// One-line commit title.
    pub title: String,
    /// Bullet-point summary of the change.
    pub summary: String,
}

/// Ordered key synonyms for one output field plus its default.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    /// Keys tried in order.
    pub keys: &'static [&'static str],
    /// Used when no key yields a usable value.
    pub default: &'static str,
}

/// Resolution rule for `title`.
pub const TITLE_RULE: FieldRule = FieldRule {
    keys: &["title", "message"],
    default: "Update code",
};

/// Resolution rule for `summary`.
pub const SUMMARY_RULE: FieldRule = FieldRule {
    keys: &["summary", "description"],
    default: "No summary available",
};

impl FieldRule {
    /// Returns the first usable value among the rule's keys, or the default.
    #[must_use]
    pub fn resolve(&self, object: Option<&Map<String, Value>>) -> String {
        object
            .and_then(|object| {
                self.keys
                    .iter()
                    .find_map(|key| object.get(*key).and_then(text_value))
            })
            .unwrap_or_else(|| self.default.to_string())
    }
}

/// Parses the upstream message content and normalizes it.
///
/// Unparseable content is a hard error: no safe default can be synthesized
/// from output that is not JSON at all.
pub fn normalize_content(content: &str) -> Result<CommitMessage, GenerateError> {
    let value: Value =
        serde_json::from_str(content).map_err(|e| GenerateError::Parse(e.to_string()))?;
    Ok(normalize_value(&value))
}

/// Normalizes an already-parsed JSON value.
#[must_use]
pub fn normalize_value(value: &Value) -> CommitMessage {
    let object = value.as_object();
    CommitMessage {
        title: TITLE_RULE.resolve(object),
        summary: SUMMARY_RULE.resolve(object),
    }
}

fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Array(items) => {
            let lines: Vec<String> = items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(bullet)
                .collect();
            (!lines.is_empty()).then(|| lines.join("\n"))
        }
        _ => None,
    }
}

fn bullet(item: &str) -> String {
    if item.starts_with("- ") || item.starts_with("* ") || item.starts_with("• ") {
        item.to_string()
    } else {
        format!("- {item}")
    }
}
