//! Upstream chat-completion request construction.

use serde::Serialize;

/// Fixed persona instructions sent as the system turn.
pub const SYSTEM_PROMPT: &str = r#"You are a senior software engineer.
Analyze the provided git diff and generate:
1. A concise, professional git commit title.
2. A short bullet-point summary of the changes.

Follow conventional commit style when possible.
Avoid vague phrases like "update stuff".
Output in JSON with fields: title, summary."#;

/// Sampling temperature for every generation request.
pub const TEMPERATURE: f32 = 0.7;

/// Role of a chat turn.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Persona and output-format instructions.
    System,
    /// The caller's request.
    User,
}

/// A single role-tagged chat turn.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ChatMessage {
    /// Who is speaking.
    pub role: Role,
    /// Turn text.
    pub content: String,
}

/// Output format directive.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ResponseFormat {
    /// Always `json_object`.
    #[serde(rename = "type")]
    pub format_type: &'static str,
}

/// Chat-completion request body.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ChatRequest {
    /// Upstream model identifier.
    pub model: String,
    /// System turn followed by the user turn.
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature.
    pub temperature: f32,
    /// Requests a JSON object as the message content.
    pub response_format: ResponseFormat,
}

/// Builds the user turn for a diff.
#[must_use]
pub fn user_prompt(diff: &str) -> String {
    format!("Generate a commit message for this diff:\n\n{diff}")
}

/// Builds the request sent upstream for one diff.
#[must_use]
pub fn build_request(model: &str, diff: &str) -> ChatRequest {
    ChatRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage {
                role: Role::System,
                content: SYSTEM_PROMPT.to_string(),
            },
            ChatMessage {
                role: Role::User,
                content: user_prompt(diff),
            },
        ],
        temperature: TEMPERATURE,
        response_format: ResponseFormat {
            format_type: "json_object",
        },
    }
}
