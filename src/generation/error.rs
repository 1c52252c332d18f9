//! Error taxonomy for the generation pipeline.

use thiserror::Error;

/// Reasons a submitted diff is rejected before any network cost is incurred.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The request body was not a JSON object.
    #[error("Invalid request body")]
    MalformedBody,

    /// The request body exceeded the entry point's byte limit.
    #[error("Request body too large")]
    BodyTooLarge,

    /// The `diff` field is absent, null, empty, or whitespace only.
    #[error("Invalid diff provided")]
    Missing,

    /// The `diff` field is present but is not a string.
    #[error("Invalid diff provided")]
    NotAString,

    /// The diff exceeds the entry point's size ceiling.
    #[error("Diff too large (max {max} characters)")]
    TooLarge {
        /// Length of the submitted diff, in characters.
        len: usize,
        /// Configured ceiling, in characters.
        max: usize,
    },
}

/// Errors raised while turning a diff into a commit message.
#[derive(Error, Debug)]
pub enum GenerateError {
    /// The submitted diff failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The caller exceeded its sliding-window allowance.
    #[error("Too many requests. Please try again later.")]
    RateLimited,

    /// The shared rate-limit store could not be reached.
    #[error("Rate limiter unavailable: {0}")]
    RateLimitStore(String),

    /// The upstream LLM service failed or answered with a non-success status.
    #[error("Upstream request failed{}: {body}", describe_status(.status))]
    Upstream {
        /// Upstream HTTP status, when a response was received at all.
        status: Option<u16>,
        /// Upstream error body or transport error text, for diagnostics only.
        body: String,
    },

    /// The upstream content could not be parsed as JSON.
    #[error("Failed to parse model output: {0}")]
    Parse(String),

    /// Required server configuration is missing.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

fn describe_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" with HTTP {s}")).unwrap_or_default()
}

impl GenerateError {
    /// HTTP status reported to the caller for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(ValidationError::BodyTooLarge) => 413,
            Self::Validation(_) => 400,
            Self::RateLimited => 429,
            Self::RateLimitStore(_) => 503,
            // Upstream 5xx statuses pass through; anything else (including
            // credential rejections) is our gateway's fault, not the caller's.
            Self::Upstream {
                status: Some(status),
                ..
            } if (500..600).contains(status) => *status,
            Self::Upstream { .. } => 502,
            Self::Parse(_) | Self::Configuration(_) => 500,
        }
    }

    /// Message safe to show the caller.
    ///
    /// Upstream bodies and parse details stay in the server logs.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation(err) => err.to_string(),
            Self::RateLimited => self.to_string(),
            Self::RateLimitStore(_) => "Rate limiter unavailable".to_string(),
            Self::Upstream { .. } => "Failed to generate commit message".to_string(),
            Self::Parse(_) | Self::Configuration(_) => "Internal server error".to_string(),
        }
    }
}
