//! Diff-to-commit-message generation pipeline.
//!
//! One [`GenerationService`] serves every entry point. Entry points differ
//! only in their [`EntryPolicy`]: an optional size ceiling and an optional
//! rate limiter. Validation and admission run before any upstream call.

pub mod error;
pub mod normalize;
pub mod request;
pub mod validate;

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::llm::CompletionClient;
use crate::rate_limit::RateLimiter;

pub use error::{GenerateError, ValidationError};
pub use normalize::CommitMessage;
pub use validate::MAX_DIFF_CHARS;

/// Validation-and-admission policy applied by one entry point.
#[derive(Clone)]
pub struct EntryPolicy {
    /// Name used in logs.
    pub name: &'static str,
    /// Maximum diff length in characters, if any.
    pub max_diff_chars: Option<usize>,
    /// Admission control, if any.
    pub limiter: Option<RateLimiter>,
}

impl EntryPolicy {
    /// Rate-limited relay used by the command-line client. No size ceiling.
    pub fn rate_limited(limiter: RateLimiter) -> Self {
        Self {
            name: "cli-generate",
            max_diff_chars: None,
            limiter: Some(limiter),
        }
    }

    /// Size-capped relay used by the web front end. No rate limiting.
    pub fn size_capped() -> Self {
        Self {
            name: "generate",
            max_diff_chars: Some(MAX_DIFF_CHARS),
            limiter: None,
        }
    }
}

/// Orchestrates validation, admission, the upstream call, and normalization.
#[derive(Clone)]
pub struct GenerationService {
    client: Arc<dyn CompletionClient>,
}

impl GenerationService {
    /// Creates a service around a completion client.
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    /// Handles one request body under `policy` for the caller `identity`.
    #[instrument(skip_all, fields(entry = policy.name, identity = %identity))]
    pub async fn handle(
        &self,
        policy: &EntryPolicy,
        identity: &str,
        body: &Value,
    ) -> Result<CommitMessage, GenerateError> {
        let diff = validate::validate_request(body, policy.max_diff_chars)?;
        debug!(diff_len = diff.len(), "Diff validated");

        if let Some(limiter) = &policy.limiter {
            limiter.check(identity).await?;
        }

        self.generate(diff).await
    }

    /// Generates a commit message for an already-validated diff.
    pub async fn generate(&self, diff: &str) -> Result<CommitMessage, GenerateError> {
        let metadata = self.client.get_metadata();
        let request = request::build_request(&metadata.model, diff);

        let content = self.client.complete(&request).await?;
        let message = normalize::normalize_content(&content)?;

        info!(
            provider = %metadata.provider,
            model = %metadata.model,
            title = %message.title,
            "Generated commit message"
        );
        Ok(message)
    }
}
