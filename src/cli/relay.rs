//! HTTP client for a commitdiff relay.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::generation::normalize::{normalize_value, CommitMessage};
use crate::utils::check_relay_endpoint;

/// Public relay used when no endpoint is configured.
pub const DEFAULT_ENDPOINT: &str = "https://commitdiff.vercel.app/api/cli-generate";

const RELAY_TIMEOUT: Duration = Duration::from_secs(120);

/// Source of generated commit messages.
pub trait MessageSource: Send + Sync {
    /// Generates a commit message for `diff`.
    fn generate<'a>(
        &'a self,
        diff: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<CommitMessage>> + Send + 'a>>;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    diff: &'a str,
}

#[derive(Deserialize)]
struct RelayError {
    error: Option<String>,
}

/// Calls a relay's generation endpoint.
///
/// The endpoint is checked when a message is requested, so a repository with
/// nothing staged is reported before a misconfigured endpoint.
pub struct RelayClient {
    client: Client,
    endpoint: String,
}

impl RelayClient {
    /// Creates a client for `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let endpoint = endpoint.into();
        let client = Client::builder()
            .timeout(RELAY_TIMEOUT)
            .user_agent(concat!("commitdiff/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, endpoint })
    }

    async fn request(&self, diff: &str) -> Result<CommitMessage> {
        let url = check_relay_endpoint(&self.endpoint)?;
        debug!(endpoint = %url, diff_len = diff.len(), "Posting diff to relay");

        let response = self
            .client
            .post(url)
            .json(&GenerateRequest { diff })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<RelayError>()
                .await
                .ok()
                .and_then(|body| body.error)
                .filter(|error| !error.trim().is_empty())
                .unwrap_or_else(|| format!("API error: {}", status.as_u16()));
            return Err(anyhow!(message));
        }

        let body: Value = response
            .json()
            .await
            .context("Relay returned an invalid response")?;
        Ok(normalize_value(&body))
    }
}

impl MessageSource for RelayClient {
    fn generate<'a>(
        &'a self,
        diff: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<CommitMessage>> + Send + 'a>> {
        Box::pin(async move {
            self.request(diff)
                .await
                .context("Failed to generate commit message")
        })
    }
}
