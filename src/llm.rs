//! Upstream LLM completion clients.

pub mod openrouter;
#[cfg(test)]
pub(crate) mod test_utils;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;

use crate::generation::error::GenerateError;
use crate::generation::request::ChatRequest;

pub use openrouter::OpenRouterClient;

/// HTTP request timeout for upstream completion calls.
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Metadata about a completion client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientMetadata {
    /// Service provider name.
    pub provider: String,
    /// Model identifier sent with every request.
    pub model: String,
}

/// Builds an HTTP client with the standard request timeout.
pub(crate) fn build_http_client() -> Result<Client> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")
}

/// Checks an HTTP response for error status.
///
/// On failure the body is captured for diagnostics and returned as
/// [`GenerateError::Upstream`]; it is never forwarded to callers.
pub(crate) async fn check_error_response(
    response: reqwest::Response,
) -> Result<reqwest::Response, GenerateError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_else(|e| {
        tracing::debug!("Failed to read error response body: {e}");
        String::new()
    });
    Err(GenerateError::Upstream {
        status: Some(status.as_u16()),
        body,
    })
}

/// Trait for chat-completion services.
///
/// One call, one attempt: implementations must not retry.
pub trait CompletionClient: Send + Sync {
    /// Sends the request and returns the assistant message content.
    fn complete<'a>(
        &'a self,
        request: &'a ChatRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String, GenerateError>> + Send + 'a>>;

    /// Returns metadata about the client implementation.
    fn get_metadata(&self) -> ClientMetadata;
}
