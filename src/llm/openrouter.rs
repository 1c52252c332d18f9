//! OpenRouter (OpenAI-compatible) chat-completion client.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use anyhow::Result;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, info};

use super::{build_http_client, check_error_response, ClientMetadata, CompletionClient};
use crate::generation::error::GenerateError;
use crate::generation::request::ChatRequest;

/// Default OpenRouter API base URL.
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";

/// Attribution headers OpenRouter uses for app rankings.
const REFERER: &str = "https://commitdiff.dev";
const APP_TITLE: &str = "CommitDiff";

/// Chat-completion response choice.
#[derive(Deserialize, Debug)]
struct Choice {
    message: ResponseMessage,
    #[allow(dead_code)]
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ResponseMessage {
    content: Option<String>,
}

/// Chat-completion response envelope.
#[derive(Deserialize, Debug)]
struct CompletionResponse {
    choices: Vec<Choice>,
    model: Option<String>,
    usage: Option<Usage>,
}

#[derive(Deserialize, Debug)]
#[allow(dead_code)]
struct Usage {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
    total_tokens: Option<u32>,
}

/// OpenRouter chat-completion client holding the server-side credential.
pub struct OpenRouterClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl fmt::Debug for OpenRouterClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenRouterClient")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl OpenRouterClient {
    /// Creates a client for the given credential, model, and API base URL.
    pub fn new(api_key: String, model: String, base_url: String) -> Result<Self> {
        Ok(Self {
            client: build_http_client()?,
            api_key,
            model,
            base_url,
        })
    }

    /// Full chat-completions URL.
    fn get_api_url(&self) -> String {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        debug!(base_url = %self.base_url, full_url = %url, "Constructed chat completions URL");
        url
    }
}

impl CompletionClient for OpenRouterClient {
    fn complete<'a>(
        &'a self,
        request: &'a ChatRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String, GenerateError>> + Send + 'a>> {
        Box::pin(async move {
            let api_url = self.get_api_url();
            info!(url = %api_url, model = %request.model, "Sending request to OpenRouter");

            let response = self
                .client
                .post(&api_url)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("HTTP-Referer", REFERER)
                .header("X-Title", APP_TITLE)
                .json(request)
                .send()
                .await
                .map_err(|e| {
                    error!(error = %e, "OpenRouter request failed before a response");
                    GenerateError::Upstream {
                        status: None,
                        body: e.to_string(),
                    }
                })?;

            let response = check_error_response(response).await.inspect_err(|e| {
                if let GenerateError::Upstream { status, body } = e {
                    error!(status = ?status, body = %body, "OpenRouter API error");
                }
            })?;

            let completion: CompletionResponse = response
                .json()
                .await
                .map_err(|e| GenerateError::Parse(format!("invalid completion envelope: {e}")))?;

            debug!(
                choice_count = completion.choices.len(),
                model = ?completion.model,
                usage = ?completion.usage,
                "Received OpenRouter response"
            );

            let content = completion
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message.content)
                .ok_or_else(|| GenerateError::Parse("no message content in response".to_string()))?;

            debug!(response_len = content.len(), "Extracted completion content");
            Ok(content)
        })
    }

    fn get_metadata(&self) -> ClientMetadata {
        ClientMetadata {
            provider: "OpenRouter".to_string(),
            model: self.model.clone(),
        }
    }
}
