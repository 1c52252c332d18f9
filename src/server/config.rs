//! Relay server configuration.

use std::fmt;

use url::Url;

use crate::generation::GenerateError;
use crate::llm::openrouter::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::utils::settings::{get_env_var, get_env_var_or};

/// Environment variable holding the upstream credential.
pub const API_KEY_VAR: &str = "OPENROUTER_API_KEY";

/// Settings the relay needs before it can serve requests.
#[derive(Clone)]
pub struct ServerConfig {
    /// Upstream credential. Never logged.
    pub api_key: String,
    /// Upstream model identifier.
    pub model: String,
    /// Upstream API base URL.
    pub base_url: String,
    /// Shared rate-limit store, if configured.
    pub redis_url: Option<String>,
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("redis_url", &self.redis_url.as_ref().map(|_| "<set>"))
            .finish()
    }
}

impl ServerConfig {
    /// Reads configuration from the environment (with settings-file fallback).
    ///
    /// A missing credential is fatal for the process; there is no built-in
    /// fallback key.
    pub fn from_env() -> Result<Self, GenerateError> {
        let api_key = get_env_var(API_KEY_VAR)
            .map_err(|_| GenerateError::Configuration(format!("{API_KEY_VAR} is not set")))?;

        let base_url = get_env_var_or("OPENROUTER_BASE_URL", DEFAULT_BASE_URL);
        Url::parse(&base_url).map_err(|e| {
            GenerateError::Configuration(format!("OPENROUTER_BASE_URL is invalid: {e}"))
        })?;

        Ok(Self {
            api_key,
            model: get_env_var_or("OPENROUTER_MODEL", DEFAULT_MODEL),
            base_url,
            redis_url: get_env_var("REDIS_URL").ok(),
        })
    }
}
