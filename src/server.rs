//! HTTP relay exposing the generation pipeline.
//!
//! Routes:
//! - `POST /api/cli-generate`: rate-limited by caller address, no size cap
//!   (the default request body limit is lifted on this route).
//! - `POST /api/generate`: size-capped, not rate-limited.
//! - `GET /health`: liveness probe.

pub mod config;

use std::sync::Arc;

use anyhow::Result;
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::generation::{EntryPolicy, GenerateError, GenerationService, ValidationError};
use crate::llm::OpenRouterClient;
use crate::rate_limit::{MemoryStore, RateLimitStore, RateLimiter, RedisStore};

pub use config::ServerConfig;

/// Identity used when no client address header is present.
///
/// Every unidentified caller shares this one bucket.
pub const LOOPBACK_SENTINEL: &str = "127.0.0.1";

/// Error envelope returned on every failure.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    /// Short human-readable message.
    pub error: String,
}

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    service: GenerationService,
    rate_limited: Arc<EntryPolicy>,
    size_capped: Arc<EntryPolicy>,
}

impl AppState {
    /// Creates state for one service and the limiter guarding the CLI entry point.
    pub fn new(service: GenerationService, limiter: RateLimiter) -> Self {
        Self {
            service,
            rate_limited: Arc::new(EntryPolicy::rate_limited(limiter)),
            size_capped: Arc::new(EntryPolicy::size_capped()),
        }
    }

    /// Builds production state from configuration.
    ///
    /// Without a Redis URL the server refuses to start unless
    /// `allow_in_memory` is set, since per-process counters do not hold
    /// across replicas.
    pub async fn from_config(config: &ServerConfig, allow_in_memory: bool) -> Result<Self> {
        let client = OpenRouterClient::new(
            config.api_key.clone(),
            config.model.clone(),
            config.base_url.clone(),
        )?;

        let store: Arc<dyn RateLimitStore> = match (&config.redis_url, allow_in_memory) {
            (Some(url), _) => Arc::new(RedisStore::connect(url).await?),
            (None, true) => {
                warn!("Using in-memory rate limiting; limits are per process");
                Arc::new(MemoryStore::new())
            }
            (None, false) => {
                return Err(GenerateError::Configuration(
                    "REDIS_URL is not set (pass --in-memory-rate-limit for local development)"
                        .to_string(),
                )
                .into())
            }
        };

        info!(model = %config.model, base_url = %config.base_url, "Relay configured");
        Ok(Self::new(
            GenerationService::new(Arc::new(client)),
            RateLimiter::new(store),
        ))
    }
}

/// Builds the relay router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/generate", post(generate))
        .route(
            "/api/cli-generate",
            post(cli_generate).layer(DefaultBodyLimit::disable()),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn generate(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    respond(&state, &state.size_capped, &headers, body).await
}

async fn cli_generate(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    respond(&state, &state.rate_limited, &headers, body).await
}

async fn respond(
    state: &AppState,
    policy: &EntryPolicy,
    headers: &HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let identity = caller_identity(headers).unwrap_or_else(|| {
        if policy.limiter.is_some() {
            warn!(
                entry = policy.name,
                "No client address header; using shared loopback rate-limit bucket"
            );
        }
        LOOPBACK_SENTINEL.to_string()
    });

    // A body that is not JSON fails validation as a malformed body.
    let body = match body {
        Ok(Json(value)) => value,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            return GenerateError::from(ValidationError::BodyTooLarge).into_response();
        }
        Err(rejection) => {
            warn!(entry = policy.name, error = %rejection.body_text(), "Rejected request body");
            Value::Null
        }
    };

    match state.service.handle(policy, &identity, &body).await {
        Ok(message) => (StatusCode::OK, Json(message)).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Extracts the rate-limit key from client address headers.
///
/// Prefers the first `x-forwarded-for` entry, then `x-real-ip`. Neither is
/// authenticated; both are spoofable.
pub fn caller_identity(headers: &HeaderMap) -> Option<String> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    header("x-forwarded-for")
        .and_then(|list| list.split(',').map(str::trim).find(|ip| !ip.is_empty()))
        .or_else(|| header("x-real-ip"))
        .map(str::to_string)
}

impl IntoResponse for GenerateError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        match &self {
            Self::Validation(_) | Self::RateLimited => {
                info!(status = status.as_u16(), error = %self, "Request rejected");
            }
            _ => error!(status = status.as_u16(), error = %self, "Error generating commit"),
        }

        (
            status,
            Json(ErrorBody {
                error: self.public_message(),
            }),
        )
            .into_response()
    }
}
