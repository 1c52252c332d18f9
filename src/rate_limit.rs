//! Sliding-window admission control keyed by caller identity.
//!
//! Admission state lives in a [`RateLimitStore`]. Production deployments run
//! several stateless replicas, so the store must be shared between them
//! ([`RedisStore`]); [`MemoryStore`] only sees its own process.

pub mod memory;
pub mod redis_store;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};

use crate::generation::error::GenerateError;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;

/// Admissions allowed per identity within one window.
pub const DEFAULT_LIMIT: u32 = 10;

/// Length of the trailing window.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(10);

/// Namespace prepended to every identity before it reaches the store.
pub const KEY_PREFIX: &str = "commitdiff:ratelimit:";

/// Atomic check-and-record over a shared counting store.
pub trait RateLimitStore: Send + Sync {
    /// Discards admissions at or before `now_ms - window`, then records an
    /// admission at `now_ms` if fewer than `limit` remain.
    ///
    /// Returns whether the admission was recorded. Denied attempts are not
    /// recorded. Must be atomic with respect to concurrent callers sharing
    /// `key`.
    fn try_acquire<'a>(
        &'a self,
        key: &'a str,
        now_ms: u64,
        window: Duration,
        limit: u32,
    ) -> Pin<Box<dyn Future<Output = Result<bool, GenerateError>> + Send + 'a>>;
}

type Clock = Arc<dyn Fn() -> u64 + Send + Sync>;

/// Sliding-window rate limiter.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    limit: u32,
    window: Duration,
    clock: Clock,
}

impl RateLimiter {
    /// Creates a limiter with the default allowance (10 per 10 seconds).
    pub fn new(store: Arc<dyn RateLimitStore>) -> Self {
        Self::with_limits(store, DEFAULT_LIMIT, DEFAULT_WINDOW)
    }

    /// Creates a limiter with a custom allowance.
    pub fn with_limits(store: Arc<dyn RateLimitStore>, limit: u32, window: Duration) -> Self {
        Self {
            store,
            limit,
            window,
            clock: Arc::new(unix_millis),
        }
    }

    /// Replaces the wall clock (milliseconds since the Unix epoch).
    #[must_use]
    pub fn with_clock(mut self, clock: impl Fn() -> u64 + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Admissions allowed per window.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Window length.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Admits or denies one request from `identity`.
    pub async fn check(&self, identity: &str) -> Result<(), GenerateError> {
        let key = format!("{KEY_PREFIX}{identity}");
        let now_ms = (self.clock)();

        let admitted = self
            .store
            .try_acquire(&key, now_ms, self.window, self.limit)
            .await
            .inspect_err(|e| warn!(identity, error = %e, "Rate limit store failure"))?;

        if admitted {
            debug!(identity, "Rate limit admission granted");
            Ok(())
        } else {
            warn!(identity, limit = self.limit, window = ?self.window, "Rate limit exceeded");
            Err(GenerateError::RateLimited)
        }
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
