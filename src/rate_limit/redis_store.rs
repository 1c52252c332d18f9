//! Redis-backed rate-limit store shared by every replica.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use anyhow::{Context, Result};
use redis::aio::ConnectionManager;
use redis::Script;
use tracing::info;

use super::RateLimitStore;
use crate::generation::error::GenerateError;

/// Sliding window over a sorted set scored by admission time.
///
/// KEYS[1] holds the window, KEYS[2] a sequence counter that keeps members
/// unique when two admissions share a millisecond. Runs atomically on the
/// Redis server.
const SLIDING_WINDOW_SCRIPT: &str = r"
local now = tonumber(ARGV[1])
local window = tonumber(ARGV[2])
local limit = tonumber(ARGV[3])
redis.call('ZREMRANGEBYSCORE', KEYS[1], '-inf', now - window)
if redis.call('ZCARD', KEYS[1]) >= limit then
  return 0
end
local seq = redis.call('INCR', KEYS[2])
redis.call('ZADD', KEYS[1], now, now .. '-' .. seq)
redis.call('PEXPIRE', KEYS[1], window)
redis.call('PEXPIRE', KEYS[2], window)
return 1
";

/// Rate-limit store backed by a Redis sorted set per identity.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    script: Script,
}

impl fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStore").finish_non_exhaustive()
    }
}

impl RedisStore {
    /// Connects to Redis at `url` (e.g. `redis://127.0.0.1:6379/0`).
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).context("Invalid REDIS_URL")?;
        let conn = ConnectionManager::new(client)
            .await
            .context("Failed to connect to Redis")?;
        info!("Connected to Redis rate-limit store");
        Ok(Self {
            conn,
            script: Script::new(SLIDING_WINDOW_SCRIPT),
        })
    }
}

/// Wraps the identity in a hash tag so both keys land on one cluster slot.
fn window_keys(key: &str) -> (String, String) {
    (format!("{{{key}}}"), format!("{{{key}}}:seq"))
}

impl RateLimitStore for RedisStore {
    fn try_acquire<'a>(
        &'a self,
        key: &'a str,
        now_ms: u64,
        window: Duration,
        limit: u32,
    ) -> Pin<Box<dyn Future<Output = Result<bool, GenerateError>> + Send + 'a>> {
        Box::pin(async move {
            let (window_key, seq_key) = window_keys(key);
            let mut conn = self.conn.clone();
            let admitted: i64 = self
                .script
                .key(window_key)
                .key(seq_key)
                .arg(now_ms)
                .arg(window.as_millis() as u64)
                .arg(limit)
                .invoke_async(&mut conn)
                .await
                .map_err(|e| GenerateError::RateLimitStore(e.to_string()))?;
            Ok(admitted == 1)
        })
    }
}
