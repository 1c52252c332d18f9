//! Process-local rate-limit store.
//!
//! Only correct for a single replica. Used by tests and by the server's
//! `--in-memory-rate-limit` development mode.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::time::Duration;

use super::RateLimitStore;
use crate::generation::error::GenerateError;

/// Key count above which expired keys are swept.
const SWEEP_THRESHOLD: usize = 16_384;

/// Mutex-guarded map of admission timestamps per key.
#[derive(Debug, Default)]
pub struct MemoryStore {
    windows: Mutex<HashMap<String, VecDeque<u64>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn acquire(&self, key: &str, now_ms: u64, window: Duration, limit: u32) -> Result<bool, GenerateError> {
        let cutoff = now_ms.saturating_sub(window.as_millis() as u64);
        let mut windows = self
            .windows
            .lock()
            .map_err(|_| GenerateError::RateLimitStore("memory store poisoned".to_string()))?;

        if windows.len() > SWEEP_THRESHOLD {
            windows.retain(|_, stamps| stamps.back().is_some_and(|&last| last > cutoff));
        }

        let stamps = windows.entry(key.to_string()).or_default();
        while stamps.front().is_some_and(|&first| first <= cutoff) {
            stamps.pop_front();
        }

        if stamps.len() >= limit as usize {
            return Ok(false);
        }
        stamps.push_back(now_ms);
        Ok(true)
    }
}

impl RateLimitStore for MemoryStore {
    fn try_acquire<'a>(
        &'a self,
        key: &'a str,
        now_ms: u64,
        window: Duration,
        limit: u32,
    ) -> Pin<Box<dyn Future<Output = Result<bool, GenerateError>> + Send + 'a>> {
        let result = self.acquire(key, now_ms, window, limit);
        Box::pin(async move { result })
    }
}
