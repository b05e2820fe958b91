//! Per-caller request rate limiting
//!
//! Protects the gateway from runaway aggregator retries and abusive
//! callers. Limits are keyed by phone number over a fixed window.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::warn;

/// Rate limiter configuration
#[derive(Clone)]
pub struct RateLimitConfig {
    /// Maximum requests per window
    pub max_requests: u32,
    /// Time window for rate limiting
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 30,
            window: Duration::from_secs(60),
        }
    }
}

/// Caller rate limit state
#[derive(Clone)]
struct CallerState {
    request_count: u32,
    window_start: Instant,
}

/// In-memory rate limiter
#[derive(Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    callers: Arc<RwLock<HashMap<String, CallerState>>>,
}

impl RateLimiter {
    /// Create a new rate limiter with default configuration
    pub fn new() -> Self {
        Self::with_config(RateLimitConfig::default())
    }

    /// Create a rate limiter with custom configuration
    pub fn with_config(config: RateLimitConfig) -> Self {
        Self {
            config,
            callers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Check if a caller is allowed to make a request
    pub async fn check(&self, caller: &str) -> bool {
        let mut callers = self.callers.write().await;
        let now = Instant::now();

        let state = callers.entry(caller.to_string()).or_insert(CallerState {
            request_count: 0,
            window_start: now,
        });

        // Reset window if expired
        if now.duration_since(state.window_start) > self.config.window {
            state.request_count = 0;
            state.window_start = now;
        }

        if state.request_count >= self.config.max_requests {
            warn!("Rate limit exceeded for caller: {}", caller);
            return false;
        }

        state.request_count += 1;
        true
    }

    /// Cleanup expired entries; the sweep task calls this on its tick
    pub async fn cleanup(&self) {
        let mut callers = self.callers.write().await;
        let now = Instant::now();

        callers.retain(|_, state| now.duration_since(state.window_start) <= self.config.window);
    }

    /// Number of callers currently tracked
    #[cfg(test)]
    pub(crate) async fn tracked(&self) -> usize {
        self.callers.read().await.len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rate_limiter_allows_within_limit() {
        let config = RateLimitConfig {
            max_requests: 3,
            window: Duration::from_secs(60),
        };
        let limiter = RateLimiter::with_config(config);

        assert!(limiter.check("+254711000111").await);
        assert!(limiter.check("+254711000111").await);
        assert!(limiter.check("+254711000111").await);

        // 4th should be denied
        assert!(!limiter.check("+254711000111").await);
    }

    #[tokio::test]
    async fn test_rate_limiter_separate_callers() {
        let config = RateLimitConfig {
            max_requests: 2,
            window: Duration::from_secs(60),
        };
        let limiter = RateLimiter::with_config(config);

        assert!(limiter.check("+254711000111").await);
        assert!(limiter.check("+254711000111").await);
        assert!(!limiter.check("+254711000111").await);

        assert!(limiter.check("+254722000222").await);
        assert!(limiter.check("+254722000222").await);
    }

    #[tokio::test]
    async fn test_cleanup_drops_stale_entries() {
        let config = RateLimitConfig {
            max_requests: 1,
            window: Duration::from_millis(10),
        };
        let limiter = RateLimiter::with_config(config.clone());

        assert!(limiter.check("+254711000111").await);
        tokio::time::sleep(Duration::from_millis(20)).await;
        limiter.cleanup().await;

        assert!(limiter.callers.read().await.is_empty());
    }
}
