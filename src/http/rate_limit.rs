//! Request throttling for the remote source
//!
//! Token bucket built on the governor crate. Caps how often the HTTP fetcher
//! may hit the remote.

use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as Governor};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Configuration for rate limiting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimiterConfig {
    /// Maximum number of requests per second
    pub requests_per_second: u32,
    /// Burst size (max tokens in bucket)
    #[serde(default = "default_burst")]
    pub burst_size: u32,
}

fn default_burst() -> u32 {
    1
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 2,
            burst_size: 1,
        }
    }
}

impl RateLimiterConfig {
    /// Create a new rate limiter config
    pub fn new(requests_per_second: u32, burst_size: u32) -> Self {
        Self {
            requests_per_second,
            burst_size,
        }
    }
}

/// Token bucket rate limiter
#[derive(Clone)]
pub struct RateLimiter {
    limiter: Arc<Governor<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given config
    ///
    /// Zero values are clamped to one.
    pub fn new(config: &RateLimiterConfig) -> Self {
        let rps = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(config.burst_size).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::per_second(rps).allow_burst(burst);

        Self {
            limiter: Arc::new(Governor::direct(quota)),
        }
    }

    /// Wait until a request can be made
    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn test_rate_limiter_config_default() {
        let config = RateLimiterConfig::default();
        assert_eq!(config.requests_per_second, 2);
        assert_eq!(config.burst_size, 1);
    }

    #[test]
    fn test_rate_limiter_config_deserialize_default_burst() {
        let config: RateLimiterConfig =
            serde_json::from_str(r#"{"requests_per_second": 5}"#).unwrap();
        assert_eq!(config, RateLimiterConfig::new(5, 1));
    }

    #[tokio::test]
    async fn test_wait_throttles_past_burst() {
        let limiter = RateLimiter::new(&RateLimiterConfig::new(20, 2));

        let start = Instant::now();
        for _ in 0..3 {
            limiter.wait().await;
        }
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[tokio::test]
    async fn test_zero_quota_is_clamped() {
        let limiter = RateLimiter::new(&RateLimiterConfig::new(0, 0));
        tokio::time::timeout(Duration::from_secs(1), limiter.wait())
            .await
            .expect("first permit is available immediately");
    }
}
