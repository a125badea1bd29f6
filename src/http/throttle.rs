//! Client-side request throttle
//!
//! Token bucket built on the governor crate. Opt-in: the reference
//! client is purely reactive (429-driven), but hosts that know their
//! quota can cap outbound request rate before the server pushes back.

use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Throttle configuration
#[derive(Debug, Clone, Copy)]
pub struct ThrottleConfig {
    /// Sustained requests per second
    pub requests_per_second: u32,
    /// Burst allowance (max tokens in the bucket)
    pub burst: u32,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 10,
            burst: 10,
        }
    }
}

impl ThrottleConfig {
    /// Create a throttle config
    pub fn new(requests_per_second: u32, burst: u32) -> Self {
        Self {
            requests_per_second,
            burst,
        }
    }
}

/// Token bucket gating outbound attempts
#[derive(Clone)]
pub struct Throttle {
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>>,
}

impl Throttle {
    /// Create a throttle from config; zero rates are clamped to 1
    pub fn new(config: &ThrottleConfig) -> Self {
        let one = NonZeroU32::MIN;
        let quota = Quota::per_second(NonZeroU32::new(config.requests_per_second).unwrap_or(one))
            .allow_burst(NonZeroU32::new(config.burst).unwrap_or(one));

        Self {
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    /// Wait until the bucket grants a permit
    pub async fn acquire(&self) {
        self.limiter.until_ready().await;
    }

    /// Take a permit only if one is immediately available
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

impl std::fmt::Debug for Throttle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Throttle").finish()
    }
}

#[cfg(test)]
mod throttle_tests {
    use super::*;

    #[test]
    fn test_throttle_config_default() {
        let config = ThrottleConfig::default();
        assert_eq!(config.requests_per_second, 10);
        assert_eq!(config.burst, 10);
    }

    #[test]
    fn test_throttle_allows_burst() {
        let throttle = Throttle::new(&ThrottleConfig::new(10, 5));
        for _ in 0..5 {
            assert!(throttle.try_acquire());
        }
        assert!(!throttle.try_acquire());
    }

    #[tokio::test]
    async fn test_throttle_acquire_within_burst() {
        let throttle = Throttle::new(&ThrottleConfig::new(100, 10));
        throttle.acquire().await;
    }

    #[test]
    fn test_throttle_clamps_zero_rate() {
        let throttle = Throttle::new(&ThrottleConfig::new(0, 0));
        assert!(throttle.try_acquire());
    }
}
