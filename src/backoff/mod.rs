//! Rate/backoff policy module
//!
//! Pure decision logic for "should this attempt be retried, and after
//! how long". The policy never sleeps; the HTTP client owns the actual
//! waiting, which keeps every rule here unit-testable in isolation.
//!
//! Also hosts the advisory `X-RateLimit-*` header inspection.

mod policy;

pub use policy::{
    rate_limit_status, BackoffDecision, RateLimitStatus, RetryPolicy, RetryReason,
    DEFAULT_BASE_DELAY, DEFAULT_MAX_DELAY, DEFAULT_MAX_RETRIES,
};
