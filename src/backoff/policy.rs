//! Retry policy implementation

use reqwest::header::HeaderMap;
use std::time::Duration;

/// Default attempt budget beyond the initial try
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base delay for the exponential schedule
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Default cap applied to any computed delay
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(60);

/// Why a retry was (or was not) scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryReason {
    /// The server answered 429
    RateLimited,
    /// The server answered a transient 5xx
    ServerError,
    /// The server answered 401 and credentials can be refreshed
    AuthExpired,
    /// The transport timed out or could not connect
    Timeout,
}

/// Outcome of consulting the policy for one failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffDecision {
    /// Whether another attempt should be made
    pub should_retry: bool,
    /// How long to wait before that attempt
    pub wait: Duration,
    /// The transient cause this decision classifies
    pub reason: RetryReason,
}

/// Bounded retry policy consulted by `RestClient`
///
/// A pure function of `(status code, response headers, attempt number,
/// this config)`; holds no state and performs no I/O.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries allowed after the initial attempt
    pub max_retries: u32,
    /// First step of the exponential schedule
    pub base_delay: Duration,
    /// Upper bound on any computed wait
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with an explicit retry budget
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
        }
    }

    /// Classify a non-2xx status
    ///
    /// Returns `None` for permanent client errors that must never be
    /// retried. For transient statuses the decision says whether the
    /// attempt budget allows another try and how long to wait:
    /// - 429 honors `Retry-After` (seconds, verbatim) over the
    ///   exponential schedule
    /// - 401 waits nothing; the refresh itself is the recovery step
    /// - 500/502/503/504 follow the exponential schedule
    pub fn for_status(&self, status: u16, headers: &HeaderMap, attempt: u32) -> Option<BackoffDecision> {
        match status {
            429 => {
                let wait = retry_after_seconds(headers)
                    .map(Duration::from_secs)
                    .unwrap_or_else(|| self.backoff_delay(attempt));
                Some(BackoffDecision {
                    should_retry: attempt < self.max_retries,
                    wait,
                    reason: RetryReason::RateLimited,
                })
            }
            401 => Some(BackoffDecision {
                should_retry: attempt < self.max_retries,
                wait: Duration::ZERO,
                reason: RetryReason::AuthExpired,
            }),
            500 | 502 | 503 | 504 => Some(BackoffDecision {
                should_retry: attempt < self.max_retries,
                wait: self.backoff_delay(attempt),
                reason: RetryReason::ServerError,
            }),
            _ => None,
        }
    }

    /// Classify a transport timeout
    pub fn for_timeout(&self, attempt: u32) -> BackoffDecision {
        BackoffDecision {
            should_retry: attempt < self.max_retries,
            wait: self.backoff_delay(attempt),
            reason: RetryReason::Timeout,
        }
    }

    /// Classify a connection-level failure (refused, reset)
    pub fn for_transport(&self, attempt: u32) -> BackoffDecision {
        self.for_timeout(attempt)
    }

    /// Exponential delay for the given attempt, capped at `max_delay`
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        std::cmp::min(self.base_delay.saturating_mul(factor), self.max_delay)
    }
}

/// Parse a `Retry-After` header given in whole seconds
fn retry_after_seconds(headers: &HeaderMap) -> Option<u64> {
    headers
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
}

/// Advisory view of the server-side rate-limit headers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitStatus {
    /// Requests left in the current window
    pub remaining: u64,
    /// Window size
    pub limit: u64,
}

impl RateLimitStatus {
    /// True when fewer than 10% of the window remains
    pub fn is_low(&self) -> bool {
        self.remaining.saturating_mul(10) < self.limit
    }
}

/// Read `X-RateLimit-Remaining` / `X-RateLimit-Limit` when both are
/// present and numeric
///
/// Advisory only: callers may log a warning but control flow never
/// depends on the result.
pub fn rate_limit_status(headers: &HeaderMap) -> Option<RateLimitStatus> {
    let read = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok())
    };

    let remaining = read("x-ratelimit-remaining")?;
    let limit = read("x-ratelimit-limit")?;

    Some(RateLimitStatus { remaining, limit })
}
