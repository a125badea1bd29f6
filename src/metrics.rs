//! Process-local client metrics
//!
//! Two monotonically increasing counters owned by a `RestClient`
//! instance. They are never reset except by recreating the client, and
//! only need eventual cross-thread visibility, so relaxed atomics are
//! enough.

use std::sync::atomic::{AtomicU64, Ordering};

/// Request/error counters for one client instance
#[derive(Debug, Default)]
pub struct ClientMetrics {
    requests: AtomicU64,
    errors: AtomicU64,
}

impl ClientMetrics {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one attempted request
    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one failed attempt
    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a point-in-time snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        let request_count = self.requests.load(Ordering::Relaxed);
        let error_count = self.errors.load(Ordering::Relaxed);
        let error_rate = if request_count == 0 {
            0.0
        } else {
            error_count as f64 / request_count as f64
        };

        MetricsSnapshot {
            request_count,
            error_count,
            error_rate,
        }
    }
}

/// Point-in-time view of the client counters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricsSnapshot {
    /// Total attempts made (one per HTTP request sent)
    pub request_count: u64,
    /// Attempts that did not produce a parsed 2xx response
    pub error_count: u64,
    /// `error_count / request_count`, 0 when nothing was sent
    pub error_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_empty() {
        let metrics = ClientMetrics::new();
        let snap = metrics.snapshot();
        assert_eq!(snap.request_count, 0);
        assert_eq!(snap.error_count, 0);
        assert_eq!(snap.error_rate, 0.0);
    }

    #[test]
    fn test_snapshot_counts_and_rate() {
        let metrics = ClientMetrics::new();
        for _ in 0..3 {
            metrics.record_request();
        }
        metrics.record_error();

        let snap = metrics.snapshot();
        assert_eq!(snap.request_count, 3);
        assert_eq!(snap.error_count, 1);
        assert!((snap.error_rate - 1.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_counters_are_monotonic() {
        let metrics = ClientMetrics::new();
        metrics.record_request();
        let first = metrics.snapshot();
        metrics.record_request();
        metrics.record_error();
        let second = metrics.snapshot();

        assert!(second.request_count > first.request_count);
        assert!(second.error_count > first.error_count);
    }
}
