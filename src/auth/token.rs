//! Access token with expiry tracking

use chrono::{DateTime, Duration, Utc};

/// Default token lifetime when the token endpoint omits `expires_in`
pub const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// Default safety margin subtracted from expiry to force early renewal,
/// guarding against clock skew and in-flight expiry during a long call
pub const DEFAULT_REFRESH_BUFFER_SECS: i64 = 300;

/// A bearer access token and its expiry instant
///
/// Owned exclusively by one `CredentialProvider`. The token value is
/// never serialized and never appears in `Debug` output or logs.
#[derive(Clone)]
pub struct AccessToken {
    value: String,
    /// When the token stops being valid
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Create a token with an explicit expiry instant
    pub fn new(value: String, expires_at: DateTime<Utc>) -> Self {
        Self { value, expires_at }
    }

    /// Create a token that expires `seconds` from now
    pub fn expires_in(value: String, seconds: i64) -> Self {
        Self {
            value,
            expires_at: Utc::now() + Duration::seconds(seconds),
        }
    }

    /// The raw token value, for building an `Authorization` header
    pub fn reveal(&self) -> &str {
        &self.value
    }

    /// True once `now >= expires_at - buffer`, i.e. the token must be
    /// refreshed before the next use
    pub fn is_stale(&self, buffer: Duration) -> bool {
        Utc::now() + buffer >= self.expires_at
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
