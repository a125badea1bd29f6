//! REST client with auth, retry, and rate-limit handling
//!
//! One logical `get` drives a bounded recovery loop: transient failures
//! (timeouts, 5xx, 429) are retried on the policy's schedule, a 401
//! forces a one-shot credential refresh, and every other non-2xx is
//! surfaced immediately as a classified error. `post` is a single
//! attempt; side-effecting calls are not safely retried without
//! idempotency keys.

use super::throttle::{Throttle, ThrottleConfig};
use crate::auth::{AuthConfig, CredentialProvider};
use crate::backoff::{rate_limit_status, RetryPolicy, RetryReason};
use crate::error::{Error, Result};
use crate::metrics::{ClientMetrics, MetricsSnapshot};
use crate::pagination::Pager;
use crate::types::{JsonValue, StringMap};
use reqwest::header::HeaderMap;
use reqwest::{Client, RequestBuilder};
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for the REST client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL prepended to relative paths
    pub base_url: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
    /// Retry policy driving the recovery loop
    pub retry: RetryPolicy,
    /// Optional client-side throttle
    pub throttle: Option<ThrottleConfig>,
    /// Headers attached to every request
    pub default_headers: StringMap,
    /// User agent string
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            throttle: None,
            default_headers: StringMap::new(),
            user_agent: format!("sensorgrid-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    /// Create a new config builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

/// Builder for the client config
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    /// Set the per-request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Replace the retry policy
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.config.retry = policy;
        self
    }

    /// Set only the retry budget
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.retry.max_retries = retries;
        self
    }

    /// Set the backoff schedule bounds
    pub fn backoff(mut self, base_delay: Duration, max_delay: Duration) -> Self {
        self.config.retry.base_delay = base_delay;
        self.config.retry.max_delay = max_delay;
        self
    }

    /// Enable the client-side throttle
    pub fn throttle(mut self, config: ThrottleConfig) -> Self {
        self.config.throttle = Some(config);
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> ClientConfig {
        self.config
    }
}

/// Per-request overrides
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Query parameters
    pub query: StringMap,
    /// Extra request headers
    pub headers: StringMap,
    /// Override the client timeout for this request
    pub timeout: Option<Duration>,
    /// Override the retry budget for this request
    pub max_retries: Option<u32>,
}

impl RequestOptions {
    /// Create empty options
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Merge a set of query parameters
    #[must_use]
    pub fn query_map(mut self, params: StringMap) -> Self {
        self.query.extend(params);
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Override the timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Override the retry budget
    #[must_use]
    pub fn retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    /// Force a single attempt, no retries of any kind
    #[must_use]
    pub fn no_retry(self) -> Self {
        self.retries(0)
    }
}

/// REST client with credential recovery and bounded retries
pub struct RestClient {
    http: Client,
    config: ClientConfig,
    credentials: CredentialProvider,
    throttle: Option<Throttle>,
    metrics: ClientMetrics,
}

impl RestClient {
    /// Create an unauthenticated client
    pub fn new(config: ClientConfig) -> Self {
        Self::with_auth(config, AuthConfig::None)
    }

    /// Create a client with the given auth config
    ///
    /// The pooled HTTP connection set is created here and shared with
    /// the credential provider for token-exchange calls; it lives until
    /// the client is dropped.
    pub fn with_auth(config: ClientConfig, auth: AuthConfig) -> Self {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .expect("Failed to build HTTP client");

        let credentials = CredentialProvider::with_client(auth, http.clone());
        let throttle = config.throttle.as_ref().map(Throttle::new);

        Self {
            http,
            config,
            credentials,
            throttle,
            metrics: ClientMetrics::new(),
        }
    }

    /// The credential provider backing this client
    pub fn credentials(&self) -> &CredentialProvider {
        &self.credentials
    }

    /// Snapshot of the request/error counters
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Check if the client-side throttle is enabled
    pub fn has_throttle(&self) -> bool {
        self.throttle.is_some()
    }

    /// Make a GET request and return the parsed JSON body
    pub async fn get(&self, path: &str) -> Result<JsonValue> {
        self.get_with(path, RequestOptions::default()).await
    }

    /// Make a GET request with per-request overrides
    pub async fn get_with(&self, path: &str, options: RequestOptions) -> Result<JsonValue> {
        let url = self.build_url(path)?;
        let max_retries = options.max_retries.unwrap_or(self.config.retry.max_retries);
        let max_attempts = max_retries + 1;
        let timeout = options.timeout.unwrap_or(self.config.timeout);
        let policy = RetryPolicy {
            max_retries,
            ..self.config.retry
        };

        let mut attempt: u32 = 0;
        let mut refreshed = false;

        while attempt < max_attempts {
            if let Some(ref throttle) = self.throttle {
                throttle.acquire().await;
            }

            let auth_headers = match self.credentials.auth_headers().await {
                Ok(headers) => headers,
                Err(e) => {
                    self.metrics.record_error();
                    return Err(e);
                }
            };

            self.metrics.record_request();
            debug!("GET {url} (attempt {}/{max_attempts})", attempt + 1);

            let mut req = self
                .http
                .get(&url)
                .timeout(timeout)
                .header("Accept", "application/json");
            req = apply_headers(req, &self.config.default_headers);
            req = apply_headers(req, &options.headers);
            req = apply_headers(req, &auth_headers);
            if !options.query.is_empty() {
                req = req.query(&options.query);
            }

            match req.send().await {
                Ok(response) => {
                    let status = response.status();
                    self.warn_if_rate_limit_low(response.headers());

                    if status.is_success() {
                        return match response.json::<JsonValue>().await {
                            Ok(body) => Ok(body),
                            Err(e) => {
                                self.metrics.record_error();
                                Err(Error::Http(e))
                            }
                        };
                    }

                    self.metrics.record_error();
                    let code = status.as_u16();

                    match policy.for_status(code, response.headers(), attempt) {
                        Some(decision) if decision.reason == RetryReason::AuthExpired => {
                            if !self.credentials.refreshes() {
                                let body = response.text().await.unwrap_or_default();
                                return Err(Error::http_status(code, body));
                            }
                            if refreshed {
                                return Err(Error::auth(
                                    "401 persisted after access token refresh",
                                ));
                            }
                            if !decision.should_retry {
                                return Err(Error::RetriesExhausted {
                                    attempts: max_attempts,
                                });
                            }
                            warn!("got 401, refreshing access token");
                            self.credentials.force_refresh().await?;
                            refreshed = true;
                            attempt += 1;
                        }
                        Some(decision) if decision.reason == RetryReason::RateLimited => {
                            if !decision.should_retry {
                                return Err(Error::RateLimitExceeded {
                                    retry_after_seconds: decision.wait.as_secs(),
                                });
                            }
                            warn!(
                                "rate limited (429), attempt {}/{max_attempts}, waiting {:?}",
                                attempt + 1,
                                decision.wait
                            );
                            tokio::time::sleep(decision.wait).await;
                            attempt += 1;
                        }
                        Some(decision) => {
                            if !decision.should_retry {
                                return Err(Error::RetriesExhausted {
                                    attempts: max_attempts,
                                });
                            }
                            warn!(
                                "server error {code}, attempt {}/{max_attempts}, retrying in {:?}",
                                attempt + 1,
                                decision.wait
                            );
                            tokio::time::sleep(decision.wait).await;
                            attempt += 1;
                        }
                        None => {
                            let body = response.text().await.unwrap_or_default();
                            return Err(Error::http_status(code, body));
                        }
                    }
                }
                Err(e) => {
                    self.metrics.record_error();

                    let decision = if e.is_timeout() {
                        policy.for_timeout(attempt)
                    } else if e.is_connect() {
                        policy.for_transport(attempt)
                    } else {
                        return Err(Error::Http(e));
                    };

                    if !decision.should_retry {
                        return Err(if e.is_timeout() {
                            Error::Timeout {
                                timeout_ms: timeout.as_millis() as u64,
                            }
                        } else {
                            Error::Http(e)
                        });
                    }

                    warn!(
                        "transport error ({e}), attempt {}/{max_attempts}, retrying in {:?}",
                        attempt + 1,
                        decision.wait
                    );
                    tokio::time::sleep(decision.wait).await;
                    attempt += 1;
                }
            }
        }

        Err(Error::RetriesExhausted {
            attempts: max_attempts,
        })
    }

    /// Make a POST request, single attempt
    pub async fn post(&self, path: &str, body: JsonValue) -> Result<JsonValue> {
        let url = self.build_url(path)?;

        if let Some(ref throttle) = self.throttle {
            throttle.acquire().await;
        }

        let auth_headers = match self.credentials.auth_headers().await {
            Ok(headers) => headers,
            Err(e) => {
                self.metrics.record_error();
                return Err(e);
            }
        };

        self.metrics.record_request();
        debug!("POST {url}");

        let mut req = self
            .http
            .post(&url)
            .timeout(self.config.timeout)
            .header("Accept", "application/json")
            .json(&body);
        req = apply_headers(req, &self.config.default_headers);
        req = apply_headers(req, &auth_headers);

        match req.send().await {
            Ok(response) => {
                let status = response.status();
                self.warn_if_rate_limit_low(response.headers());

                if status.is_success() {
                    return match response.json::<JsonValue>().await {
                        Ok(value) => Ok(value),
                        Err(e) => {
                            self.metrics.record_error();
                            Err(Error::Http(e))
                        }
                    };
                }

                self.metrics.record_error();
                let code = status.as_u16();

                if code == 429 {
                    let hint = self
                        .config
                        .retry
                        .for_status(code, response.headers(), 0)
                        .map(|d| d.wait.as_secs())
                        .unwrap_or_default();
                    return Err(Error::RateLimitExceeded {
                        retry_after_seconds: hint,
                    });
                }

                let body = response.text().await.unwrap_or_default();
                Err(Error::http_status(code, body))
            }
            Err(e) => {
                self.metrics.record_error();
                if e.is_timeout() {
                    Err(Error::Timeout {
                        timeout_ms: self.config.timeout.as_millis() as u64,
                    })
                } else {
                    Err(Error::Http(e))
                }
            }
        }
    }

    /// Walk a paginated endpoint lazily
    ///
    /// Seeds `limit` with `page_size` and follows `next_cursor` /
    /// `has_more` until exhaustion or `max_pages`.
    pub fn paginate(
        &self,
        path: &str,
        params: StringMap,
        page_size: u32,
        max_pages: Option<u32>,
    ) -> Pager<'_> {
        Pager::new(self, path, params, page_size, max_pages)
    }

    /// Build the full URL for a path and validate it
    fn build_url(&self, path: &str) -> Result<String> {
        let full = if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            match &self.config.base_url {
                Some(base) => {
                    let base = base.trim_end_matches('/');
                    let path = path.trim_start_matches('/');
                    format!("{base}/{path}")
                }
                None => path.to_string(),
            }
        };

        url::Url::parse(&full)?;
        Ok(full)
    }

    fn warn_if_rate_limit_low(&self, headers: &HeaderMap) {
        if let Some(status) = rate_limit_status(headers) {
            if status.is_low() {
                warn!(
                    "rate limit low: {}/{} requests remaining",
                    status.remaining, status.limit
                );
            }
        }
    }
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("config", &self.config)
            .field("credentials", &self.credentials)
            .field("has_throttle", &self.throttle.is_some())
            .finish_non_exhaustive()
    }
}

fn apply_headers(mut req: RequestBuilder, headers: &StringMap) -> RequestBuilder {
    for (key, value) in headers {
        req = req.header(key.as_str(), value.as_str());
    }
    req
}
