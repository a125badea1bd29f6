//! Credential provider implementation
//!
//! Produces request-ready authentication headers and manages token
//! refresh for the client-credentials variant.

use super::token::{AccessToken, DEFAULT_EXPIRES_IN_SECS, DEFAULT_REFRESH_BUFFER_SECS};
use crate::error::{Error, Result};
use chrono::Duration;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Header used for API key auth unless the config overrides it
pub const DEFAULT_API_KEY_HEADER: &str = "X-API-Key";

/// Authentication configuration
#[derive(Clone, Default)]
pub enum AuthConfig {
    /// No authentication
    #[default]
    None,

    /// Static API key sent as a request header
    ApiKey {
        /// Header name, `X-API-Key` when not set
        header_name: Option<String>,
        /// The API key value
        value: String,
    },

    /// OAuth2 client-credentials flow with automatic token refresh
    ClientCredentials {
        /// Token endpoint URL
        token_url: String,
        /// Client ID
        client_id: String,
        /// Client secret
        client_secret: String,
        /// Requested scopes, space-joined into the `scope` form field
        scopes: Vec<String>,
        /// Safety margin before expiry that forces early renewal
        refresh_buffer_seconds: i64,
    },
}

impl AuthConfig {
    /// API key auth with the default header
    pub fn api_key(value: impl Into<String>) -> Self {
        Self::ApiKey {
            header_name: None,
            value: value.into(),
        }
    }

    /// API key auth with a custom header name
    pub fn api_key_with_header(header: impl Into<String>, value: impl Into<String>) -> Self {
        Self::ApiKey {
            header_name: Some(header.into()),
            value: value.into(),
        }
    }

    /// Client-credentials auth with the default refresh buffer
    pub fn client_credentials(
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self::ClientCredentials {
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scopes: Vec::new(),
            refresh_buffer_seconds: DEFAULT_REFRESH_BUFFER_SECS,
        }
    }

    /// Set requested scopes (client-credentials only, no-op otherwise)
    #[must_use]
    pub fn with_scopes(mut self, requested: Vec<String>) -> Self {
        if let Self::ClientCredentials { ref mut scopes, .. } = self {
            *scopes = requested;
        }
        self
    }

    /// Set the refresh buffer (client-credentials only, no-op otherwise)
    #[must_use]
    pub fn with_refresh_buffer(mut self, seconds: i64) -> Self {
        if let Self::ClientCredentials {
            ref mut refresh_buffer_seconds,
            ..
        } = self
        {
            *refresh_buffer_seconds = seconds;
        }
        self
    }
}

// Credentials must never leak through Debug output or logs.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "AuthConfig::None"),
            Self::ApiKey { header_name, .. } => f
                .debug_struct("AuthConfig::ApiKey")
                .field("header_name", header_name)
                .field("value", &"<redacted>")
                .finish(),
            Self::ClientCredentials {
                token_url,
                client_id,
                refresh_buffer_seconds,
                ..
            } => f
                .debug_struct("AuthConfig::ClientCredentials")
                .field("token_url", token_url)
                .field("client_id", client_id)
                .field("client_secret", &"<redacted>")
                .field("refresh_buffer_seconds", refresh_buffer_seconds)
                .finish(),
        }
    }
}

/// Produces authentication headers for outgoing requests
///
/// For the client-credentials variant the provider owns the cached
/// `AccessToken` behind an `RwLock`, so one instance can be shared
/// across tasks: readers see either the pre- or post-refresh token and
/// the refresh transition itself is mutually exclusive.
pub struct CredentialProvider {
    config: AuthConfig,
    token: Arc<RwLock<Option<AccessToken>>>,
    http: Client,
}

impl CredentialProvider {
    /// Create a provider with its own HTTP client for token exchange
    pub fn new(config: AuthConfig) -> Self {
        Self::with_client(config, Client::new())
    }

    /// Create a provider that shares the caller's pooled HTTP client
    pub fn with_client(config: AuthConfig, http: Client) -> Self {
        Self {
            config,
            token: Arc::new(RwLock::new(None)),
            http,
        }
    }

    /// Whether this provider can recover from a 401 by refreshing
    pub fn refreshes(&self) -> bool {
        matches!(self.config, AuthConfig::ClientCredentials { .. })
    }

    /// The current auth config
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Build the authentication headers for one request
    ///
    /// For the refreshing variant this renews the token when it is
    /// missing or inside the refresh buffer. A previous failed exchange
    /// is not sticky; each call re-attempts a fresh exchange.
    pub async fn auth_headers(&self) -> Result<HashMap<String, String>> {
        let mut headers = HashMap::new();

        match &self.config {
            AuthConfig::None => {}
            AuthConfig::ApiKey { header_name, value } => {
                let header = header_name.as_deref().unwrap_or(DEFAULT_API_KEY_HEADER);
                headers.insert(header.to_string(), value.clone());
            }
            AuthConfig::ClientCredentials { .. } => {
                let token = self.current_token().await?;
                headers.insert("Authorization".to_string(), format!("Bearer {token}"));
            }
        }

        Ok(headers)
    }

    /// Get a valid token value, refreshing if necessary
    async fn current_token(&self) -> Result<String> {
        let buffer = self.refresh_buffer();

        {
            let cached = self.token.read().await;
            if let Some(token) = cached.as_ref() {
                if !token.is_stale(buffer) {
                    return Ok(token.reveal().to_string());
                }
            }
        }

        // Stale or unset: take the write lock and re-check, another
        // task may have refreshed while we waited.
        let mut cached = self.token.write().await;
        if let Some(token) = cached.as_ref() {
            if !token.is_stale(buffer) {
                return Ok(token.reveal().to_string());
            }
        }

        let fresh = self.exchange_token().await?;
        let value = fresh.reveal().to_string();
        *cached = Some(fresh);

        Ok(value)
    }

    /// Discard any cached token and perform an exchange immediately
    ///
    /// Used by the client's 401 recovery path. On failure the cache is
    /// left untouched so the next call can try again.
    pub async fn force_refresh(&self) -> Result<()> {
        let mut cached = self.token.write().await;
        let fresh = self.exchange_token().await?;
        *cached = Some(fresh);
        Ok(())
    }

    fn refresh_buffer(&self) -> Duration {
        match &self.config {
            AuthConfig::ClientCredentials {
                refresh_buffer_seconds,
                ..
            } => Duration::seconds(*refresh_buffer_seconds),
            _ => Duration::zero(),
        }
    }

    /// POST the client-credentials grant to the token endpoint
    async fn exchange_token(&self) -> Result<AccessToken> {
        let AuthConfig::ClientCredentials {
            token_url,
            client_id,
            client_secret,
            scopes,
            ..
        } = &self.config
        else {
            return Err(Error::auth("token refresh requires client-credentials auth"));
        };

        debug!("fetching new access token");

        let mut form = vec![
            ("grant_type", "client_credentials".to_string()),
            ("client_id", client_id.clone()),
            ("client_secret", client_secret.clone()),
        ];
        if !scopes.is_empty() {
            form.push(("scope", scopes.join(" ")));
        }

        let response = self
            .http
            .post(token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| Error::token_exchange(format!("token request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::token_exchange(format!(
                "token request failed with status {status}: {body}"
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::token_exchange(format!("malformed token response: {e}")))?;

        let token = token_response.into_access_token();
        debug!(expires_at = %token.expires_at, "access token obtained");

        Ok(token)
    }
}

impl std::fmt::Debug for CredentialProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialProvider")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// OAuth2 token endpoint response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    #[allow(dead_code)]
    token_type: Option<String>,
}

impl TokenResponse {
    fn into_access_token(self) -> AccessToken {
        let seconds = self.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
        AccessToken::expires_in(self.access_token, seconds)
    }
}
