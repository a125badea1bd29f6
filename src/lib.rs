//! # SensorGrid Client
//!
//! Resilient authenticated REST access layer for the SensorGrid
//! ingestion pipeline. Downstream batch jobs call `get`, `paginate`,
//! and `metrics`; everything they get back is plain JSON data.
//!
//! ## Features
//!
//! - **Credential Providers**: static API key or OAuth2 client
//!   credentials with automatic token refresh
//! - **Bounded Recovery**: exponential backoff for 5xx/timeouts,
//!   `Retry-After`-aware 429 handling, one-shot 401 refresh
//! - **Cursor Pagination**: lazy page walking with a detectable
//!   page-cap truncation and loop protection
//! - **Metrics**: per-client request/error counters
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sensorgrid_client::{AuthConfig, ClientConfig, RestClient, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = ClientConfig::builder()
//!         .base_url("https://api.sensorgrid.example.com")
//!         .build();
//!     let client = RestClient::with_auth(config, AuthConfig::api_key("sk_live_..."));
//!
//!     let mut pager = client.paginate("/v1/readings", Default::default(), 100, Some(50));
//!     while let Some(page) = pager.next_page().await {
//!         let page = page?;
//!         // Process page
//!     }
//!
//!     println!("{:?}", client.metrics());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    Paginator (Pager)                    │
//! │  next_page() → page JSON     termination() → why ended  │
//! └────────────────────────────┬────────────────────────────┘
//!                              │
//! ┌────────────────────────────┴────────────────────────────┐
//! │                       RestClient                        │
//! │  get / post / metrics     bounded retry loop            │
//! └──────┬──────────────────────────────────────────┬───────┘
//!        │                                          │
//! ┌──────┴────────────┐                  ┌──────────┴───────┐
//! │ CredentialProvider│                  │   RetryPolicy    │
//! │ api key / oauth2  │                  │ pure decisions   │
//! └───────────────────┘                  └──────────────────┘
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the client
pub mod error;

/// Common types and type aliases
pub mod types;

/// Authentication implementations
pub mod auth;

/// Rate/backoff policy
pub mod backoff;

/// REST client with retry and throttling
pub mod http;

/// Cursor pagination
pub mod pagination;

/// Process-local client metrics
pub mod metrics;

// ============================================================================
// Re-exports
// ============================================================================

pub use auth::{AccessToken, AuthConfig, CredentialProvider};
pub use backoff::{BackoffDecision, RetryPolicy, RetryReason};
pub use error::{Error, Result};
pub use http::{ClientConfig, RequestOptions, RestClient, ThrottleConfig};
pub use metrics::MetricsSnapshot;
pub use pagination::{PageCursor, Pager, Termination};
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
