//! Authentication module
//!
//! Supports: no auth, static API key header, OAuth2 client credentials
//! with automatic token refresh.
//!
//! The `CredentialProvider` handles all auth variants and manages the
//! cached access token for the refreshing variant.

mod provider;
mod token;

pub use provider::{AuthConfig, CredentialProvider, DEFAULT_API_KEY_HEADER};
pub use token::{AccessToken, DEFAULT_EXPIRES_IN_SECS, DEFAULT_REFRESH_BUFFER_SECS};
