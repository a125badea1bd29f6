//! HTTP client module
//!
//! The `RestClient` orchestrates one logical call: attach auth, execute,
//! classify the response, and drive the credential provider and retry
//! policy to recover in place. An optional client-side token bucket can
//! slow requests down before the server ever has to say 429.

mod client;
mod throttle;

pub use client::{ClientConfig, ClientConfigBuilder, RequestOptions, RestClient};
pub use throttle::{Throttle, ThrottleConfig};

#[cfg(test)]
mod tests;
