//! HTTP transport to a balancer-manager endpoint
//!
//! [`Transport`] is the seam between the protocol logic and the network.
//! [`HttpTransport`] is the reqwest-backed implementation holding one
//! persistent session per endpoint.

pub mod http;

pub use http::HttpTransport;

use async_trait::async_trait;

use crate::utils::error::TransportError;

/// GET and form-POST against one endpoint's session
///
/// Implementations never retry; a failed request is reported once and the
/// caller decides what to do.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch `url` and return the response body
    async fn fetch(&self, url: &str) -> Result<String, TransportError>;

    /// POST `form` URL-encoded to `url` and return the response body
    async fn submit(&self, url: &str, form: &[(&str, String)]) -> Result<String, TransportError>;
}
