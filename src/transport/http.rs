//! reqwest-backed transport
//!
//! One [`HttpTransport`] owns one `reqwest::Client` and therefore one cookie
//! jar and connection pool. Basic auth, timeout, user agent and the TLS
//! verification switch come from the endpoint's [`EndpointConfig`].

use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT},
    Client, RequestBuilder, Response,
};

use crate::config::EndpointConfig;
use crate::logging::INSECURE_TARGET;
use crate::transport::Transport;
use crate::utils::error::{TransportError, TransportErrorKind};

/// HTTP session for one balancer-manager endpoint
pub struct HttpTransport {
    /// HTTP client with configured timeout, cookies and TLS policy
    client: Client,

    /// Basic auth pair attached to every request
    credentials: Option<(String, String)>,

    verify_tls: bool,
}

impl HttpTransport {
    /// Create a transport for `config`
    ///
    /// Nothing is sent; reachability is only discovered by the first request.
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the HTTP client cannot be created
    pub fn new(config: &EndpointConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .default_headers(Self::build_headers())
            .timeout(config.timeout())
            .cookie_store(true)
            .gzip(true)
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()?;

        Ok(Self {
            client,
            credentials: config
                .credentials()
                .map(|(user, pass)| (user.to_string(), pass.to_string())),
            verify_tls: config.verify_tls,
        })
    }

    fn build_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
        );
        headers
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Some((user, pass)) => request.basic_auth(user, Some(pass)),
            None => request,
        }
    }

    async fn execute(
        &self,
        method: &str,
        url: &str,
        request: RequestBuilder,
    ) -> Result<String, TransportError> {
        if !self.verify_tls {
            tracing::warn!(
                target: INSECURE_TARGET,
                method,
                url,
                "TLS certificate verification is disabled for this request"
            );
        }

        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(method, url, &e))?;

        Self::read_body(method, url, response).await
    }

    async fn read_body(
        method: &str,
        url: &str,
        response: Response,
    ) -> Result<String, TransportError> {
        let status = response.status();
        if !status.is_success() {
            tracing::debug!(method, url, status = status.as_u16(), "Request rejected");
            return Err(TransportError::new(
                method,
                url,
                TransportErrorKind::Status(status.as_u16()),
            ));
        }

        response
            .text()
            .await
            .map_err(|e| TransportError::from_reqwest(method, url, &e))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, url: &str) -> Result<String, TransportError> {
        tracing::debug!(url = %url, "Fetching balancer-manager page");
        self.execute("GET", url, self.client.get(url)).await
    }

    async fn submit(&self, url: &str, form: &[(&str, String)]) -> Result<String, TransportError> {
        tracing::debug!(url = %url, fields = form.len(), "Posting balancer-manager form");
        self.execute("POST", url, self.client.post(url).form(form)).await
    }
}
