//! Concurrent polling of several balancer-manager endpoints
//!
//! Every client fetches its page concurrently; results come back in client
//! order. A failing endpoint does not stop the others: its error is kept
//! next to the routes of the endpoints that answered.

use futures::future::join_all;

use crate::client::Client;
use crate::config::PollConfig;
use crate::error::{EndpointError, Error, MultipleErrors, Result};
use crate::models::Route;

/// Routes gathered from every endpoint that answered
#[derive(Debug, Default)]
pub struct PollResult {
    /// Routes of all endpoints, concatenated in client order
    pub routes: Vec<Route>,

    /// Endpoints that failed, in client order
    pub errors: Vec<EndpointError>,
}

impl PollResult {
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Fold per-endpoint failures into one error: itself when alone
fn collapse(mut errors: Vec<EndpointError>) -> Error {
    if errors.len() == 1 {
        if let Some(only) = errors.pop() {
            return only.error;
        }
    }
    Error::Multiple(MultipleErrors { errors })
}

async fn gather(clients: &[Client]) -> PollResult {
    let outcomes = join_all(clients.iter().map(|client| client.get_routes())).await;

    let mut result = PollResult::default();
    for (client, outcome) in clients.iter().zip(outcomes) {
        match outcome {
            Ok(routes) => result.routes.extend(routes),
            Err(error) => {
                tracing::warn!(url = %client.url(), error = %error, "Endpoint poll failed");
                result.errors.push(EndpointError {
                    url: client.url().to_string(),
                    error,
                });
            }
        }
    }

    tracing::debug!(
        endpoints = clients.len(),
        routes = result.routes.len(),
        failed = result.errors.len(),
        "Poll finished"
    );

    result
}

/// Poll every client concurrently
///
/// Partial failure is reported in [`PollResult::errors`].
///
/// # Errors
///
/// Fails only when every endpoint failed: with that endpoint's error if
/// there was one, with `Error::Multiple` otherwise.
pub async fn poll(clients: &[Client]) -> Result<PollResult> {
    let result = gather(clients).await;

    if !clients.is_empty() && result.errors.len() == clients.len() {
        return Err(collapse(result.errors));
    }
    Ok(result)
}

/// Poll every client concurrently, failing if any endpoint fails
pub async fn poll_strict(clients: &[Client]) -> Result<Vec<Route>> {
    let result = gather(clients).await;

    if !result.errors.is_empty() {
        return Err(collapse(result.errors));
    }
    Ok(result.routes)
}

/// A fixed set of clients polled together
pub struct Poller {
    clients: Vec<Client>,
    strict: bool,
}

impl Poller {
    pub fn new(clients: Vec<Client>) -> Self {
        Self {
            clients,
            strict: false,
        }
    }

    /// Build one client per configured endpoint
    pub fn from_config(config: &PollConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| Error::config(format!("{e:#}")))?;

        let clients = config
            .endpoints
            .iter()
            .cloned()
            .map(Client::new)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            clients,
            strict: config.strict,
        })
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn clients(&self) -> &[Client] {
        &self.clients
    }

    /// Poll all clients, honoring strict mode
    pub async fn poll(&self) -> Result<PollResult> {
        if self.strict {
            let routes = poll_strict(&self.clients).await?;
            Ok(PollResult {
                routes,
                errors: Vec::new(),
            })
        } else {
            poll(&self.clients).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EndpointConfig;
    use crate::error::{ParseError, TransportError, TransportErrorKind};
    use crate::transport::Transport;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct Down;

    #[async_trait]
    impl Transport for Down {
        async fn fetch(&self, url: &str) -> std::result::Result<String, TransportError> {
            Err(TransportError::new("GET", url, TransportErrorKind::Status(503)))
        }

        async fn submit(
            &self,
            url: &str,
            _form: &[(&str, String)],
        ) -> std::result::Result<String, TransportError> {
            Err(TransportError::new("POST", url, TransportErrorKind::Status(503)))
        }
    }

    struct NotAConsole;

    #[async_trait]
    impl Transport for NotAConsole {
        async fn fetch(&self, _url: &str) -> std::result::Result<String, TransportError> {
            Ok("<html><body>It works!</body></html>".to_string())
        }

        async fn submit(
            &self,
            _url: &str,
            _form: &[(&str, String)],
        ) -> std::result::Result<String, TransportError> {
            Ok(String::new())
        }
    }

    fn client(url: &str, transport: impl Transport + 'static) -> Client {
        Client::with_transport(EndpointConfig::new(url), Arc::new(transport))
    }

    #[tokio::test]
    async fn test_no_clients_is_empty_success() {
        let result = poll(&[]).await.unwrap();
        assert!(result.routes.is_empty());
        assert!(result.is_complete());
    }

    #[tokio::test]
    async fn test_single_failure_is_returned_as_is() {
        let err = poll(&[client("http://a/balancer-manager", Down)])
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(503));
    }

    #[tokio::test]
    async fn test_all_failures_are_aggregated() {
        let clients = [
            client("http://a/balancer-manager", Down),
            client("http://b/balancer-manager", NotAConsole),
        ];

        match poll(&clients).await.unwrap_err() {
            Error::Multiple(multiple) => {
                assert_eq!(multiple.len(), 2);
                assert_eq!(multiple.errors[0].url, "http://a/balancer-manager");
                assert!(matches!(
                    multiple.errors[1].error,
                    Error::Parse(ParseError::NotBalancerManager)
                ));
            }
            other => panic!("expected Multiple, got {other:?}"),
        }
    }

    #[test]
    fn test_from_config_rejects_empty_endpoint_list() {
        let config = PollConfig::default();
        assert!(matches!(Poller::from_config(&config), Err(Error::Config(_))));
    }
}
