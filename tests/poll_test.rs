//! Polling integration tests
//!
//! Several mock consoles polled concurrently, with and without failures.

mod common;

use balancer_manager::config::PollConfig;
use balancer_manager::poll::{poll, poll_strict, Poller};
use balancer_manager::error::TransportErrorKind;
use balancer_manager::{Client, EndpointConfig, Error};
use common::{console_url, load_fixture, serve_page, serve_status, CONSOLE_PATH};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> Client {
    Client::new(EndpointConfig::new(console_url(server))).unwrap()
}

/// Test routes from every endpoint are concatenated in client order
#[tokio::test]
async fn test_poll_two_endpoints() {
    let modern = serve_page(load_fixture("balancer_manager_2_4.html")).await;
    let legacy = serve_page(load_fixture("balancer_manager_2_2.html")).await;
    let clients = [client_for(&modern), client_for(&legacy)];

    let result = poll(&clients).await.unwrap();

    assert!(result.is_complete());
    assert_eq!(result.routes.len(), 5);

    let owners: Vec<&str> = result
        .routes
        .iter()
        .map(|r| r.endpoint.url.as_str())
        .collect();
    let modern_url = console_url(&modern);
    let legacy_url = console_url(&legacy);
    assert_eq!(
        owners,
        vec![
            modern_url.as_str(),
            modern_url.as_str(),
            modern_url.as_str(),
            legacy_url.as_str(),
            legacy_url.as_str(),
        ]
    );

    assert_eq!(result.routes[3].endpoint.version.as_str(), "2.2.34");
}

/// Test one failing endpoint does not hide the others
#[tokio::test]
async fn test_poll_partial_failure() {
    let healthy = serve_page(load_fixture("balancer_manager_2_4.html")).await;
    let broken = serve_status(500).await;
    let clients = [client_for(&broken), client_for(&healthy)];

    let result = poll(&clients).await.unwrap();

    assert_eq!(result.routes.len(), 3);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].url, console_url(&broken));
    assert_eq!(result.errors[0].error.status(), Some(500));
}

/// Test every endpoint failing yields an aggregated error
#[tokio::test]
async fn test_poll_all_fail() {
    let first = serve_status(500).await;
    let second = serve_page(load_fixture("not_balancer_manager.html")).await;
    let clients = [client_for(&first), client_for(&second)];

    match poll(&clients).await {
        Err(Error::Multiple(errors)) => {
            assert_eq!(errors.len(), 2);
            assert_eq!(errors.errors[0].url, console_url(&first));
            assert!(matches!(errors.errors[1].error, Error::Parse(_)));
        }
        other => panic!("expected Error::Multiple, got {other:?}"),
    }
}

/// Test strict polling fails on any endpoint failure
#[tokio::test]
async fn test_poll_strict() {
    let healthy = serve_page(load_fixture("balancer_manager_2_4.html")).await;
    let broken = serve_status(502).await;

    let routes = poll_strict(&[client_for(&healthy)]).await.unwrap();
    assert_eq!(routes.len(), 3);

    let err = poll_strict(&[client_for(&healthy), client_for(&broken)])
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(502));
}

/// Test a poller built from configuration honors strict mode
#[tokio::test]
async fn test_poller_from_config() {
    let healthy = serve_page(load_fixture("balancer_manager_2_2.html")).await;
    let broken = serve_status(503).await;

    let mut config = PollConfig {
        endpoints: vec![
            EndpointConfig::new(console_url(&healthy)),
            EndpointConfig::new(console_url(&broken)),
        ],
        ..PollConfig::default()
    };

    let lenient = Poller::from_config(&config).unwrap();
    assert_eq!(lenient.clients().len(), 2);
    let result = lenient.poll().await.unwrap();
    assert_eq!(result.routes.len(), 2);
    assert_eq!(result.errors.len(), 1);

    config.strict = true;
    let strict = Poller::from_config(&config).unwrap();
    assert_eq!(strict.poll().await.unwrap_err().status(), Some(503));
}

/// Test a slow endpoint times out on its own without cancelling the others
#[tokio::test]
async fn test_poll_timeout_is_local() {
    let healthy = serve_page(load_fixture("balancer_manager_2_4.html")).await;
    let slow = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CONSOLE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(load_fixture("balancer_manager_2_4.html"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&slow)
        .await;

    let clients = [
        Client::new(EndpointConfig::new(console_url(&slow)).with_timeout(Duration::from_secs(1)))
            .unwrap(),
        client_for(&healthy),
    ];

    let result = poll(&clients).await.unwrap();

    assert_eq!(result.routes.len(), 3);
    assert!(result.routes.iter().all(|r| r.belongs_to(&console_url(&healthy))));
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].url, console_url(&slow));
    assert!(matches!(
        &result.errors[0].error,
        Error::Transport(e) if e.kind == TransportErrorKind::Timeout
    ));
}
