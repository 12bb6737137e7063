//! Common test utilities

use std::fs;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path the mock consoles are served under
pub const CONSOLE_PATH: &str = "/balancer-manager";

const FIXTURES_DIR: &str = "tests/fixtures/html";

/// Load an HTML fixture by file name
pub fn load_fixture(filename: &str) -> String {
    let path = format!("{FIXTURES_DIR}/{filename}");
    fs::read_to_string(&path).unwrap_or_else(|_| panic!("Failed to load fixture: {path}"))
}

/// Console URL of a mock server
#[allow(dead_code)]
pub fn console_url(server: &MockServer) -> String {
    format!("{}{CONSOLE_PATH}", server.uri())
}

/// Start a mock server answering GET with `html`
#[allow(dead_code)]
pub async fn serve_page(html: String) -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CONSOLE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .mount(&server)
        .await;

    server
}

/// Start a mock server answering every request with `status`
#[allow(dead_code)]
pub async fn serve_status(status: u16) -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(status))
        .mount(&server)
        .await;

    server
}
