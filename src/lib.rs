//! balancer-manager - Client for Apache mod_proxy_balancer's management console
//!
//! Reads cluster and route state from the `balancer-manager` HTML page,
//! changes route status flags through the page's nonce-protected form, and
//! polls several consoles concurrently.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`transport`] - HTTP session per endpoint (auth, cookies, TLS policy)
//! - [`parser`] - Version detection and page scraping
//! - [`models`] - Clusters, routes and snapshots
//! - [`mutation`] - Status change form protocol
//! - [`client`] - Per-endpoint facade tying the above together
//! - [`poll`] - Concurrent fan-out over several endpoints
//! - [`validate`] - Expected-status profiles and enforcement
//! - [`config`] - Endpoint and poll configuration
//! - [`logging`] - tracing subscriber setup
//!
//! # Example
//!
//! ```no_run
//! use balancer_manager::config::PollConfig;
//! use balancer_manager::poll::Poller;
//!
//! #[tokio::main]
//! async fn main() -> balancer_manager::Result<()> {
//!     let config = PollConfig::from_env()?;
//!     balancer_manager::logging::init(&config.logging)?;
//!
//!     let result = Poller::from_config(&config)?.poll().await?;
//!     for route in &result.routes {
//!         println!("{} {} {:?}", route.cluster.name, route.name, route.status);
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod mutation;
pub mod parser;
pub mod poll;
pub mod transport;
pub mod utils;
pub mod validate;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::client::Client;
    pub use crate::config::{EndpointConfig, LoggingConfig, PollConfig};
    pub use crate::error::{BalancerErrorTrait, Error, ErrorCategory, Result};
    pub use crate::models::{Cluster, Route, RouteStatus, Snapshot, StatusFlag};
    pub use crate::mutation::StatusUpdate;
    pub use crate::poll::{poll, poll_strict, PollResult, Poller};
    pub use crate::validate::{Profile, ValidationReport};
}

// Direct re-exports for convenience
pub use client::Client;
pub use config::{EndpointConfig, PollConfig};
pub use error::{Error, Result};
pub use models::{Cluster, EndpointInfo, Route, RouteStatus, Snapshot, StatusFlag};
pub use mutation::StatusUpdate;
pub use parser::ApacheVersion;
