//! Balancer-manager client for a single endpoint
//!
//! A [`Client`] owns one transport session and runs the read path (fetch,
//! detect version, parse, build) and the write path (status changes) for
//! one balancer-manager page.
//!
//! # Example
//!
//! ```no_run
//! use balancer_manager::{Client, EndpointConfig, StatusUpdate};
//!
//! #[tokio::main]
//! async fn main() -> balancer_manager::Result<()> {
//!     let client = Client::new(EndpointConfig::new("http://lb/balancer-manager"))?;
//!     if let Some(mut route) = client.find_route("mycluster", "node1").await? {
//!         client
//!             .change_status(&mut route, &StatusUpdate::new().disabled(true))
//!             .await?;
//!     }
//!     Ok(())
//! }
//! ```

use chrono::{DateTime, Utc};
use scraper::Html;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::config::EndpointConfig;
use crate::error::{Error, Result};
use crate::models::{builder, Cluster, Route, Snapshot};
use crate::mutation::{self, StatusUpdate};
use crate::parser::{self, ApacheVersion};
use crate::transport::{HttpTransport, Transport};
use crate::validate::{self, Profile, ValidationReport};

/// Client for one balancer-manager endpoint
pub struct Client {
    config: EndpointConfig,
    transport: Arc<dyn Transport>,

    /// Version seen on the most recent fetch
    version: RwLock<Option<ApacheVersion>>,

    /// Timestamp handed to the most recent snapshot
    last_fetched_at: Mutex<Option<DateTime<Utc>>>,
}

impl Client {
    /// Create a client with an HTTP session for `config`
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for an invalid endpoint and `Error::Http` if
    /// the HTTP client cannot be built.
    pub fn new(config: EndpointConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| Error::config(format!("{e:#}")))?;

        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a client on top of an existing transport
    pub fn with_transport(config: EndpointConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            transport,
            version: RwLock::new(None),
            last_fetched_at: Mutex::new(None),
        }
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    /// Check that the endpoint answers with a balancer-manager page
    pub async fn test(&self) -> Result<ApacheVersion> {
        self.detect_version().await
    }

    /// Fetch the page and read the server version from it
    ///
    /// # Errors
    ///
    /// Returns `Error::Transport` if the page cannot be fetched and
    /// `Error::Parse` if it is not a balancer-manager page.
    pub async fn detect_version(&self) -> Result<ApacheVersion> {
        let html = self.transport.fetch(&self.config.url).await?;
        let version = detect_in(&html)?;
        self.remember_version(&version);
        Ok(version)
    }

    /// Version seen on the last fetch, if any
    pub fn apache_version(&self) -> Option<ApacheVersion> {
        self.version
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Compare the server version against a dotted prefix such as `"2.2"`
    ///
    /// Fetches the page first when no version has been seen yet.
    pub async fn apache_version_is(&self, prefix: &str) -> Result<bool> {
        let version = match self.apache_version() {
            Some(version) => version,
            None => self.detect_version().await?,
        };
        Ok(version.is(prefix))
    }

    /// Fetch and parse the page into a fresh snapshot
    ///
    /// # Errors
    ///
    /// Returns `Error::Transport` on HTTP failure and `Error::Parse` if the
    /// page is not a balancer-manager page or a field is malformed.
    pub async fn fetch_snapshot(&self) -> Result<Snapshot> {
        let html = self.transport.fetch(&self.config.url).await?;
        let fetched_at = self.next_fetch_time();

        let raw = parser::parse_page(&html)?;
        self.remember_version(&raw.version);

        let snapshot = builder::build(raw, &self.config.url, fetched_at)?;

        tracing::debug!(
            url = %self.config.url,
            clusters = snapshot.clusters.len(),
            routes = snapshot.routes.len(),
            "Fetched balancer-manager snapshot"
        );

        Ok(snapshot)
    }

    /// All routes of all clusters, in page order
    pub async fn get_routes(&self) -> Result<Vec<Route>> {
        Ok(self.fetch_snapshot().await?.into_routes())
    }

    /// All clusters, in page order
    pub async fn get_clusters(&self) -> Result<Vec<Arc<Cluster>>> {
        Ok(self.fetch_snapshot().await?.clusters)
    }

    /// Fresh copy of one route, looked up by cluster and route name
    pub async fn find_route(&self, cluster: &str, route: &str) -> Result<Option<Route>> {
        let snapshot = self.fetch_snapshot().await?;
        Ok(snapshot.route(cluster, route).cloned())
    }

    /// Change status flags of `route`
    ///
    /// Flags not named in `update` keep their current value. On success the
    /// route's in-memory flags are updated; the page is not re-fetched, so
    /// callers that need the server's view fetch again.
    ///
    /// # Errors
    ///
    /// - `Error::Config` if `route` was read from another endpoint
    /// - `Error::UnsupportedOperation` if the server version forbids a flag
    /// - `Error::MissingNonce` if the route has no session nonce
    /// - `Error::Transport` if the POST fails
    pub async fn change_status(&self, route: &mut Route, update: &StatusUpdate) -> Result<()> {
        if !route.belongs_to(&self.config.url) {
            return Err(Error::config(format!(
                "route '{}' was read from {}, not {}",
                route.name, route.endpoint.url, self.config.url
            )));
        }

        if update.is_empty() {
            tracing::debug!(route = %route.name, "Empty status update; nothing to post");
            return Ok(());
        }

        mutation::check_supported(&route.endpoint.version, update)?;
        let target = mutation::merge(&route.status, update);
        let form = mutation::build_form(route, &target)?;

        self.transport.submit(&self.config.url, &form).await?;

        tracing::info!(
            url = %self.config.url,
            cluster = %route.cluster.name,
            route = %route.name,
            update = ?update,
            "Route status changed"
        );

        route.status = target;
        Ok(())
    }

    /// Bring live route flags in line with `profile`
    ///
    /// Returns the report as it was before enforcement. Routes listed in the
    /// profile but absent from the page are reported, not created.
    ///
    /// Every correction is checked against the server version and the
    /// route's nonce before anything is posted.
    ///
    /// # Errors
    ///
    /// - `Error::UnsupportedOperation` or `Error::MissingNonce` if any
    ///   correction cannot be posted; nothing is sent in that case
    /// - `Error::PartialEnforcement` if a POST fails after earlier ones
    ///   succeeded, carrying the report and the routes already changed
    /// - the POST error itself if the first POST fails
    pub async fn enforce(&self, profile: &Profile) -> Result<ValidationReport> {
        let snapshot = self.fetch_snapshot().await?;
        let report = validate::validate(&snapshot, profile);

        let mut routes = snapshot.into_routes();
        let mut planned = Vec::new();
        for (cluster, name, update) in report.corrections() {
            let Some(index) = routes
                .iter()
                .position(|r| r.cluster.name == cluster && r.name == name)
            else {
                continue;
            };

            let route = &routes[index];
            mutation::check_supported(&route.endpoint.version, &update)?;
            mutation::build_form(route, &mutation::merge(&route.status, &update))?;
            planned.push((index, update));
        }

        let mut applied = Vec::with_capacity(planned.len());
        for (index, update) in planned {
            let route = &mut routes[index];
            if let Err(error) = self.change_status(route, &update).await {
                if applied.is_empty() {
                    return Err(error);
                }

                tracing::warn!(
                    url = %self.config.url,
                    applied = applied.len(),
                    error = %error,
                    "Profile enforcement stopped part way"
                );
                return Err(Error::PartialEnforcement {
                    report,
                    applied,
                    source: Box::new(error),
                });
            }
            applied.push((route.cluster.name.clone(), route.name.clone()));
        }

        Ok(report)
    }

    fn remember_version(&self, version: &ApacheVersion) {
        *self
            .version
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(version.clone());
    }

    /// Current time, bumped past the previous fetch if the clock has not moved
    fn next_fetch_time(&self) -> DateTime<Utc> {
        let mut last = self
            .last_fetched_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut now = Utc::now();
        if let Some(previous) = *last {
            if now <= previous {
                now = previous + chrono::Duration::microseconds(1);
            }
        }

        *last = Some(now);
        now
    }
}

fn detect_in(html: &str) -> std::result::Result<ApacheVersion, crate::error::ParseError> {
    parser::detect(&Html::parse_document(html))
}
