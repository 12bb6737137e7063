//! Configuration management for balancer-manager clients
//!
//! This module handles loading and validating endpoint configuration from
//! environment variables and TOML files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

fn default_verify_tls() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    format!("balancer-manager/{}", env!("CARGO_PKG_VERSION"))
}

/// Connection settings for one balancer-manager page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Full URL of the balancer-manager page
    pub url: String,

    /// Verify the server's TLS certificate
    #[serde(default = "default_verify_tls")]
    pub verify_tls: bool,

    /// Basic auth username (optional)
    #[serde(default)]
    pub username: Option<String>,

    /// Basic auth password (optional)
    #[serde(default)]
    pub password: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User agent string
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl EndpointConfig {
    /// Create a config with default settings for `url`
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            verify_tls: true,
            username: None,
            password: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: default_user_agent(),
        }
    }

    /// Set basic auth credentials
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs().max(1);
        self
    }

    /// Set user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Skip TLS certificate verification
    pub fn insecure(mut self) -> Self {
        self.verify_tls = false;
        self
    }

    /// Basic auth pair, when both halves are configured
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some((user.as_str(), pass.as_str())),
            _ => None,
        }
    }

    /// Get request timeout as Duration
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let parsed = url::Url::parse(&self.url)
            .with_context(|| format!("Invalid balancer-manager URL: {}", self.url))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("URL scheme must be http or https: {}", self.url);
        }

        if self.timeout_secs == 0 {
            anyhow::bail!("timeout_secs must be greater than 0");
        }

        if self.username.is_some() != self.password.is_some() {
            anyhow::bail!("username and password must be set together");
        }

        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,

    /// Drop the per-request warning emitted when TLS verification is off
    #[serde(default)]
    pub suppress_insecure_warnings: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
            suppress_insecure_warnings: false,
        }
    }
}

/// Configuration for polling a set of endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Endpoints to poll, in result order
    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,

    /// Fail the whole poll when any endpoint fails
    #[serde(default)]
    pub strict: bool,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl PollConfig {
    /// Load configuration from environment variables
    ///
    /// `BALANCER_MANAGER_URLS` holds a comma-separated list of URLs; the
    /// remaining variables apply to every endpoint.
    pub fn from_env() -> Result<Self> {
        let urls = std::env::var("BALANCER_MANAGER_URLS")
            .context("BALANCER_MANAGER_URLS is not set")?;

        let username = std::env::var("BALANCER_MANAGER_USERNAME").ok();
        let password = std::env::var("BALANCER_MANAGER_PASSWORD").ok();

        let insecure = std::env::var("BALANCER_MANAGER_INSECURE")
            .ok()
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let timeout_secs = std::env::var("BALANCER_MANAGER_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let strict = std::env::var("BALANCER_MANAGER_STRICT")
            .ok()
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let log_level =
            std::env::var("BALANCER_MANAGER_LOG_LEVEL").unwrap_or_else(|_| String::from("info"));

        let log_format =
            std::env::var("BALANCER_MANAGER_LOG_FORMAT").unwrap_or_else(|_| String::from("text"));

        let endpoints = urls
            .split(',')
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(|url| EndpointConfig {
                url: url.to_string(),
                verify_tls: !insecure,
                username: username.clone(),
                password: password.clone(),
                timeout_secs,
                user_agent: default_user_agent(),
            })
            .collect();

        Ok(Self {
            endpoints,
            strict,
            logging: LoggingConfig {
                level: log_level,
                format: log_format,
                suppress_insecure_warnings: insecure,
            },
        })
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.endpoints.is_empty() {
            anyhow::bail!("at least one endpoint must be configured");
        }

        for endpoint in &self.endpoints {
            endpoint
                .validate()
                .with_context(|| format!("Invalid endpoint: {}", endpoint.url))?;
        }

        Ok(())
    }
}
