//! Unified error handling for the balancer-manager crate
//!
//! This module provides a unified error type that wraps the leaf errors of
//! the transport and parsing layers together with the protocol-level
//! failures of the mutation and polling operations.
//!
//! # Architecture
//!
//! - [`BalancerErrorTrait`] - Common interface implemented by all error types
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum
//!
//! # Usage
//!
//! ```rust,ignore
//! use balancer_manager::error::{BalancerErrorTrait, Error};
//!
//! fn handle_error(err: Error) {
//!     if err.is_recoverable() {
//!         println!("Retrying: {err}");
//!     } else {
//!         eprintln!("Giving up: {err}");
//!     }
//! }
//! ```

use std::fmt;
use thiserror::Error;

use crate::models::StatusFlag;
use crate::validate::ValidationReport;

pub use crate::utils::error::{ParseError, TransportError, TransportErrorKind};

/// Common trait for all balancer-manager error types
pub trait BalancerErrorTrait: std::error::Error {
    /// Check if this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// HTTP status, connection and timeout failures
    Network,
    /// The page is not a balancer-manager page, or a field is malformed
    Parsing,
    /// The server version or route state does not allow the operation
    Capability,
    /// Configuration and validation errors
    Config,
    /// Other/unknown errors
    Other,
}

impl BalancerErrorTrait for TransportError {
    fn is_recoverable(&self) -> bool {
        true
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Network
    }
}

impl BalancerErrorTrait for ParseError {
    fn is_recoverable(&self) -> bool {
        false
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Parsing
    }
}

/// One failed endpoint of a poll
#[derive(Error, Debug)]
#[error("{url}: {error}")]
pub struct EndpointError {
    /// Balancer-manager URL of the endpoint
    pub url: String,

    /// What went wrong there
    #[source]
    pub error: Error,
}

/// Aggregate of per-endpoint failures
#[derive(Debug, Default)]
pub struct MultipleErrors {
    pub errors: Vec<EndpointError>,
}

impl fmt::Display for MultipleErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} endpoints failed", self.errors.len())?;
        for err in &self.errors {
            write!(f, "; {err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for MultipleErrors {}

impl MultipleErrors {
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EndpointError> {
        self.errors.iter()
    }
}

/// Unified error type for the balancer-manager crate
#[derive(Error, Debug)]
pub enum Error {
    /// Non-2xx status, connection failure or timeout
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Unrecognized page or malformed field
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// The detected server version does not allow this flag to be changed
    #[error("changing {flag} is not supported in apache {version}")]
    UnsupportedOperation { version: String, flag: StatusFlag },

    /// Mutation attempted against a route without a session nonce
    #[error("route '{route}' in cluster '{cluster}' has no session nonce")]
    MissingNonce { cluster: String, route: String },

    /// A correction failed after earlier corrections were already posted
    #[error("enforcement stopped after {} corrections: {source}", .applied.len())]
    PartialEnforcement {
        /// Report as it was before enforcement
        report: ValidationReport,

        /// `(cluster, route)` pairs whose corrections were posted
        applied: Vec<(String, String)>,

        #[source]
        source: Box<Error>,
    },

    /// Several endpoints failed in the same poll
    #[error("{0}")]
    Multiple(#[from] MultipleErrors),

    /// HTTP client construction errors
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl BalancerErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_recoverable(),
            Self::Parse(e) => e.is_recoverable(),
            Self::UnsupportedOperation { .. } | Self::MissingNonce { .. } => false,
            Self::PartialEnforcement { source, .. } => source.is_recoverable(),
            Self::Multiple(m) => !m.is_empty() && m.iter().all(|e| e.error.is_recoverable()),
            Self::Http(_) => true,
            Self::Json(_) => false,
            Self::Config(_) => false,
            Self::Other { .. } => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Transport(_) | Self::Http(_) => ErrorCategory::Network,
            Self::Parse(_) | Self::Json(_) => ErrorCategory::Parsing,
            Self::UnsupportedOperation { .. } | Self::MissingNonce { .. } => {
                ErrorCategory::Capability
            }
            Self::Config(_) => ErrorCategory::Config,
            Self::PartialEnforcement { source, .. } => source.category(),
            Self::Multiple(_) | Self::Other { .. } => ErrorCategory::Other,
        }
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a generic error with context
    pub fn other(context: impl Into<String>) -> Self {
        Self::Other {
            context: context.into(),
            source: None,
        }
    }

    /// HTTP status code carried by a transport error
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport(e) => e.status(),
            Self::PartialEnforcement { source, .. } => source.status(),
            _ => None,
        }
    }
}

// Conversion from anyhow::Error
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other {
            context: format!("{err:#}"),
            source: None,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn unauthorized() -> TransportError {
        TransportError::new("GET", "http://a/", TransportErrorKind::Status(401))
    }

    #[test]
    fn test_error_category() {
        let err = Error::Transport(unauthorized());
        assert_eq!(err.category(), ErrorCategory::Network);

        let err = Error::Parse(ParseError::NotBalancerManager);
        assert_eq!(err.category(), ErrorCategory::Parsing);

        let err = Error::MissingNonce {
            cluster: "c".to_string(),
            route: "r".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Capability);
    }

    #[test]
    fn test_is_recoverable() {
        assert!(Error::Transport(unauthorized()).is_recoverable());
        assert!(!Error::Parse(ParseError::NotBalancerManager).is_recoverable());
        assert!(!Error::config("bad url").is_recoverable());
    }

    #[test]
    fn test_unsupported_operation_message() {
        let err = Error::UnsupportedOperation {
            version: "2.2.34".to_string(),
            flag: StatusFlag::DrainingMode,
        };
        assert_eq!(
            err.to_string(),
            "changing status_draining_mode is not supported in apache 2.2.34"
        );
    }

    #[test]
    fn test_multiple_errors_recoverability() {
        let all_transport = MultipleErrors {
            errors: vec![
                EndpointError {
                    url: "http://a/".to_string(),
                    error: Error::Transport(unauthorized()),
                },
                EndpointError {
                    url: "http://b/".to_string(),
                    error: Error::Transport(unauthorized()),
                },
            ],
        };
        let err = Error::Multiple(all_transport);
        assert!(err.is_recoverable());
        assert!(err.to_string().starts_with("2 endpoints failed"));

        let mixed = Error::Multiple(MultipleErrors {
            errors: vec![EndpointError {
                url: "http://c/".to_string(),
                error: Error::Parse(ParseError::NotBalancerManager),
            }],
        });
        assert!(!mixed.is_recoverable());
    }

    #[test]
    fn test_partial_enforcement_follows_its_source() {
        let err = Error::PartialEnforcement {
            report: ValidationReport::default(),
            applied: vec![("web".to_string(), "node1".to_string())],
            source: Box::new(Error::Transport(unauthorized())),
        };

        assert_eq!(err.status(), Some(401));
        assert_eq!(err.category(), ErrorCategory::Network);
        assert!(err.is_recoverable());
        assert!(err
            .to_string()
            .starts_with("enforcement stopped after 1 corrections: "));
    }

    #[test]
    fn test_status_passthrough() {
        assert_eq!(Error::Transport(unauthorized()).status(), Some(401));
        assert_eq!(Error::other("x").status(), None);
    }
}
