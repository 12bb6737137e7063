//! Error types for the transport and parsing layers
//!
//! This module defines the leaf error types raised while talking to a
//! balancer-manager endpoint and while reading its HTML.

use std::fmt;
use thiserror::Error;

/// Why an HTTP exchange failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The server answered with a non-2xx status code
    Status(u16),

    /// The request did not complete within the configured timeout
    Timeout,

    /// The connection could not be established
    Connect(String),

    /// Any other request failure (TLS, body read, redirect loop, ...)
    Request(String),
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(code) if (400..500).contains(code) => {
                write!(f, "{code} Client Error")
            }
            Self::Status(code) if (500..600).contains(code) => {
                write!(f, "{code} Server Error")
            }
            Self::Status(code) => write!(f, "unexpected status {code}"),
            Self::Timeout => write!(f, "request timed out"),
            Self::Connect(reason) => write!(f, "connection failed: {reason}"),
            Self::Request(reason) => write!(f, "request failed: {reason}"),
        }
    }
}

/// Errors that can occur while fetching from or posting to an endpoint
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} for {method} {url}")]
pub struct TransportError {
    /// HTTP method of the failed request
    pub method: String,

    /// Request URL
    pub url: String,

    /// Failure reason
    pub kind: TransportErrorKind,
}

impl TransportError {
    pub fn new(
        method: impl Into<String>,
        url: impl Into<String>,
        kind: TransportErrorKind,
    ) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            kind,
        }
    }

    /// Build a transport error from a reqwest failure
    pub fn from_reqwest(method: &str, url: &str, err: &reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            TransportErrorKind::Timeout
        } else if err.is_connect() {
            TransportErrorKind::Connect(err.to_string())
        } else if let Some(status) = err.status() {
            TransportErrorKind::Status(status.as_u16())
        } else {
            TransportErrorKind::Request(err.to_string())
        };

        Self::new(method, url, kind)
    }

    /// HTTP status code, when the server answered at all
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self.kind {
            TransportErrorKind::Status(code) => Some(code),
            _ => None,
        }
    }
}

/// Errors that can occur while reading a balancer-manager page
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The document has no `Server Version: Apache/...` definition term
    #[error("not a balancer-manager page: could not parse text from the first \"dt\" element")]
    NotBalancerManager,

    /// A field was present but its text could not be converted
    #[error("malformed field '{field}': could not convert {value:?}")]
    InvalidField { field: String, value: String },

    /// A required field was absent
    #[error("malformed row: required field '{field}' is missing")]
    MissingField { field: String },
}

impl ParseError {
    pub fn invalid(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }
}
