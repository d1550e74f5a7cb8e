//! Error types for the Noraina API client.
//!
//! # Design
//! Only `Api` carries an answer from the service itself; callers match on it
//! to react to API-level failures. Every other variant wraps the underlying
//! library error unchanged so its details survive for debugging.

use std::collections::BTreeMap;
use std::fmt;

/// Errors returned by every `NorainaClient` operation.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP round-trip failed (connection, I/O, timeout).
    #[error("HTTP transport failed: {0}")]
    Transport(#[from] ureq::Error),

    /// The caller's deadline had already passed before the request was sent.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// The caller cancelled the context before a response arrived.
    #[error("request cancelled")]
    Cancelled,

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// A response body could not be decoded into the expected shape.
    #[error("deserialization failed: {0}")]
    Deserialization(#[source] serde_json::Error),

    /// The service answered with a non-2xx status and a JSON error body.
    #[error(transparent)]
    Api(#[from] ErrorResponse),

    /// The client configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A request path could not be resolved against the base URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ApiError {
    /// Status code of a structured API error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api(e) => Some(e.status_code),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            ApiError::DeadlineExceeded | ApiError::Transport(ureq::Error::Timeout(_))
        )
    }
}

/// A non-2xx response decoded from its JSON body.
///
/// `message` holds the string pairs of the body, e.g. `{"status":"ko"}`.
/// Keys are kept sorted so the rendered error is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorResponse {
    pub status_code: u16,
    pub message: BTreeMap<String, String>,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.message.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}: {value}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorResponse {}
