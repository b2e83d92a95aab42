//! Error types for the query layer
//!
//! Provides unified error handling using thiserror. Each variant maps to an
//! [`ErrorKind`] which drives the retry policy.

use thiserror::Error;

// == Error Kind ==
/// Coarse classification used to decide whether a failed fetch is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Timeouts and connectivity failures, eligible for retry
    Transient,
    /// Malformed input or a definitive backend answer, never retried
    Logical,
    /// Anything else, surfaced after a single attempt
    Unknown,
}

// == Query Error Enum ==
/// Unified error type for cache lookups, remote fetches and filter composition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The transport gave up waiting for the backend
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Connection could not be established or was dropped
    #[error("Network error: {0}")]
    Network(String),

    /// Backend answered with a temporary failure (502, 503, 504)
    #[error("Backend unavailable (status {0})")]
    Unavailable(u16),

    /// Requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Filter name or value cannot be turned into a request
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// Backend refused the request
    #[error("Request rejected (status {status}): {message}")]
    Rejected { status: u16, message: String },

    /// Response body did not have the expected shape
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Unclassified failure
    #[error("Unexpected error: {0}")]
    Unknown(String),
}

impl QueryError {
    // == Kind ==
    /// Returns the retry classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            QueryError::Timeout(_) | QueryError::Network(_) | QueryError::Unavailable(_) => {
                ErrorKind::Transient
            }
            QueryError::NotFound(_)
            | QueryError::InvalidFilter(_)
            | QueryError::Rejected { .. } => ErrorKind::Logical,
            QueryError::Decode(_) | QueryError::Unknown(_) => ErrorKind::Unknown,
        }
    }

    /// True when the retry policy may try again after this error.
    pub fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }

    // == From Status ==
    /// Builds an error from a non-success HTTP status and its body.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            404 => QueryError::NotFound(message),
            408 => QueryError::Timeout(message),
            502..=504 => QueryError::Unavailable(status),
            400..=499 => QueryError::Rejected { status, message },
            _ => QueryError::Unknown(format!("status {}: {}", status, message)),
        }
    }
}

// == Transport Conversion ==
impl From<reqwest::Error> for QueryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            QueryError::Timeout(err.to_string())
        } else if err.is_connect() || err.is_request() {
            QueryError::Network(err.to_string())
        } else if err.is_decode() {
            QueryError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            QueryError::from_status(status.as_u16(), err.to_string())
        } else {
            QueryError::Unknown(err.to_string())
        }
    }
}

impl From<serde_json::Error> for QueryError {
    fn from(err: serde_json::Error) -> Self {
        QueryError::Decode(err.to_string())
    }
}

// == Result Type Alias ==
/// Convenience Result type for the query layer.
pub type Result<T> = std::result::Result<T, QueryError>;
