// Error types for HotKV
//
// This module defines the error types used throughout the store.

use thiserror::Error;

/// Result type alias for HotKV operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in HotKV operations
#[derive(Error, Debug)]
pub enum Error {
    /// Backend-layer errors (PostgreSQL)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Connection pool errors
    #[error("Pool error: {0}")]
    Pool(String),

    /// No session became idle within the caller's deadline
    #[error("Timed out waiting for a pooled session")]
    PoolTimeout,

    /// Key absent in both cache and backend
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True when the error maps to a client-side (4xx) HTTP status
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::NotFound(_) | Error::InvalidInput(_))
    }
}

impl From<postgres::Error> for Error {
    fn from(err: postgres::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_are_flagged() {
        assert!(Error::NotFound("k".into()).is_client_error());
        assert!(Error::InvalidInput("missing key".into()).is_client_error());
        assert!(!Error::Storage("connection refused".into()).is_client_error());
        assert!(!Error::PoolTimeout.is_client_error());
    }

    #[test]
    fn test_display_includes_detail() {
        let err = Error::Storage("connection refused".into());
        assert!(err.to_string().contains("connection refused"));
    }
}
