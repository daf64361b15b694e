//! Common error types for callbridge

use thiserror::Error;

/// Common result type for callbridge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the callbridge crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Upstream telephony API failure (network, auth, unexpected status)
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Downstream record store failure (query or write)
    #[error("Store error: {0}")]
    Store(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
