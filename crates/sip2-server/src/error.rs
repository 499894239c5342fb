//! Server error types.

use thiserror::Error;

/// Server error type.
#[derive(Error, Debug)]
pub enum ServerError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid server settings
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using ServerError.
pub type ServerResult<T> = Result<T, ServerError>;
