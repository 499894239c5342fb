//! Error types for backend calls.

use thiserror::Error;

/// Error returned by a [`crate::ResourceProvider`].
///
/// Repositories never surface these to the terminal; they degrade to a
/// negative business response.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Network or transport-level HTTP error from reqwest.
    ///
    /// Includes connection failures, timeouts, and TLS errors.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success HTTP status.
    #[error("Backend error: {status} - {message}")]
    Status {
        /// The HTTP status code returned by the backend.
        status: u16,
        /// The response body, typically containing error details.
        message: String,
    },

    /// The response body was not the JSON the caller expected.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Client construction failed.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience Result type alias for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;
