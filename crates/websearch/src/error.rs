//! Error types for search operations.

use thiserror::Error;

/// Errors that can occur when calling the search service.
#[derive(Debug, Error)]
pub enum SearchError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Service returned a non-success status.
    #[error("search API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}
