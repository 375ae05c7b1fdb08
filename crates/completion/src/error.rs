//! Error types for completion operations.

use thiserror::Error;

/// Errors that can occur when calling the completion service.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Service returned a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response carried no usable content.
    #[error("no content in completion response")]
    EmptyResponse,

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}
