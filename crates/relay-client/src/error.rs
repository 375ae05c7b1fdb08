//! Error types for relay-client.

use thiserror::Error;

/// Errors that can occur when talking to the signaling relay.
#[derive(Debug, Error)]
pub enum RelayError {
    /// WebSocket transport error.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// JSON encoding/decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Frame carried an event name this client does not know.
    #[error("unknown relay event: {0}")]
    UnknownEvent(String),

    /// The connection manager has shut down.
    #[error("relay connection closed")]
    Closed,

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}
