//! Error types for call sessions.

use thiserror::Error;

use crate::session::CallStatus;

/// Errors that can occur while negotiating or running a call.
#[derive(Debug, Error)]
pub enum CallError {
    /// Media device acquisition failed or was denied.
    #[error("media error: {0}")]
    Media(String),

    /// Peer-connection negotiation step failed.
    #[error("negotiation error: {0}")]
    Negotiation(String),

    /// Signaling relay error.
    #[error("relay error: {0}")]
    Relay(#[from] relay_client::RelayError),

    /// The requested operation is not valid in the current state.
    #[error("cannot {operation} while {status:?}")]
    InvalidState {
        operation: &'static str,
        status: CallStatus,
    },
}
