//! Client for the call-signaling relay.
//!
//! The relay is the always-on intermediary that forwards call-signaling
//! events between clients that cannot address each other directly. This
//! crate maintains one persistent WebSocket connection to it, registers
//! the local identity on every (re)connection, and fans incoming events
//! out to subscribers.
//!
//! Consumers depend on the [`RelayHandle`] trait rather than the concrete
//! [`RelayClient`], so call logic can be driven by in-memory doubles.

mod config;
mod connection;
mod error;
mod events;

pub use config::{ReconnectConfig, RelayConfig};
pub use connection::{RelayClient, RelayHandle};
pub use error::RelayError;
pub use events::{ClientEvent, IceCandidate, Identity, Role, ServerEvent, SessionDescription};

pub use async_trait::async_trait;
