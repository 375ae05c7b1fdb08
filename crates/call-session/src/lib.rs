//! Per-client call session state machine.
//!
//! Each client holds at most one call session at a time. The session owns
//! the peer-connection and media-stream handles, buffers ICE candidates
//! that arrive before the peer connection exists, and talks to the peer
//! through a [`relay_client::RelayHandle`].
//!
//! States:
//!
//! ```text
//! Idle -> IncomingRinging -> Negotiating -> Connected -> Idle   (callee)
//! Idle -> Negotiating -> Connected -> Idle                      (caller)
//! any  -> Failed -> Idle                                        (errors)
//! ```
//!
//! `Connected` is only entered once the transport confirms ICE
//! connectivity; an exchanged answer alone keeps the session in
//! `Negotiating`. Hanging up is idempotent from every state.
//!
//! Media acquisition and the peer connection are behind the
//! [`MediaDevices`] and [`PeerConnectionFactory`] seams so the whole
//! machine runs against in-memory doubles in tests.

mod error;
mod media;
mod service;
mod session;

pub use error::CallError;
pub use media::{MediaDevices, MediaStream, PeerConnection, PeerConnectionFactory};
pub use service::CallService;
pub use session::{CallConfig, CallSession, CallStatus, IceConnectionState};

// The wire types sessions consume and produce.
pub use relay_client::{IceCandidate, Identity, Role, ServerEvent, SessionDescription};

pub use async_trait::async_trait;
