//! Media and peer-connection seams.
//!
//! The session state machine never touches a real media stack; it drives
//! these traits. Production wires them to the platform's audio devices
//! and RTC implementation, tests wire them to counters.

use async_trait::async_trait;
use relay_client::{IceCandidate, SessionDescription};

use crate::error::CallError;

/// A handle to an acquired local media stream.
pub trait MediaStream: Send + Sync {
    /// Stop all tracks. The session guarantees this is called at most
    /// once per stream.
    fn stop(&self);
}

/// Access to local media devices.
#[async_trait]
pub trait MediaDevices: Send + Sync {
    /// Acquire the local audio stream.
    ///
    /// Denied or unavailable devices are an error; the session turns that
    /// into a failed call, not a crash.
    async fn acquire_audio(&self) -> Result<Box<dyn MediaStream>, CallError>;
}

/// One peer media connection under negotiation.
#[async_trait]
pub trait PeerConnection: Send + Sync {
    /// Attach a local stream's tracks.
    async fn add_track(&self, stream: &dyn MediaStream) -> Result<(), CallError>;

    /// Apply the remote session description.
    async fn set_remote_description(
        &self,
        description: SessionDescription,
    ) -> Result<(), CallError>;

    /// Create a local offer.
    async fn create_offer(&self) -> Result<SessionDescription, CallError>;

    /// Create a local answer to the applied remote offer.
    async fn create_answer(&self) -> Result<SessionDescription, CallError>;

    /// Apply the local session description.
    async fn set_local_description(&self, description: SessionDescription)
        -> Result<(), CallError>;

    /// Apply a remote ICE candidate.
    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), CallError>;

    /// Tear the connection down. Safe to call once; the session owns the
    /// handle and drops it immediately after.
    fn close(&self);
}

/// Factory for peer connections.
#[async_trait]
pub trait PeerConnectionFactory: Send + Sync {
    /// Create a connection configured with the given STUN/TURN servers.
    async fn create(&self, ice_servers: &[String]) -> Result<Box<dyn PeerConnection>, CallError>;
}
