//! Event loop binding a relay subscription to a call session.

use std::sync::Arc;

use relay_client::{Identity, RelayHandle};
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

use crate::error::CallError;
use crate::session::CallSession;

/// Drives one client's [`CallSession`] from relay events.
///
/// The session sits behind a mutex so UI-driven actions (accept, decline,
/// hangup) can run concurrently with event delivery.
pub struct CallService {
    relay: Arc<dyn RelayHandle>,
    identity: Identity,
    session: Arc<Mutex<CallSession>>,
}

impl CallService {
    /// Create a service for one registered identity.
    pub fn new(relay: Arc<dyn RelayHandle>, identity: Identity, session: CallSession) -> Self {
        Self {
            relay,
            identity,
            session: Arc::new(Mutex::new(session)),
        }
    }

    /// Handle to the session, for accept/decline/hangup actions.
    pub fn session(&self) -> Arc<Mutex<CallSession>> {
        self.session.clone()
    }

    /// Register the identity and process relay events until the relay
    /// connection manager shuts down.
    pub async fn run(&self) -> Result<(), CallError> {
        // Subscribe before registering so no event can slip between the
        // two steps.
        let mut events = self.relay.subscribe();

        self.relay.register(self.identity.clone()).await?;
        info!(
            "Call service running for {} ({:?})",
            self.identity.user_id, self.identity.role
        );

        loop {
            match events.recv().await {
                Ok(event) => {
                    let mut session = self.session.lock().await;
                    session.handle_event(event).await;
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Call service lagged, {} events dropped", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    info!("Relay event stream closed, call service stopping");
                    break;
                }
            }
        }

        Ok(())
    }
}
