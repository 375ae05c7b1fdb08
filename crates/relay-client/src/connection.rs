//! The relay connection manager.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc, watch, Mutex};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::events::{ClientEvent, Identity, ServerEvent};

/// Outbound queue depth; events sent while disconnected wait here.
const OUTBOUND_BUFFER: usize = 64;

/// Fan-out buffer per subscriber.
const EVENT_BUFFER: usize = 64;

/// Handle to the signaling relay.
///
/// This is the seam call logic depends on: production code passes a
/// [`RelayClient`], tests pass an in-memory double. The handle is
/// constructed once per process and shared by reference.
#[async_trait]
pub trait RelayHandle: Send + Sync {
    /// Announce an identity, now and after every reconnect.
    async fn register(&self, identity: Identity) -> Result<(), RelayError>;

    /// Queue an event for the relay.
    async fn send(&self, event: ClientEvent) -> Result<(), RelayError>;

    /// Subscribe to events delivered by the relay.
    fn subscribe(&self) -> broadcast::Receiver<ServerEvent>;

    /// Tear the connection down.
    async fn close(&self);
}

/// WebSocket implementation of [`RelayHandle`].
///
/// Owns a background task that keeps one connection alive: on loss it
/// reconnects with exponential backoff and re-registers every identity
/// announced so far. Outbound events queue while disconnected; inbound
/// events fan out to all subscribers.
pub struct RelayClient {
    outbound_tx: mpsc::Sender<ClientEvent>,
    events_tx: broadcast::Sender<ServerEvent>,
    identities: Arc<Mutex<Vec<Identity>>>,
    shutdown_tx: watch::Sender<bool>,
}

/// Why one connected session ended.
enum SessionEnd {
    ConnectionLost,
    Shutdown,
}

impl RelayClient {
    /// Start the connection manager.
    ///
    /// Returns immediately; the first connection is established in the
    /// background. An unreachable relay is not an error here - events are
    /// simply never delivered until a connection succeeds.
    pub fn connect(config: RelayConfig) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_BUFFER);
        let (events_tx, _) = broadcast::channel(EVENT_BUFFER);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let identities = Arc::new(Mutex::new(Vec::new()));

        tokio::spawn(run_connection(
            config,
            outbound_rx,
            events_tx.clone(),
            identities.clone(),
            shutdown_rx,
        ));

        Self {
            outbound_tx,
            events_tx,
            identities,
            shutdown_tx,
        }
    }

    /// The identities announced so far.
    pub async fn identities(&self) -> Vec<Identity> {
        self.identities.lock().await.clone()
    }
}

#[async_trait]
impl RelayHandle for RelayClient {
    async fn register(&self, identity: Identity) -> Result<(), RelayError> {
        {
            let mut identities = self.identities.lock().await;
            if !identities.contains(&identity) {
                identities.push(identity.clone());
            }
        }

        self.send(ClientEvent::register(&identity)).await
    }

    async fn send(&self, event: ClientEvent) -> Result<(), RelayError> {
        self.outbound_tx
            .send(event)
            .await
            .map_err(|_| RelayError::Closed)
    }

    fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.events_tx.subscribe()
    }

    async fn close(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

impl std::fmt::Debug for RelayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayClient")
            .field("closed", &*self.shutdown_tx.borrow())
            .finish()
    }
}

/// Connection supervisor: connect, re-register, pump, reconnect.
async fn run_connection(
    config: RelayConfig,
    mut outbound_rx: mpsc::Receiver<ClientEvent>,
    events_tx: broadcast::Sender<ServerEvent>,
    identities: Arc<Mutex<Vec<Identity>>>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut attempts: u32 = 0;

    'outer: loop {
        if *shutdown_rx.borrow() {
            break;
        }

        match connect_async(config.url.as_str()).await {
            Ok((stream, _)) => {
                info!("Connected to relay at {}", config.url);
                attempts = 0;

                let (mut ws_tx, mut ws_rx) = stream.split();

                // Idempotent re-registration: the relay's identity map is
                // keyed by transport session, so it must be rebuilt after
                // every reconnect.
                let current = identities.lock().await.clone();
                let mut registration_failed = false;
                for identity in &current {
                    let frame = match ClientEvent::register(identity).encode() {
                        Ok(frame) => frame,
                        Err(e) => {
                            warn!("Failed to encode register event: {}", e);
                            continue;
                        }
                    };
                    if ws_tx.send(Message::Text(frame)).await.is_err() {
                        registration_failed = true;
                        break;
                    }
                }

                if !registration_failed {
                    let end = 'session: loop {
                        tokio::select! {
                            event = outbound_rx.recv() => {
                                let Some(event) = event else {
                                    break 'session SessionEnd::Shutdown;
                                };
                                let frame = match event.encode() {
                                    Ok(frame) => frame,
                                    Err(e) => {
                                        warn!("Failed to encode relay event: {}", e);
                                        continue;
                                    }
                                };
                                if ws_tx.send(Message::Text(frame)).await.is_err() {
                                    break 'session SessionEnd::ConnectionLost;
                                }
                            }
                            message = ws_rx.next() => {
                                match message {
                                    Some(Ok(Message::Text(text))) => {
                                        match ServerEvent::decode(&text) {
                                            Ok(event) => {
                                                // Send only fails with no
                                                // subscribers; that's fine.
                                                let _ = events_tx.send(event);
                                            }
                                            Err(RelayError::UnknownEvent(name)) => {
                                                debug!("Ignoring relay event: {}", name);
                                            }
                                            Err(e) => {
                                                warn!("Undecodable relay frame: {}", e);
                                            }
                                        }
                                    }
                                    Some(Ok(Message::Close(_))) | None => {
                                        info!("Relay connection closed");
                                        break 'session SessionEnd::ConnectionLost;
                                    }
                                    Some(Ok(_)) => {}
                                    Some(Err(e)) => {
                                        warn!("Relay read error: {}", e);
                                        break 'session SessionEnd::ConnectionLost;
                                    }
                                }
                            }
                            _ = shutdown_rx.changed() => {
                                if *shutdown_rx.borrow() {
                                    break 'session SessionEnd::Shutdown;
                                }
                            }
                        }
                    };

                    if let SessionEnd::Shutdown = end {
                        let _ = ws_tx.close().await;
                        break 'outer;
                    }
                }
            }
            Err(e) => {
                warn!("Relay connect failed: {}", e);
            }
        }

        attempts += 1;
        if !config.reconnect.should_retry(attempts) {
            error!("Giving up on relay after {} attempts", attempts);
            break;
        }

        let delay = config.reconnect.delay_for_attempt(attempts);
        debug!("Reconnecting to relay in {:?} (attempt {})", delay, attempts);

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }
}
