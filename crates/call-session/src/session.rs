//! The call session state machine.

use std::sync::Arc;

use relay_client::{ClientEvent, IceCandidate, RelayHandle, ServerEvent, SessionDescription};
use tracing::{debug, info, warn};

use crate::error::CallError;
use crate::media::{MediaDevices, MediaStream, PeerConnection, PeerConnectionFactory};

/// Where a session currently is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStatus {
    /// No call in progress.
    Idle,
    /// An authorized incoming call is waiting for accept/decline.
    IncomingRinging,
    /// Offer/answer exchanged or in flight; ICE not yet confirmed.
    Negotiating,
    /// The transport confirmed connectivity.
    Connected,
    /// Negotiation failed; resources are already released.
    Failed,
}

/// ICE connection states reported by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IceConnectionState {
    New,
    Checking,
    Connected,
    Completed,
    Disconnected,
    Failed,
    Closed,
}

/// Configuration for call sessions.
#[derive(Debug, Clone)]
pub struct CallConfig {
    /// STUN/TURN servers handed to the peer-connection factory.
    pub ice_servers: Vec<String>,
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec!["stun:stun.l.google.com:19302".to_string()],
        }
    }
}

/// A single client's call session.
///
/// Exactly one of these exists per client. It owns the media and
/// peer-connection handles and releases each exactly once on teardown.
pub struct CallSession {
    /// This client's registered identity.
    user_id: String,
    /// Doctor IDs this patient holds a `connected` relationship with.
    /// Fetched ahead of time; an incoming call is only surfaced when this
    /// is non-empty. This is a client-side check over client-held data,
    /// not a relay-enforced guarantee.
    connected_doctor_ids: Vec<String>,
    relay: Arc<dyn RelayHandle>,
    media: Arc<dyn MediaDevices>,
    peer_factory: Arc<dyn PeerConnectionFactory>,
    config: CallConfig,

    status: CallStatus,
    /// The stored offer and the caller's socket id while ringing.
    pending_offer: Option<(SessionDescription, String)>,
    /// Socket id of the peer, once known. Used to address relay events.
    peer_socket_id: Option<String>,
    local_stream: Option<Box<dyn MediaStream>>,
    remote_stream: Option<Box<dyn MediaStream>>,
    peer: Option<Box<dyn PeerConnection>>,
    /// Candidates received before the peer connection existed, in
    /// arrival order.
    pending_ice: Vec<IceCandidate>,
}

impl CallSession {
    /// Create an idle session.
    pub fn new(
        user_id: impl Into<String>,
        connected_doctor_ids: Vec<String>,
        relay: Arc<dyn RelayHandle>,
        media: Arc<dyn MediaDevices>,
        peer_factory: Arc<dyn PeerConnectionFactory>,
        config: CallConfig,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            connected_doctor_ids,
            relay,
            media,
            peer_factory,
            config,
            status: CallStatus::Idle,
            pending_offer: None,
            peer_socket_id: None,
            local_stream: None,
            remote_stream: None,
            peer: None,
            pending_ice: Vec::new(),
        }
    }

    /// Current lifecycle state.
    pub fn status(&self) -> CallStatus {
        self.status
    }

    /// Replace the cached connection data the incoming-call guard uses.
    pub fn set_connected_doctors(&mut self, doctor_ids: Vec<String>) {
        self.connected_doctor_ids = doctor_ids;
    }

    /// Feed one relay event into the machine.
    pub async fn handle_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::IncomingCall {
                offer,
                from,
                target_patient_id,
            } => self.handle_incoming_call(offer, from, target_patient_id).await,
            ServerEvent::CallAnswered { answer } => self.handle_call_answered(answer).await,
            ServerEvent::IceCandidate { candidate } => self.handle_ice_candidate(candidate).await,
            ServerEvent::CallDeclined => self.handle_peer_declined().await,
            ServerEvent::EndCall => self.handle_peer_ended(),
        }
    }

    async fn handle_incoming_call(
        &mut self,
        offer: SessionDescription,
        from: String,
        target_patient_id: String,
    ) {
        // The relay may fan events out wider than their target; the
        // target filter is this client's responsibility. Mismatches are
        // dropped without comment so other sessions stay unobservable.
        if target_patient_id != self.user_id {
            debug!("Dropping call event for another target");
            return;
        }

        // Callers only reach patients who hold a connected relationship.
        if self.connected_doctor_ids.is_empty() {
            debug!("Dropping call event: no connected doctors");
            return;
        }

        if self.status != CallStatus::Idle {
            // Reject-busy: the active call keeps its stored offer; the
            // new caller hears a decline.
            info!("Rejecting incoming call while {:?}", self.status);
            if let Err(e) = self
                .relay
                .send(ClientEvent::CallDeclined {
                    target_socket_id: from,
                })
                .await
            {
                warn!("Failed to send busy decline: {}", e);
            }
            return;
        }

        info!("Incoming call from socket {}", from);
        self.pending_offer = Some((offer, from));
        self.status = CallStatus::IncomingRinging;
    }

    /// Accept the ringing call.
    ///
    /// Acquires local audio, builds the peer connection, applies the
    /// stored offer, answers it over the relay, and flushes every ICE
    /// candidate buffered so far, in arrival order.
    pub async fn accept(&mut self) -> Result<(), CallError> {
        if self.status != CallStatus::IncomingRinging {
            return Err(CallError::InvalidState {
                operation: "accept",
                status: self.status,
            });
        }

        let (offer, caller_socket) = self
            .pending_offer
            .take()
            .expect("ringing session always holds an offer");

        let stream = match self.media.acquire_audio().await {
            Ok(stream) => stream,
            Err(e) => {
                self.fail("media acquisition denied");
                return Err(e);
            }
        };
        self.local_stream = Some(stream);

        if let Err(e) = self.build_peer_and_answer(offer, &caller_socket).await {
            self.fail("negotiation failed");
            return Err(e);
        }

        self.peer_socket_id = Some(caller_socket);
        self.status = CallStatus::Negotiating;
        self.flush_pending_ice().await;

        Ok(())
    }

    async fn build_peer_and_answer(
        &mut self,
        offer: SessionDescription,
        caller_socket: &str,
    ) -> Result<(), CallError> {
        let peer = self.peer_factory.create(&self.config.ice_servers).await?;

        let stream = self
            .local_stream
            .as_deref()
            .expect("local stream acquired before negotiation");
        peer.add_track(stream).await?;
        peer.set_remote_description(offer).await?;

        let answer = peer.create_answer().await?;
        peer.set_local_description(answer.clone()).await?;

        self.peer = Some(peer);

        self.relay
            .send(ClientEvent::AnswerCall {
                target_socket_id: caller_socket.to_string(),
                answer,
            })
            .await?;

        Ok(())
    }

    /// Decline the ringing call. Nothing has been acquired yet, so there
    /// is nothing to release.
    pub async fn decline(&mut self) -> Result<(), CallError> {
        if self.status != CallStatus::IncomingRinging {
            return Err(CallError::InvalidState {
                operation: "decline",
                status: self.status,
            });
        }

        let (_, caller_socket) = self
            .pending_offer
            .take()
            .expect("ringing session always holds an offer");

        self.relay
            .send(ClientEvent::CallDeclined {
                target_socket_id: caller_socket,
            })
            .await?;

        self.status = CallStatus::Idle;
        Ok(())
    }

    /// Start an outgoing call towards a patient.
    pub async fn place_call(&mut self, target_patient_id: &str) -> Result<(), CallError> {
        if self.status != CallStatus::Idle {
            return Err(CallError::InvalidState {
                operation: "place call",
                status: self.status,
            });
        }

        let stream = match self.media.acquire_audio().await {
            Ok(stream) => stream,
            Err(e) => {
                self.fail("media acquisition denied");
                return Err(e);
            }
        };
        self.local_stream = Some(stream);

        let result: Result<(), CallError> = async {
            let peer = self.peer_factory.create(&self.config.ice_servers).await?;

            let stream = self
                .local_stream
                .as_deref()
                .expect("local stream acquired before negotiation");
            peer.add_track(stream).await?;

            let offer = peer.create_offer().await?;
            peer.set_local_description(offer.clone()).await?;
            self.peer = Some(peer);

            self.relay
                .send(ClientEvent::CallUser {
                    target_patient_id: target_patient_id.to_string(),
                    offer,
                })
                .await?;
            Ok(())
        }
        .await;

        if let Err(e) = result {
            self.fail("negotiation failed");
            return Err(e);
        }

        info!("Calling patient {}", target_patient_id);
        self.status = CallStatus::Negotiating;
        self.flush_pending_ice().await;
        Ok(())
    }

    async fn handle_call_answered(&mut self, answer: SessionDescription) {
        if self.status != CallStatus::Negotiating {
            debug!("Ignoring stale answer while {:?}", self.status);
            return;
        }

        let Some(peer) = self.peer.as_deref() else {
            debug!("Ignoring answer without a peer connection");
            return;
        };

        if let Err(e) = peer.set_remote_description(answer).await {
            warn!("Failed to apply remote answer: {}", e);
            self.fail("negotiation failed");
        }
    }

    async fn handle_ice_candidate(&mut self, candidate: IceCandidate) {
        match self.peer.as_deref() {
            Some(peer) => {
                if let Err(e) = peer.add_ice_candidate(candidate).await {
                    warn!("Failed to apply ICE candidate: {}", e);
                }
            }
            None => {
                // The peer connection does not exist yet; queue rather
                // than drop, preserving arrival order.
                debug!("Buffering ICE candidate ({} queued)", self.pending_ice.len() + 1);
                self.pending_ice.push(candidate);
            }
        }
    }

    async fn flush_pending_ice(&mut self) {
        if self.pending_ice.is_empty() {
            return;
        }

        let candidates = std::mem::take(&mut self.pending_ice);

        let Some(peer) = self.peer.as_deref() else {
            // No connection to apply them to; keep the queue intact.
            self.pending_ice = candidates;
            return;
        };

        debug!("Flushing {} buffered ICE candidates", candidates.len());
        for candidate in candidates {
            if let Err(e) = peer.add_ice_candidate(candidate).await {
                warn!("Failed to apply buffered ICE candidate: {}", e);
            }
        }
    }

    /// Feed a transport ICE-state notification into the machine.
    ///
    /// `Connected` is only entered from here; an exchanged answer alone
    /// is not connectivity.
    pub fn handle_ice_state(&mut self, state: IceConnectionState) {
        match state {
            IceConnectionState::Connected | IceConnectionState::Completed => {
                if self.status == CallStatus::Negotiating {
                    info!("Call connected");
                    self.status = CallStatus::Connected;
                }
            }
            IceConnectionState::Failed => {
                if matches!(self.status, CallStatus::Negotiating | CallStatus::Connected) {
                    self.fail("ice failure");
                }
            }
            IceConnectionState::Disconnected => {
                warn!("ICE transport disconnected");
            }
            _ => {}
        }
    }

    /// Store the remote media stream once the transport delivers it.
    pub fn handle_remote_stream(&mut self, stream: Box<dyn MediaStream>) {
        if matches!(self.status, CallStatus::Negotiating | CallStatus::Connected) {
            self.remote_stream = Some(stream);
        } else {
            debug!("Dropping remote stream outside a call");
            stream.stop();
        }
    }

    /// Hang up.
    ///
    /// Notifies the peer when one is known, releases every handle exactly
    /// once, and returns to `Idle`. Idempotent: ending an already-ended
    /// call is a no-op.
    pub async fn end_call(&mut self) {
        if self.status == CallStatus::Idle {
            return;
        }

        if let Some(socket_id) = self.peer_socket_id.clone() {
            if let Err(e) = self
                .relay
                .send(ClientEvent::EndCall {
                    target_socket_id: socket_id,
                })
                .await
            {
                warn!("Failed to notify peer of hangup: {}", e);
            }
        }

        self.release_resources();
        self.status = CallStatus::Idle;
        info!("Call ended");
    }

    async fn handle_peer_declined(&mut self) {
        if self.status == CallStatus::Idle {
            return;
        }
        info!("Call declined by peer");
        self.release_resources();
        self.status = CallStatus::Idle;
    }

    fn handle_peer_ended(&mut self) {
        if self.status == CallStatus::Idle {
            return;
        }
        info!("Call ended by peer");
        self.release_resources();
        self.status = CallStatus::Idle;
    }

    /// Enter `Failed` with all resources released.
    fn fail(&mut self, reason: &str) {
        warn!("Call failed: {}", reason);
        self.release_resources();
        self.status = CallStatus::Failed;
    }

    /// Release every owned handle. Each `Option::take` guarantees a
    /// handle is stopped or closed at most once.
    fn release_resources(&mut self) {
        if let Some(peer) = self.peer.take() {
            peer.close();
        }
        if let Some(stream) = self.local_stream.take() {
            stream.stop();
        }
        self.remote_stream = None;
        self.pending_ice.clear();
        self.pending_offer = None;
        self.peer_socket_id = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use relay_client::RelayError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::{broadcast, Mutex};

    /// Relay double that records everything sent through it.
    struct MockRelay {
        sent: Mutex<Vec<ClientEvent>>,
        events: broadcast::Sender<ServerEvent>,
    }

    impl MockRelay {
        fn new() -> Arc<Self> {
            let (events, _) = broadcast::channel(16);
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
                events,
            })
        }

        async fn sent(&self) -> Vec<ClientEvent> {
            self.sent.lock().await.clone()
        }
    }

    #[async_trait]
    impl RelayHandle for MockRelay {
        async fn register(
            &self,
            identity: relay_client::Identity,
        ) -> Result<(), RelayError> {
            self.send(ClientEvent::register(&identity)).await
        }

        async fn send(&self, event: ClientEvent) -> Result<(), RelayError> {
            self.sent.lock().await.push(event);
            Ok(())
        }

        fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
            self.events.subscribe()
        }

        async fn close(&self) {}
    }

    struct MockStream {
        stops: Arc<AtomicUsize>,
    }

    impl MediaStream for MockStream {
        fn stop(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct MockMedia {
        deny: bool,
        stops: Arc<AtomicUsize>,
    }

    impl MockMedia {
        fn granting() -> (Arc<Self>, Arc<AtomicUsize>) {
            let stops = Arc::new(AtomicUsize::new(0));
            (
                Arc::new(Self {
                    deny: false,
                    stops: stops.clone(),
                }),
                stops,
            )
        }

        fn denying() -> Arc<Self> {
            Arc::new(Self {
                deny: true,
                stops: Arc::new(AtomicUsize::new(0)),
            })
        }
    }

    #[async_trait]
    impl MediaDevices for MockMedia {
        async fn acquire_audio(&self) -> Result<Box<dyn MediaStream>, CallError> {
            if self.deny {
                return Err(CallError::Media("permission denied".to_string()));
            }
            Ok(Box::new(MockStream {
                stops: self.stops.clone(),
            }))
        }
    }

    #[derive(Default)]
    struct PeerState {
        closes: AtomicUsize,
        candidates: std::sync::Mutex<Vec<IceCandidate>>,
        remote: std::sync::Mutex<Option<SessionDescription>>,
    }

    struct MockPeer {
        state: Arc<PeerState>,
    }

    #[async_trait]
    impl PeerConnection for MockPeer {
        async fn add_track(&self, _stream: &dyn MediaStream) -> Result<(), CallError> {
            Ok(())
        }

        async fn set_remote_description(
            &self,
            description: SessionDescription,
        ) -> Result<(), CallError> {
            *self.state.remote.lock().unwrap() = Some(description);
            Ok(())
        }

        async fn create_offer(&self) -> Result<SessionDescription, CallError> {
            Ok(SessionDescription::offer("v=0 local"))
        }

        async fn create_answer(&self) -> Result<SessionDescription, CallError> {
            Ok(SessionDescription::answer("v=0 local"))
        }

        async fn set_local_description(
            &self,
            _description: SessionDescription,
        ) -> Result<(), CallError> {
            Ok(())
        }

        async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), CallError> {
            self.state.candidates.lock().unwrap().push(candidate);
            Ok(())
        }

        fn close(&self) {
            self.state.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct MockFactory {
        state: Arc<PeerState>,
    }

    impl MockFactory {
        fn new() -> (Arc<Self>, Arc<PeerState>) {
            let state = Arc::new(PeerState::default());
            (
                Arc::new(Self {
                    state: state.clone(),
                }),
                state,
            )
        }
    }

    #[async_trait]
    impl PeerConnectionFactory for MockFactory {
        async fn create(
            &self,
            _ice_servers: &[String],
        ) -> Result<Box<dyn PeerConnection>, CallError> {
            Ok(Box::new(MockPeer {
                state: self.state.clone(),
            }))
        }
    }

    struct Harness {
        session: CallSession,
        relay: Arc<MockRelay>,
        stops: Arc<AtomicUsize>,
        peer_state: Arc<PeerState>,
    }

    fn harness_with(connected: Vec<String>) -> Harness {
        let relay = MockRelay::new();
        let (media, stops) = MockMedia::granting();
        let (factory, peer_state) = MockFactory::new();

        let session = CallSession::new(
            "patient-1",
            connected,
            relay.clone(),
            media,
            factory,
            CallConfig::default(),
        );

        Harness {
            session,
            relay,
            stops,
            peer_state,
        }
    }

    fn harness() -> Harness {
        harness_with(vec!["doc-1".to_string()])
    }

    fn incoming(from: &str, target: &str) -> ServerEvent {
        ServerEvent::IncomingCall {
            offer: SessionDescription::offer(format!("v=0 from {from}")),
            from: from.to_string(),
            target_patient_id: target.to_string(),
        }
    }

    fn candidate(n: u32) -> IceCandidate {
        IceCandidate::new(format!("candidate:{n}"))
    }

    #[tokio::test]
    async fn test_mismatched_target_never_leaves_idle() {
        let mut h = harness();

        h.session.handle_event(incoming("sock-1", "patient-2")).await;

        assert_eq!(h.session.status(), CallStatus::Idle);
        assert!(h.relay.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_unconnected_patient_never_rings() {
        let mut h = harness_with(Vec::new());

        h.session.handle_event(incoming("sock-1", "patient-1")).await;

        assert_eq!(h.session.status(), CallStatus::Idle);
        assert!(h.relay.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_authorized_call_rings() {
        let mut h = harness();

        h.session.handle_event(incoming("sock-1", "patient-1")).await;

        assert_eq!(h.session.status(), CallStatus::IncomingRinging);
    }

    #[tokio::test]
    async fn test_accept_negotiates_and_answers_caller() {
        let mut h = harness();
        h.session.handle_event(incoming("sock-1", "patient-1")).await;

        h.session.accept().await.unwrap();

        assert_eq!(h.session.status(), CallStatus::Negotiating);

        let sent = h.relay.sent().await;
        assert!(matches!(
            &sent[0],
            ClientEvent::AnswerCall { target_socket_id, .. } if target_socket_id == "sock-1"
        ));

        // The stored offer reached the peer connection.
        let remote = h.peer_state.remote.lock().unwrap().clone().unwrap();
        assert_eq!(remote.sdp, "v=0 from sock-1");
    }

    #[tokio::test]
    async fn test_ice_candidates_buffer_and_flush_in_order() {
        let mut h = harness();

        // Two candidates before the call even rings, one while ringing.
        h.session
            .handle_event(ServerEvent::IceCandidate { candidate: candidate(1) })
            .await;
        h.session.handle_event(incoming("sock-1", "patient-1")).await;
        h.session
            .handle_event(ServerEvent::IceCandidate { candidate: candidate(2) })
            .await;
        h.session
            .handle_event(ServerEvent::IceCandidate { candidate: candidate(3) })
            .await;

        h.session.accept().await.unwrap();

        // One more after the peer connection exists: applied directly.
        h.session
            .handle_event(ServerEvent::IceCandidate { candidate: candidate(4) })
            .await;

        let applied = h.peer_state.candidates.lock().unwrap().clone();
        let lines: Vec<&str> = applied.iter().map(|c| c.candidate.as_str()).collect();
        assert_eq!(
            lines,
            ["candidate:1", "candidate:2", "candidate:3", "candidate:4"]
        );
    }

    #[tokio::test]
    async fn test_media_denial_fails_the_transition() {
        let relay = MockRelay::new();
        let (factory, _) = MockFactory::new();
        let mut session = CallSession::new(
            "patient-1",
            vec!["doc-1".to_string()],
            relay.clone(),
            MockMedia::denying(),
            factory,
            CallConfig::default(),
        );

        session.handle_event(incoming("sock-1", "patient-1")).await;
        let result = session.accept().await;

        assert!(matches!(result, Err(CallError::Media(_))));
        assert_eq!(session.status(), CallStatus::Failed);

        // Hangup from Failed returns to Idle.
        session.end_call().await;
        assert_eq!(session.status(), CallStatus::Idle);
    }

    #[tokio::test]
    async fn test_connected_only_after_ice_confirms() {
        let mut h = harness();
        h.session.handle_event(incoming("sock-1", "patient-1")).await;
        h.session.accept().await.unwrap();

        // An exchanged answer alone is not connectivity.
        assert_eq!(h.session.status(), CallStatus::Negotiating);

        h.session.handle_ice_state(IceConnectionState::Checking);
        assert_eq!(h.session.status(), CallStatus::Negotiating);

        h.session.handle_ice_state(IceConnectionState::Connected);
        assert_eq!(h.session.status(), CallStatus::Connected);
    }

    #[tokio::test]
    async fn test_ice_failure_releases_and_fails() {
        let mut h = harness();
        h.session.handle_event(incoming("sock-1", "patient-1")).await;
        h.session.accept().await.unwrap();

        h.session.handle_ice_state(IceConnectionState::Failed);

        assert_eq!(h.session.status(), CallStatus::Failed);
        assert_eq!(h.stops.load(Ordering::SeqCst), 1);
        assert_eq!(h.peer_state.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_end_call_is_idempotent() {
        let mut h = harness();
        h.session.handle_event(incoming("sock-1", "patient-1")).await;
        h.session.accept().await.unwrap();
        h.session.handle_ice_state(IceConnectionState::Connected);

        h.session.end_call().await;
        h.session.end_call().await;

        assert_eq!(h.session.status(), CallStatus::Idle);
        // Handles released exactly once.
        assert_eq!(h.stops.load(Ordering::SeqCst), 1);
        assert_eq!(h.peer_state.closes.load(Ordering::SeqCst), 1);

        // Exactly one hangup notification: answer first, then end-call.
        let sent = h.relay.sent().await;
        let hangups = sent
            .iter()
            .filter(|e| matches!(e, ClientEvent::EndCall { .. }))
            .count();
        assert_eq!(hangups, 1);
    }

    #[tokio::test]
    async fn test_second_incoming_call_is_rejected_busy() {
        let mut h = harness();
        h.session.handle_event(incoming("sock-1", "patient-1")).await;
        h.session.handle_event(incoming("sock-2", "patient-1")).await;

        // The new caller hears a decline.
        let sent = h.relay.sent().await;
        assert!(matches!(
            &sent[0],
            ClientEvent::CallDeclined { target_socket_id } if target_socket_id == "sock-2"
        ));

        // The active call's stored offer is untouched: accepting still
        // answers the first caller.
        h.session.accept().await.unwrap();
        let sent = h.relay.sent().await;
        assert!(matches!(
            &sent[1],
            ClientEvent::AnswerCall { target_socket_id, .. } if target_socket_id == "sock-1"
        ));
        let remote = h.peer_state.remote.lock().unwrap().clone().unwrap();
        assert_eq!(remote.sdp, "v=0 from sock-1");
    }

    #[tokio::test]
    async fn test_decline_notifies_caller_and_returns_to_idle() {
        let mut h = harness();
        h.session.handle_event(incoming("sock-1", "patient-1")).await;

        h.session.decline().await.unwrap();

        assert_eq!(h.session.status(), CallStatus::Idle);
        let sent = h.relay.sent().await;
        assert!(matches!(
            &sent[0],
            ClientEvent::CallDeclined { target_socket_id } if target_socket_id == "sock-1"
        ));
        // Nothing was acquired, so nothing to release.
        assert_eq!(h.stops.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_peer_hangup_releases_resources() {
        let mut h = harness();
        h.session.handle_event(incoming("sock-1", "patient-1")).await;
        h.session.accept().await.unwrap();
        h.session.handle_ice_state(IceConnectionState::Connected);

        h.session.handle_event(ServerEvent::EndCall).await;

        assert_eq!(h.session.status(), CallStatus::Idle);
        assert_eq!(h.stops.load(Ordering::SeqCst), 1);
        assert_eq!(h.peer_state.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_place_call_and_answer() {
        let mut h = harness();

        h.session.place_call("patient-9").await.unwrap();
        assert_eq!(h.session.status(), CallStatus::Negotiating);

        let sent = h.relay.sent().await;
        assert!(matches!(
            &sent[0],
            ClientEvent::CallUser { target_patient_id, .. } if target_patient_id == "patient-9"
        ));

        h.session
            .handle_event(ServerEvent::CallAnswered {
                answer: SessionDescription::answer("v=0 remote"),
            })
            .await;

        let remote = h.peer_state.remote.lock().unwrap().clone().unwrap();
        assert_eq!(remote.sdp, "v=0 remote");

        h.session.handle_ice_state(IceConnectionState::Completed);
        assert_eq!(h.session.status(), CallStatus::Connected);
    }

    #[tokio::test]
    async fn test_stale_answer_in_idle_is_ignored() {
        let mut h = harness();

        h.session
            .handle_event(ServerEvent::CallAnswered {
                answer: SessionDescription::answer("v=0 stale"),
            })
            .await;

        assert_eq!(h.session.status(), CallStatus::Idle);
        assert!(h.peer_state.remote.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_peer_decline_tears_down_caller_side() {
        let mut h = harness();
        h.session.place_call("patient-9").await.unwrap();

        h.session.handle_event(ServerEvent::CallDeclined).await;

        assert_eq!(h.session.status(), CallStatus::Idle);
        assert_eq!(h.stops.load(Ordering::SeqCst), 1);
        assert_eq!(h.peer_state.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_accept_outside_ringing_is_invalid() {
        let mut h = harness();

        let result = h.session.accept().await;
        assert!(matches!(
            result,
            Err(CallError::InvalidState { operation: "accept", .. })
        ));
    }
}
