use std::sync::Arc;
use std::time::Duration;

use hangout_core::{IceCandidate, IceServerConfig, PublisherId, SessionDescription};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::NegotiationError;
use crate::transport::{
    LocalTrack, MediaTransport, SignalingMachine, SignalingState, TransportEvent,
    TransportFactory, TransportRole, TransportTag,
};

struct TransportSide {
    machine: SignalingMachine,
    transport: Option<Box<dyn MediaTransport>>,
    remote_description_set: bool,
    pending_candidates: Vec<IceCandidate>,
}

impl TransportSide {
    fn new(role: TransportRole, generation: u64) -> Self {
        Self {
            machine: SignalingMachine::new(role, generation),
            transport: None,
            remote_description_set: false,
            pending_candidates: Vec::new(),
        }
    }

    fn role(&self) -> TransportRole {
        self.machine.tag().role
    }

    fn transport(&self) -> Result<&dyn MediaTransport, NegotiationError> {
        match (self.machine.state(), &self.transport) {
            (SignalingState::Closed, _) => Err(NegotiationError::Closed(self.role())),
            (_, Some(transport)) => Ok(transport.as_ref()),
            (_, None) => Err(NegotiationError::NotInitialized(self.role())),
        }
    }

    fn advance(&mut self, next: SignalingState, timeout: Duration) {
        let from = self.machine.state();
        if from == next {
            return;
        }
        match self.machine.advance(next, timeout) {
            Ok(()) => debug!("{} transport {} -> {}", self.role(), from, next),
            Err(e) => warn!("Ignoring transition ({})", e),
        }
    }

    async fn flush_candidates(&mut self) {
        let pending: Vec<IceCandidate> = self.pending_candidates.drain(..).collect();
        let Some(transport) = &self.transport else {
            return;
        };
        for candidate in pending {
            if let Err(e) = transport.add_remote_candidate(candidate).await {
                warn!("Failed to apply buffered ICE candidate: {}", e);
            }
        }
    }

    async fn teardown(&mut self) {
        if let Some(transport) = self.transport.take() {
            transport.close().await;
        }
        self.pending_candidates.clear();
        self.remote_description_set = false;
    }
}

/// The publish and subscribe transports. Each side has its own state
/// machine and progresses without waiting for the other.
pub struct MediaTransportPair {
    factory: Arc<dyn TransportFactory>,
    events: mpsc::Sender<TransportEvent>,
    ice_servers: Vec<IceServerConfig>,
    negotiation_timeout: Duration,
    publisher: TransportSide,
    subscriber: TransportSide,
    next_generation: u64,
}

impl MediaTransportPair {
    pub fn new(
        factory: Arc<dyn TransportFactory>,
        events: mpsc::Sender<TransportEvent>,
        ice_servers: Vec<IceServerConfig>,
        negotiation_timeout: Duration,
    ) -> Self {
        Self {
            factory,
            events,
            ice_servers,
            negotiation_timeout,
            publisher: TransportSide::new(TransportRole::Publisher, 0),
            subscriber: TransportSide::new(TransportRole::Subscriber, 1),
            next_generation: 2,
        }
    }

    /// Replaces the ICE servers used for transports created from now on.
    pub fn set_ice_servers(&mut self, servers: Vec<IceServerConfig>) {
        if !servers.is_empty() {
            self.ice_servers = servers;
        }
    }

    fn side(&self, role: TransportRole) -> &TransportSide {
        match role {
            TransportRole::Publisher => &self.publisher,
            TransportRole::Subscriber => &self.subscriber,
        }
    }

    fn side_mut(&mut self, role: TransportRole) -> &mut TransportSide {
        match role {
            TransportRole::Publisher => &mut self.publisher,
            TransportRole::Subscriber => &mut self.subscriber,
        }
    }

    pub fn state(&self, role: TransportRole) -> SignalingState {
        self.side(role).machine.state()
    }

    pub fn tag(&self, role: TransportRole) -> TransportTag {
        self.side(role).machine.tag()
    }

    /// Whether the side can take tracks or subscriptions right now.
    pub fn is_open(&self, role: TransportRole) -> bool {
        self.side(role).machine.is_open()
    }

    /// Whether an event came from the live instance of its side.
    pub fn is_current(&self, tag: TransportTag) -> bool {
        self.tag(tag.role) == tag
    }

    /// Creates the peer connection for `role`. A side that is already open
    /// is left alone.
    pub async fn initialize(&mut self, role: TransportRole) -> Result<(), NegotiationError> {
        let side = self.side(role);
        match side.machine.state() {
            SignalingState::Uninitialized => {}
            SignalingState::Closed => return Err(NegotiationError::Closed(role)),
            _ => return Ok(()),
        }

        let tag = side.machine.tag();
        let transport = self
            .factory
            .create(tag, &self.ice_servers, self.events.clone())
            .await?;

        let timeout = self.negotiation_timeout;
        let side = self.side_mut(role);
        side.transport = Some(transport);
        side.advance(SignalingState::Initializing, timeout);
        info!("{} transport initialized (generation {})", role, tag.generation);
        Ok(())
    }

    /// Adds an outbound track to the publisher. The offer that follows is
    /// requested by the transport through `NegotiationNeeded`.
    pub async fn attach_track(&mut self, track: &LocalTrack) -> Result<(), NegotiationError> {
        let timeout = self.negotiation_timeout;
        let side = &mut self.publisher;
        side.transport()?.add_track(track).await?;
        side.advance(SignalingState::Negotiating, timeout);
        Ok(())
    }

    pub async fn detach_track(&mut self, publisher_id: &PublisherId) -> Result<(), NegotiationError> {
        self.publisher
            .transport()?
            .remove_track(publisher_id)
            .await
    }

    /// Produces the publisher offer after the transport asked for one.
    pub async fn create_offer(&mut self) -> Result<SessionDescription, NegotiationError> {
        let timeout = self.negotiation_timeout;
        let side = &mut self.publisher;
        let offer = side.transport()?.create_offer().await?;
        side.advance(SignalingState::Negotiating, timeout);
        Ok(offer)
    }

    /// Applies the SFU answer to the publisher. Returns `false` when no
    /// offer was outstanding.
    pub async fn apply_answer(&mut self, answer: SessionDescription) -> Result<bool, NegotiationError> {
        let timeout = self.negotiation_timeout;
        let side = &mut self.publisher;
        if side.machine.state() != SignalingState::Negotiating {
            warn!(
                "Answer received while publisher is {}, ignoring",
                side.machine.state()
            );
            return Ok(false);
        }
        side.transport()?.set_remote_answer(answer).await?;
        side.remote_description_set = true;
        side.advance(SignalingState::Stable, timeout);
        side.flush_candidates().await;
        Ok(true)
    }

    /// Applies an SFU offer to the subscriber and returns the answer to send.
    /// Call [`MediaTransportPair::answer_sent`] once it is on the wire.
    pub async fn accept_offer(
        &mut self,
        offer: SessionDescription,
    ) -> Result<SessionDescription, NegotiationError> {
        let timeout = self.negotiation_timeout;
        let side = &mut self.subscriber;
        side.transport()?;
        side.advance(SignalingState::Negotiating, timeout);
        let answer = side.transport()?.accept_offer(offer).await?;
        side.remote_description_set = true;
        side.flush_candidates().await;
        Ok(answer)
    }

    pub fn answer_sent(&mut self) {
        let timeout = self.negotiation_timeout;
        self.subscriber.advance(SignalingState::Stable, timeout);
    }

    /// Applies a remote candidate, or holds it until the side has a remote
    /// description to attach it to.
    pub async fn add_remote_candidate(
        &mut self,
        role: TransportRole,
        candidate: IceCandidate,
    ) -> Result<(), NegotiationError> {
        let side = self.side_mut(role);
        if side.machine.state() == SignalingState::Closed {
            return Err(NegotiationError::Closed(role));
        }
        match &side.transport {
            Some(transport) if side.remote_description_set => {
                transport.add_remote_candidate(candidate).await
            }
            _ => {
                debug!("Buffering {} ICE candidate", role);
                side.pending_candidates.push(candidate);
                Ok(())
            }
        }
    }

    /// Sides that have waited on a negotiation response past the deadline.
    pub fn expired(&self, now: Instant) -> Vec<TransportRole> {
        [&self.publisher, &self.subscriber]
            .into_iter()
            .filter(|side| side.machine.is_expired(now))
            .map(|side| side.role())
            .collect()
    }

    /// Tears down one side and starts a fresh, uninitialized instance.
    pub async fn reset(&mut self, role: TransportRole) {
        let generation = self.next_generation;
        self.next_generation += 1;

        let side = self.side_mut(role);
        if side.machine.state() == SignalingState::Closed && side.transport.is_none() {
            return;
        }
        side.teardown().await;
        side.machine.close();
        *side = TransportSide::new(role, generation);
        info!("{} transport reset (generation {})", role, generation);
    }

    /// Closes both sides for good. Idempotent.
    pub async fn close(&mut self) {
        for side in [&mut self.publisher, &mut self.subscriber] {
            side.teardown().await;
            side.machine.close();
        }
    }
}
