use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use hangout_client::{
    LocalTrack, MediaTransport, NegotiationError, RemoteTrack, TransportEvent, TransportFactory,
    TransportRole, TransportTag,
};
use hangout_core::{IceCandidate, IceServerConfig, MediaKind, PublisherId, SessionDescription};
use tokio::sync::{Mutex, mpsc};

/// Everything a mock transport was asked to do.
#[derive(Debug, Clone, Default)]
pub struct MockTransportState {
    pub ice_servers: Vec<IceServerConfig>,
    pub added: Vec<PublisherId>,
    pub removed: Vec<PublisherId>,
    pub offers_created: usize,
    pub answers_applied: Vec<SessionDescription>,
    pub offers_accepted: Vec<SessionDescription>,
    pub candidates: Vec<IceCandidate>,
    pub closed: bool,
    /// Make the next `accept_offer` fail.
    pub fail_accept: bool,
}

/// Test-side view of one created transport.
#[derive(Clone)]
pub struct MockTransportHandle {
    pub tag: TransportTag,
    state: Arc<Mutex<MockTransportState>>,
    events: mpsc::Sender<TransportEvent>,
}

impl MockTransportHandle {
    pub async fn state(&self) -> MockTransportState {
        self.state.lock().await.clone()
    }

    pub async fn fail_next_accept(&self) {
        self.state.lock().await.fail_accept = true;
    }

    /// Push an event as if the transport produced it.
    pub async fn emit(&self, event: TransportEvent) {
        let _ = self.events.send(event).await;
    }

    pub async fn track_ready(&self, publisher_id: &str, kind: MediaKind) {
        let track = RemoteTrack::new(PublisherId::from(publisher_id), kind);
        self.emit(TransportEvent::TrackReady(self.tag, track)).await;
    }

    pub async fn local_candidate(&self, candidate: &str) {
        let candidate = IceCandidate {
            candidate: candidate.to_owned(),
            sdp_mid: Some("0".to_owned()),
            sdp_mline_index: Some(0),
            username_fragment: None,
        };
        self.emit(TransportEvent::CandidateGenerated(self.tag, candidate))
            .await;
    }

    pub async fn disconnect(&self) {
        self.emit(TransportEvent::Disconnected(self.tag)).await;
    }
}

struct MockTransport {
    handle: MockTransportHandle,
}

impl MockTransport {
    fn negotiation_needed(&self) {
        let _ = self
            .handle
            .events
            .try_send(TransportEvent::NegotiationNeeded(self.handle.tag));
    }
}

#[async_trait]
impl MediaTransport for MockTransport {
    async fn add_track(&self, track: &LocalTrack) -> Result<(), NegotiationError> {
        self.handle.state.lock().await.added.push(track.id().clone());
        self.negotiation_needed();
        Ok(())
    }

    async fn remove_track(&self, publisher_id: &PublisherId) -> Result<(), NegotiationError> {
        self.handle
            .state
            .lock()
            .await
            .removed
            .push(publisher_id.clone());
        self.negotiation_needed();
        Ok(())
    }

    async fn create_offer(&self) -> Result<SessionDescription, NegotiationError> {
        let mut state = self.handle.state.lock().await;
        state.offers_created += 1;
        Ok(SessionDescription::offer(format!(
            "offer-{}",
            state.offers_created
        )))
    }

    async fn set_remote_answer(&self, answer: SessionDescription) -> Result<(), NegotiationError> {
        self.handle.state.lock().await.answers_applied.push(answer);
        Ok(())
    }

    async fn accept_offer(
        &self,
        offer: SessionDescription,
    ) -> Result<SessionDescription, NegotiationError> {
        let mut state = self.handle.state.lock().await;
        if std::mem::take(&mut state.fail_accept) {
            return Err(NegotiationError::transport(
                self.handle.tag.role,
                "malformed offer",
            ));
        }
        state.offers_accepted.push(offer);
        Ok(SessionDescription::answer(format!(
            "answer-{}",
            state.offers_accepted.len()
        )))
    }

    async fn add_remote_candidate(&self, candidate: IceCandidate) -> Result<(), NegotiationError> {
        self.handle.state.lock().await.candidates.push(candidate);
        Ok(())
    }

    async fn close(&self) {
        self.handle.state.lock().await.closed = true;
    }
}

/// Factory that records every transport it creates.
#[derive(Clone, Default)]
pub struct MockTransportFactory {
    created: Arc<Mutex<Vec<MockTransportHandle>>>,
    fail: Arc<AtomicBool>,
}

impl MockTransportFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_creation(&self, fail: bool) {
        self.fail.store(fail, Ordering::Release);
    }

    /// Most recent transport for `role`.
    pub async fn latest(&self, role: TransportRole) -> Option<MockTransportHandle> {
        self.created
            .lock()
            .await
            .iter()
            .rev()
            .find(|h| h.tag.role == role)
            .cloned()
    }

    pub async fn created(&self, role: TransportRole) -> Vec<MockTransportHandle> {
        self.created
            .lock()
            .await
            .iter()
            .filter(|h| h.tag.role == role)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl TransportFactory for MockTransportFactory {
    async fn create(
        &self,
        tag: TransportTag,
        ice_servers: &[IceServerConfig],
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Box<dyn MediaTransport>, NegotiationError> {
        if self.fail.load(Ordering::Acquire) {
            return Err(NegotiationError::transport(tag.role, "creation refused"));
        }
        tracing::debug!("[MockTransport] create {:?}", tag);

        let handle = MockTransportHandle {
            tag,
            state: Arc::new(Mutex::new(MockTransportState {
                ice_servers: ice_servers.to_vec(),
                ..Default::default()
            })),
            events,
        };
        self.created.lock().await.push(handle.clone());
        Ok(Box::new(MockTransport { handle }))
    }
}
