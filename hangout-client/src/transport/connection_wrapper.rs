use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use hangout_core::{IceCandidate, IceServerConfig, PublisherId, SdpType, SessionDescription};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::rtp_sender::RTCRtpSender;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_remote::TrackRemote;

use crate::error::NegotiationError;
use crate::transport::{
    LocalTrack, MediaTransport, RemoteTrack, TransportEvent, TransportFactory, TransportRole,
    TransportTag,
};

/// [`MediaTransport`] on top of a webrtc-rs peer connection.
pub struct RtcTransport {
    tag: TransportTag,
    peer_connection: Arc<RTCPeerConnection>,
    senders: Mutex<HashMap<PublisherId, Arc<RTCRtpSender>>>,
}

impl RtcTransport {
    pub async fn new(
        tag: TransportTag,
        ice_servers: &[IceServerConfig],
        event_tx: mpsc::Sender<TransportEvent>,
    ) -> Result<Self, NegotiationError> {
        let role = tag.role;
        let mut m = MediaEngine::default();
        m.register_default_codecs()
            .map_err(|e| NegotiationError::transport(role, e))?;
        let registry = register_default_interceptors(Registry::new(), &mut m)
            .map_err(|e| NegotiationError::transport(role, e))?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: ice_servers.iter().map(to_rtc_ice_server).collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .map_err(|e| NegotiationError::transport(role, e))?,
        );

        let state_tx = event_tx.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();
                Box::pin(async move {
                    info!("{} connection state changed: {:?}", tag.role, s);
                    match s {
                        RTCPeerConnectionState::Failed
                        | RTCPeerConnectionState::Disconnected
                        | RTCPeerConnectionState::Closed => {
                            let _ = tx.send(TransportEvent::Disconnected(tag)).await;
                        }
                        _ => {}
                    }
                })
            },
        ));

        let ice_tx = event_tx.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let _ = tx
                    .send(TransportEvent::CandidateGenerated(tag, from_rtc_candidate(init)))
                    .await;
            })
        }));

        if role == TransportRole::Publisher {
            let nego_tx = event_tx.clone();
            peer_connection.on_negotiation_needed(Box::new(move || {
                let tx = nego_tx.clone();
                Box::pin(async move {
                    debug!("Publisher negotiation needed");
                    let _ = tx.send(TransportEvent::NegotiationNeeded(tag)).await;
                })
            }));
        } else {
            let track_tx = event_tx.clone();
            peer_connection.on_track(Box::new(
                move |track: Arc<TrackRemote>,
                      _receiver: Arc<RTCRtpReceiver>,
                      _transceiver: Arc<RTCRtpTransceiver>| {
                    let tx = track_tx.clone();
                    Box::pin(async move {
                        let remote = RemoteTrack::from_rtp(track);
                        debug!(
                            "Remote {} track {} arrived",
                            remote.kind(),
                            remote.publisher_id()
                        );
                        let _ = tx.send(TransportEvent::TrackReady(tag, remote)).await;
                    })
                },
            ));
        }

        Ok(Self {
            tag,
            peer_connection,
            senders: Mutex::new(HashMap::new()),
        })
    }

    fn role(&self) -> TransportRole {
        self.tag.role
    }

    fn fail(&self, e: impl ToString) -> NegotiationError {
        NegotiationError::transport(self.role(), e)
    }

    fn to_rtc_description(
        &self,
        description: SessionDescription,
    ) -> Result<RTCSessionDescription, NegotiationError> {
        match description.sdp_type {
            SdpType::Offer => RTCSessionDescription::offer(description.sdp),
            SdpType::Answer => RTCSessionDescription::answer(description.sdp),
            SdpType::Pranswer => RTCSessionDescription::pranswer(description.sdp),
            SdpType::Rollback => {
                return Err(self.fail("rollback descriptions are not supported"));
            }
        }
        .map_err(|e| self.fail(e))
    }
}

#[async_trait]
impl MediaTransport for RtcTransport {
    async fn add_track(&self, track: &LocalTrack) -> Result<(), NegotiationError> {
        let rtp: Arc<dyn TrackLocal + Send + Sync> = track.rtp_track();
        let sender = self
            .peer_connection
            .add_track(rtp)
            .await
            .map_err(|e| self.fail(e))?;

        // RTCP has to be drained for the interceptors to keep working.
        let rtcp_sender = Arc::clone(&sender);
        tokio::spawn(async move {
            let mut buf = vec![0u8; 1500];
            while rtcp_sender.read(&mut buf).await.is_ok() {}
        });

        self.senders.lock().await.insert(track.id().clone(), sender);
        Ok(())
    }

    async fn remove_track(&self, publisher_id: &PublisherId) -> Result<(), NegotiationError> {
        let Some(sender) = self.senders.lock().await.remove(publisher_id) else {
            debug!("No sender for publication {}", publisher_id);
            return Ok(());
        };
        self.peer_connection
            .remove_track(&sender)
            .await
            .map_err(|e| self.fail(e))
    }

    async fn create_offer(&self) -> Result<SessionDescription, NegotiationError> {
        let offer = self
            .peer_connection
            .create_offer(None)
            .await
            .map_err(|e| self.fail(e))?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await
            .map_err(|e| self.fail(e))?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn set_remote_answer(&self, answer: SessionDescription) -> Result<(), NegotiationError> {
        let desc = self.to_rtc_description(answer)?;
        self.peer_connection
            .set_remote_description(desc)
            .await
            .map_err(|e| self.fail(e))
    }

    async fn accept_offer(
        &self,
        offer: SessionDescription,
    ) -> Result<SessionDescription, NegotiationError> {
        let desc = self.to_rtc_description(offer)?;
        self.peer_connection
            .set_remote_description(desc)
            .await
            .map_err(|e| self.fail(e))?;

        let answer = self
            .peer_connection
            .create_answer(None)
            .await
            .map_err(|e| self.fail(e))?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await
            .map_err(|e| self.fail(e))?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn add_remote_candidate(&self, candidate: IceCandidate) -> Result<(), NegotiationError> {
        self.peer_connection
            .add_ice_candidate(to_rtc_candidate(candidate))
            .await
            .map_err(|e| self.fail(e))
    }

    async fn close(&self) {
        self.senders.lock().await.clear();
        if let Err(e) = self.peer_connection.close().await {
            warn!("Failed to close {} connection: {}", self.role(), e);
        }
    }
}

/// Builds [`RtcTransport`]s for the session.
#[derive(Debug, Default, Clone, Copy)]
pub struct RtcTransportFactory;

#[async_trait]
impl TransportFactory for RtcTransportFactory {
    async fn create(
        &self,
        tag: TransportTag,
        ice_servers: &[IceServerConfig],
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Box<dyn MediaTransport>, NegotiationError> {
        let transport = RtcTransport::new(tag, ice_servers, events).await?;
        Ok(Box::new(transport))
    }
}

fn to_rtc_ice_server(server: &IceServerConfig) -> RTCIceServer {
    RTCIceServer {
        urls: server.urls.clone(),
        username: server.username.clone().unwrap_or_default(),
        credential: server.credential.clone().unwrap_or_default(),
        ..Default::default()
    }
}

fn from_rtc_candidate(init: RTCIceCandidateInit) -> IceCandidate {
    IceCandidate {
        candidate: init.candidate,
        sdp_mid: init.sdp_mid,
        sdp_mline_index: init.sdp_mline_index,
        username_fragment: init.username_fragment,
    }
}

fn to_rtc_candidate(candidate: IceCandidate) -> RTCIceCandidateInit {
    RTCIceCandidateInit {
        candidate: candidate.candidate,
        sdp_mid: candidate.sdp_mid,
        sdp_mline_index: candidate.sdp_mline_index,
        username_fragment: candidate.username_fragment,
    }
}
