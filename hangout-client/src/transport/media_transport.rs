use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use hangout_core::{IceCandidate, IceServerConfig, MediaKind, PublisherId, SessionDescription};
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::media::Sample;
use webrtc::rtp_transceiver::rtp_codec::{RTCRtpCodecCapability, RTPCodecType};
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_remote::TrackRemote;

use crate::error::NegotiationError;
use crate::transport::TransportEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportRole {
    Publisher,
    Subscriber,
}

impl fmt::Display for TransportRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportRole::Publisher => f.write_str("publisher"),
            TransportRole::Subscriber => f.write_str("subscriber"),
        }
    }
}

/// Identifies one transport instance. The generation changes every time a
/// side is reset, so late events from a torn-down connection can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransportTag {
    pub role: TransportRole,
    pub generation: u64,
}

/// Outbound media track. The id doubles as the publisher id announced to
/// the server.
#[derive(Clone)]
pub struct LocalTrack {
    id: PublisherId,
    kind: MediaKind,
    rtp: Arc<TrackLocalStaticSample>,
    ended: Arc<AtomicBool>,
}

impl LocalTrack {
    pub fn new(kind: MediaKind) -> Self {
        let id = Uuid::new_v4().to_string();
        let capability = match kind {
            MediaKind::Audio => RTCRtpCodecCapability {
                mime_type: MIME_TYPE_OPUS.to_owned(),
                clock_rate: 48000,
                channels: 2,
                sdp_fmtp_line: "minptime=10;useinbandfec=1".to_owned(),
                rtcp_feedback: vec![],
            },
            MediaKind::Video => RTCRtpCodecCapability {
                mime_type: MIME_TYPE_VP8.to_owned(),
                clock_rate: 90000,
                channels: 0,
                sdp_fmtp_line: String::new(),
                rtcp_feedback: vec![],
            },
        };
        let rtp = Arc::new(TrackLocalStaticSample::new(
            capability,
            id.clone(),
            format!("hangout-{kind}"),
        ));

        Self {
            id: PublisherId(id),
            kind,
            rtp,
            ended: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> &PublisherId {
        &self.id
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn rtp_track(&self) -> Arc<TrackLocalStaticSample> {
        Arc::clone(&self.rtp)
    }

    pub fn is_ended(&self) -> bool {
        self.ended.load(Ordering::Acquire)
    }

    /// Ends the track. Later writes are dropped. Idempotent.
    pub fn stop(&self) {
        if !self.ended.swap(true, Ordering::AcqRel) {
            debug!("Local {} track {} ended", self.kind, self.id);
        }
    }

    /// Feeds one encoded frame. Returns `false` once the track has ended.
    pub async fn write_sample(&self, data: Bytes, duration: Duration) -> bool {
        if self.is_ended() {
            return false;
        }
        let sample = Sample {
            data,
            duration,
            ..Default::default()
        };
        self.rtp.write_sample(&sample).await.is_ok()
    }
}

impl fmt::Debug for LocalTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalTrack")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("ended", &self.is_ended())
            .finish()
    }
}

/// Inbound media track produced by the subscriber transport. The SFU
/// forwards each publication under its publisher id, so that id is what
/// the track reports.
#[derive(Clone)]
pub struct RemoteTrack {
    publisher_id: PublisherId,
    kind: MediaKind,
    rtp: Option<Arc<TrackRemote>>,
}

impl RemoteTrack {
    /// Track not backed by an RTP receiver, for transports that deliver media
    /// some other way.
    pub fn new(publisher_id: PublisherId, kind: MediaKind) -> Self {
        Self {
            publisher_id,
            kind,
            rtp: None,
        }
    }

    pub fn from_rtp(track: Arc<TrackRemote>) -> Self {
        let kind = match track.kind() {
            RTPCodecType::Video => MediaKind::Video,
            _ => MediaKind::Audio,
        };
        Self {
            publisher_id: PublisherId(track.id()),
            kind,
            rtp: Some(track),
        }
    }

    pub fn publisher_id(&self) -> &PublisherId {
        &self.publisher_id
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn rtp_track(&self) -> Option<Arc<TrackRemote>> {
        self.rtp.clone()
    }
}

impl fmt::Debug for RemoteTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteTrack")
            .field("publisher_id", &self.publisher_id)
            .field("kind", &self.kind)
            .field("rtp", &self.rtp.is_some())
            .finish()
    }
}

impl PartialEq for RemoteTrack {
    fn eq(&self, other: &Self) -> bool {
        self.publisher_id == other.publisher_id && self.kind == other.kind
    }
}

/// One peer connection toward the SFU. Results of negotiation that the
/// transport produces on its own (local candidates, the need for a new
/// offer, remote tracks) are pushed as [`TransportEvent`]s instead of being
/// returned here.
#[async_trait]
pub trait MediaTransport: Send + Sync {
    async fn add_track(&self, track: &LocalTrack) -> Result<(), NegotiationError>;

    async fn remove_track(&self, publisher_id: &PublisherId) -> Result<(), NegotiationError>;

    async fn create_offer(&self) -> Result<SessionDescription, NegotiationError>;

    async fn set_remote_answer(&self, answer: SessionDescription) -> Result<(), NegotiationError>;

    /// Applies a remote offer and returns the local answer.
    async fn accept_offer(
        &self,
        offer: SessionDescription,
    ) -> Result<SessionDescription, NegotiationError>;

    async fn add_remote_candidate(&self, candidate: IceCandidate) -> Result<(), NegotiationError>;

    async fn close(&self);
}

#[async_trait]
pub trait TransportFactory: Send + Sync {
    async fn create(
        &self,
        tag: TransportTag,
        ice_servers: &[IceServerConfig],
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Box<dyn MediaTransport>, NegotiationError>;
}
