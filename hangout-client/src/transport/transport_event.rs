use hangout_core::IceCandidate;

use crate::transport::{RemoteTrack, TransportTag};

/// Everything a transport reports asynchronously. Transports push these into
/// the same loop that handles signaling, so the orchestrator sees one queue
/// instead of interleaved callbacks.
#[derive(Debug)]
pub enum TransportEvent {
    /// Local ICE candidate that must be relayed to the SFU.
    CandidateGenerated(TransportTag, IceCandidate),

    /// Tracks changed on the publisher; a fresh offer is required.
    NegotiationNeeded(TransportTag),

    /// The subscriber produced a remote media track.
    TrackReady(TransportTag, RemoteTrack),

    /// The underlying connection failed or closed.
    Disconnected(TransportTag),
}

impl TransportEvent {
    pub fn tag(&self) -> TransportTag {
        match self {
            TransportEvent::CandidateGenerated(tag, _)
            | TransportEvent::NegotiationNeeded(tag)
            | TransportEvent::TrackReady(tag, _)
            | TransportEvent::Disconnected(tag) => *tag,
        }
    }
}
