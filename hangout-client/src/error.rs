use hangout_core::MediaKind;
use thiserror::Error;

use crate::transport::TransportRole;

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("invalid signaling endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    #[error("websocket handshake failed: {0}")]
    Handshake(#[from] tokio_tungstenite::tungstenite::Error),
}

/// SDP/ICE exchange failures. Always recovered by resetting the affected
/// transport, never by ending the session.
#[derive(Debug, Clone, Error)]
pub enum NegotiationError {
    #[error("{0} transport is closed")]
    Closed(TransportRole),

    #[error("{0} transport is not initialized")]
    NotInitialized(TransportRole),

    #[error("{role} negotiation timed out")]
    Timeout { role: TransportRole },

    #[error("{role} transport failed: {reason}")]
    Transport { role: TransportRole, reason: String },
}

impl NegotiationError {
    pub fn transport(role: TransportRole, reason: impl ToString) -> Self {
        Self::Transport {
            role,
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum DeviceAccessError {
    #[error("permission to capture {0} was denied")]
    PermissionDenied(MediaKind),

    #[error("no {0} capture device available")]
    Unavailable(MediaKind),
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("signaling channel closed")]
pub struct ChannelClosed;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Negotiation(#[from] NegotiationError),

    #[error(transparent)]
    DeviceAccess(#[from] DeviceAccessError),

    #[error(transparent)]
    ChannelClosed(#[from] ChannelClosed),

    #[error("session has ended")]
    SessionEnded,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
