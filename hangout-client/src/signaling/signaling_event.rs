use hangout_core::ServerMessage;

/// Inbound stream produced by the signaling channel. `Disconnected` is
/// always the last event.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalingEvent {
    Message(ServerMessage),
    Disconnected(DisconnectReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    ClosedByServer,
    ClosedLocally,
    HeartbeatTimeout,
    Transport(String),
}

impl std::fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisconnectReason::ClosedByServer => f.write_str("closed by server"),
            DisconnectReason::ClosedLocally => f.write_str("closed locally"),
            DisconnectReason::HeartbeatTimeout => f.write_str("heartbeat timeout"),
            DisconnectReason::Transport(e) => write!(f, "transport error: {e}"),
        }
    }
}
