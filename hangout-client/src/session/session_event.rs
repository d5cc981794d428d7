use hangout_core::{PlayerId, PublisherId};

use crate::binding::{ReleasedBinding, TrackBinding};
use crate::publish::PublisherHandle;
use crate::room::RoomChange;
use crate::signaling::DisconnectReason;
use crate::transport::TransportRole;

/// Notifications for the application, in the order the session produced
/// them.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    RoomJoined {
        local_player_id: PlayerId,
        room_theme: String,
    },

    Room(RoomChange),

    Chat { sender: String, message: String },

    /// A remote track now has a known owner.
    TrackBound(TrackBinding),

    TrackReleased(ReleasedBinding),

    PublicationLive(PublisherHandle),

    /// A publication ended without being stopped by the caller.
    PublicationFailed {
        publisher_id: PublisherId,
        reason: String,
    },

    SubscribeFailed {
        publisher_id: PublisherId,
        reason: String,
    },

    /// A transport was torn down after a negotiation failure and started over.
    TransportReset { role: TransportRole, reason: String },

    /// Terminal. Nothing follows it.
    Disconnected(DisconnectReason),
}
