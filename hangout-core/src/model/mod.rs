mod join;
mod player;
mod publisher;
mod signaling;

pub use join::JoinRequest;
pub use player::{Animation, FacialFeatures, PlayerData, PlayerId, Position};
pub use publisher::{MediaKind, PublisherId, SubscriberId};
pub use signaling::{
    ClientMessage, IceCandidate, IceServerConfig, SdpType, ServerMessage, SessionDescription,
};
