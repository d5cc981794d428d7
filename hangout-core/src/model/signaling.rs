use crate::model::player::{Animation, PlayerData, PlayerId, Position};
use crate::model::publisher::{PublisherId, SubscriberId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpType {
    Offer,
    Pranswer,
    Answer,
    Rollback,
}

/// `{"type": "offer", "sdp": "v=0..."}` as produced by every WebRTC stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub sdp_type: SdpType,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: SdpType::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: SdpType::Answer,
            sdp: sdp.into(),
        }
    }
}

/// Trickle ICE candidate in the browser `RTCIceCandidateInit` shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(rename = "sdpMid", default, skip_serializing_if = "Option::is_none")]
    pub sdp_mid: Option<String>,
    #[serde(
        rename = "sdpMLineIndex",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub sdp_mline_index: Option<u16>,
    #[serde(
        rename = "usernameFragment",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub username_fragment: Option<String>,
}

/// Client -> server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum ClientMessage {
    Ping,
    PublisherInit,
    SubscriberInit,
    Offer {
        sdp: SessionDescription,
    },
    Answer {
        sdp: SessionDescription,
    },
    PublisherIce {
        candidate: IceCandidate,
    },
    SubscriberIce {
        candidate: IceCandidate,
    },
    #[serde(rename_all = "camelCase")]
    Publish {
        publisher_id: PublisherId,
    },
    #[serde(rename_all = "camelCase")]
    Subscribe {
        publisher_id: PublisherId,
    },
    #[serde(rename_all = "camelCase")]
    StopPublish {
        publisher_id: PublisherId,
    },
    #[serde(rename_all = "camelCase")]
    StopSubscribe {
        subscriber_id: SubscriberId,
    },
    ChatMessage {
        message: String,
    },
    #[serde(rename_all = "camelCase")]
    PlayerMove {
        position: Position,
        rotation: f32,
        is_moving: bool,
    },
    PlayAnimation {
        animation: Animation,
    },
}

/// Server -> client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum ServerMessage {
    Pong,
    Answer {
        sdp: SessionDescription,
    },
    Offer {
        sdp: SessionDescription,
    },
    PublisherIce {
        candidate: IceCandidate,
    },
    SubscriberIce {
        candidate: IceCandidate,
    },
    #[serde(rename_all = "camelCase")]
    Published {
        publisher_ids: Vec<PublisherId>,
        player_id: PlayerId,
    },
    #[serde(rename_all = "camelCase")]
    Subscribed {
        subscriber_id: SubscriberId,
    },
    #[serde(rename_all = "camelCase")]
    SubscribeFailed {
        publisher_id: PublisherId,
        error: String,
    },
    #[serde(rename_all = "camelCase")]
    Unpublished {
        publisher_id: PublisherId,
    },
    ChatMessage {
        sender: String,
        message: String,
    },
    #[serde(rename_all = "camelCase")]
    RoomState {
        your_player_id: PlayerId,
        players: Vec<PlayerData>,
        room_theme: String,
        #[serde(default)]
        ice_servers: Vec<IceServerConfig>,
    },
    PlayerJoined {
        player: PlayerData,
    },
    #[serde(rename_all = "camelCase")]
    PlayerLeft {
        player_id: PlayerId,
    },
    #[serde(rename_all = "camelCase")]
    PlayerMoved {
        player_id: PlayerId,
        position: Position,
        rotation: f32,
        is_moving: bool,
    },
    #[serde(rename_all = "camelCase")]
    PlayerAnimation {
        player_id: PlayerId,
        animation: Animation,
    },
}

impl ServerMessage {
    /// Wire discriminator, handy for logging without dumping SDP bodies.
    pub fn action(&self) -> &'static str {
        match self {
            ServerMessage::Pong => "Pong",
            ServerMessage::Answer { .. } => "Answer",
            ServerMessage::Offer { .. } => "Offer",
            ServerMessage::PublisherIce { .. } => "PublisherIce",
            ServerMessage::SubscriberIce { .. } => "SubscriberIce",
            ServerMessage::Published { .. } => "Published",
            ServerMessage::Subscribed { .. } => "Subscribed",
            ServerMessage::SubscribeFailed { .. } => "SubscribeFailed",
            ServerMessage::Unpublished { .. } => "Unpublished",
            ServerMessage::ChatMessage { .. } => "ChatMessage",
            ServerMessage::RoomState { .. } => "RoomState",
            ServerMessage::PlayerJoined { .. } => "PlayerJoined",
            ServerMessage::PlayerLeft { .. } => "PlayerLeft",
            ServerMessage::PlayerMoved { .. } => "PlayerMoved",
            ServerMessage::PlayerAnimation { .. } => "PlayerAnimation",
        }
    }
}
