use std::collections::BTreeMap;

use hangout_core::{Animation, FacialFeatures, PlayerData, PlayerId, Position, ServerMessage};
use tracing::{debug, info, warn};

use crate::room::RoomChange;

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRecord {
    pub id: PlayerId,
    pub display_name: String,
    pub color: String,
    pub activity: String,
    pub facial_features: FacialFeatures,
    /// Last pose reported by the server (or set locally for our own
    /// avatar). Renderers ease toward it.
    pub position: Position,
    pub facing: f32,
    pub is_moving: bool,
    pub active_animation: Animation,
    pub is_local: bool,
}

impl PlayerRecord {
    fn from_wire(data: PlayerData, is_local: bool) -> Self {
        Self {
            id: data.id,
            display_name: data.name,
            color: data.color,
            activity: data.activity,
            facial_features: data.facial_features,
            position: data.position,
            facing: data.rotation,
            is_moving: data.is_moving,
            active_animation: Animation::None,
            is_local,
        }
    }

    fn placeholder(id: PlayerId) -> Self {
        Self {
            id,
            display_name: String::new(),
            color: String::new(),
            activity: String::new(),
            facial_features: FacialFeatures::default(),
            position: Position::ORIGIN,
            facing: 0.0,
            is_moving: false,
            active_animation: Animation::None,
            is_local: true,
        }
    }
}

/// Local mirror of the room roster. Only signaling events and local pose
/// updates change it.
#[derive(Debug, Default)]
pub struct RoomState {
    local_player_id: Option<PlayerId>,
    room_theme: Option<String>,
    players: BTreeMap<PlayerId, PlayerRecord>,
}

impl RoomState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn local_player_id(&self) -> Option<&PlayerId> {
        self.local_player_id.as_ref()
    }

    pub fn room_theme(&self) -> Option<&str> {
        self.room_theme.as_deref()
    }

    pub fn player(&self, id: &PlayerId) -> Option<&PlayerRecord> {
        self.players.get(id)
    }

    pub fn players(&self) -> impl Iterator<Item = &PlayerRecord> {
        self.players.values()
    }

    pub fn contains(&self, id: &PlayerId) -> bool {
        self.players.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    fn is_local(&self, id: &PlayerId) -> bool {
        self.local_player_id.as_ref() == Some(id)
    }

    /// Applies one server message. Messages that do not concern the roster
    /// yield nothing; messages naming unknown players are logged and ignored.
    pub fn apply(&mut self, message: &ServerMessage) -> Vec<RoomChange> {
        match message {
            ServerMessage::RoomState {
                your_player_id,
                players,
                room_theme,
                ..
            } => self.reset(your_player_id, players, room_theme),

            ServerMessage::PlayerJoined { player } => {
                if self.local_player_id.is_none() {
                    warn!("PlayerJoined before RoomState, ignoring {}", player.id.short());
                    return vec![];
                }
                let id = player.id.clone();
                let is_local = self.is_local(&id);
                let existed = self
                    .players
                    .insert(id.clone(), PlayerRecord::from_wire(player.clone(), is_local))
                    .is_some();
                if existed {
                    debug!("PlayerJoined for known player {}, refreshed", id.short());
                    vec![RoomChange::Moved(id)]
                } else {
                    info!("Player {} ({}) joined", player.name, id.short());
                    vec![RoomChange::Added(id)]
                }
            }

            ServerMessage::PlayerLeft { player_id } => {
                if self.is_local(player_id) {
                    warn!("PlayerLeft names the local player, ignoring");
                    return vec![];
                }
                match self.players.remove(player_id) {
                    Some(record) => {
                        info!("Player {} ({}) left", record.display_name, player_id.short());
                        vec![RoomChange::Removed(player_id.clone())]
                    }
                    None => {
                        warn!("PlayerLeft for unknown player {}", player_id.short());
                        vec![]
                    }
                }
            }

            ServerMessage::PlayerMoved {
                player_id,
                position,
                rotation,
                is_moving,
            } => {
                if self.is_local(player_id) {
                    debug!("Ignoring server pose for the local player");
                    return vec![];
                }
                let Some(record) = self.players.get_mut(player_id) else {
                    warn!("PlayerMoved for unknown player {}", player_id.short());
                    return vec![];
                };
                record.position = *position;
                record.facing = *rotation;
                record.is_moving = *is_moving;
                vec![RoomChange::Moved(player_id.clone())]
            }

            ServerMessage::PlayerAnimation {
                player_id,
                animation,
            } => match self.players.get_mut(player_id) {
                Some(record) => {
                    record.active_animation = *animation;
                    vec![RoomChange::Animated(player_id.clone(), *animation)]
                }
                None => {
                    warn!("PlayerAnimation for unknown player {}", player_id.short());
                    vec![]
                }
            },

            _ => vec![],
        }
    }

    fn reset(
        &mut self,
        local_id: &PlayerId,
        players: &[PlayerData],
        room_theme: &str,
    ) -> Vec<RoomChange> {
        self.players.clear();
        self.local_player_id = Some(local_id.clone());
        self.room_theme = Some(room_theme.to_owned());

        for data in players {
            let is_local = &data.id == local_id;
            if self.players.contains_key(&data.id) {
                warn!("Duplicate player {} in RoomState", data.id.short());
            }
            self.players
                .insert(data.id.clone(), PlayerRecord::from_wire(data.clone(), is_local));
        }
        if !self.players.contains_key(local_id) {
            warn!("RoomState does not list the local player, adding it");
            self.players
                .insert(local_id.clone(), PlayerRecord::placeholder(local_id.clone()));
        }

        info!(
            "Joined room '{}' as {} with {} other player(s)",
            room_theme,
            local_id.short(),
            self.players.len() - 1
        );
        vec![RoomChange::Reset {
            local_player_id: local_id.clone(),
        }]
    }

    /// Updates our own avatar. The local pose is authoritative here and
    /// pushed to the server separately.
    pub fn set_local_pose(
        &mut self,
        position: Position,
        facing: f32,
        is_moving: bool,
    ) -> Option<RoomChange> {
        let id = self.local_player_id.clone()?;
        let record = self.players.get_mut(&id)?;
        record.position = position;
        record.facing = facing;
        record.is_moving = is_moving;
        Some(RoomChange::Moved(id))
    }

    pub fn set_local_animation(&mut self, animation: Animation) -> Option<RoomChange> {
        let id = self.local_player_id.clone()?;
        let record = self.players.get_mut(&id)?;
        record.active_animation = animation;
        Some(RoomChange::Animated(id, animation))
    }

    pub fn clear(&mut self) {
        self.players.clear();
        self.local_player_id = None;
        self.room_theme = None;
    }
}
