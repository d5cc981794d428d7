use hangout_core::{Animation, PlayerId};

/// What one signaling event did to the room, for the renderer to pick up.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomChange {
    /// The whole roster was replaced by a `RoomState`.
    Reset { local_player_id: PlayerId },
    Added(PlayerId),
    Removed(PlayerId),
    /// Target pose changed.
    Moved(PlayerId),
    Animated(PlayerId, Animation),
}

impl RoomChange {
    pub fn player_id(&self) -> &PlayerId {
        match self {
            RoomChange::Reset { local_player_id } => local_player_id,
            RoomChange::Added(id)
            | RoomChange::Removed(id)
            | RoomChange::Moved(id)
            | RoomChange::Animated(id, _) => id,
        }
    }
}
