use std::sync::Arc;

use hangout_core::{MediaKind, PlayerId, Position, PublisherId};
use tokio::sync::watch;

use crate::audio::AudioContextState;
use crate::binding::TrackBinding;
use crate::room::{PlayerRecord, RoomState};

/// Immutable copy of the room handed to renderers and the audio mixer.
#[derive(Debug, Clone, Default)]
pub struct RoomSnapshot {
    pub local_player_id: Option<PlayerId>,
    pub room_theme: Option<String>,
    pub players: Vec<PlayerRecord>,
    pub bindings: Vec<TrackBinding>,
    pub audio: AudioContextState,
    pub connected: bool,
}

impl RoomSnapshot {
    pub(crate) fn capture(
        room: &RoomState,
        bindings: Vec<TrackBinding>,
        audio: AudioContextState,
        connected: bool,
    ) -> Self {
        Self {
            local_player_id: room.local_player_id().cloned(),
            room_theme: room.room_theme().map(str::to_owned),
            players: room.players().cloned().collect(),
            bindings,
            audio,
            connected,
        }
    }

    pub fn local(&self) -> Option<&PlayerRecord> {
        self.players.iter().find(|p| p.is_local)
    }

    pub fn player(&self, id: &PlayerId) -> Option<&PlayerRecord> {
        self.players.iter().find(|p| &p.id == id)
    }

    pub fn remote_players(&self) -> impl Iterator<Item = &PlayerRecord> {
        self.players.iter().filter(|p| !p.is_local)
    }

    pub fn binding(&self, publisher_id: &PublisherId) -> Option<&TrackBinding> {
        self.bindings
            .iter()
            .find(|b| &b.publisher_id == publisher_id)
    }

    /// Owners of bound audio tracks with their current target positions.
    /// Bindings whose owner is not in the roster are left out.
    pub fn audio_sources(&self) -> Vec<(PlayerId, Position)> {
        self.bindings
            .iter()
            .filter(|b| b.media_kind == MediaKind::Audio)
            .filter_map(|b| {
                self.player(&b.owner_player_id)
                    .map(|p| (p.id.clone(), p.position))
            })
            .collect()
    }
}

/// Read side of the room. Cheap to clone; every clone sees the latest
/// snapshot.
#[derive(Debug, Clone)]
pub struct RoomView {
    rx: watch::Receiver<Arc<RoomSnapshot>>,
}

impl RoomView {
    pub(crate) fn new(rx: watch::Receiver<Arc<RoomSnapshot>>) -> Self {
        Self { rx }
    }

    pub fn snapshot(&self) -> Arc<RoomSnapshot> {
        Arc::clone(&self.rx.borrow())
    }

    /// Waits for the next snapshot. Returns `false` once the session is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}
