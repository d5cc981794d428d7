use std::collections::HashMap;

use hangout_core::{PlayerId, Position};

use crate::room::RoomSnapshot;

pub const DEFAULT_SMOOTHING: f32 = 0.15;

/// Per-frame easing of displayed remote positions toward the targets in
/// the room snapshot. Movement messages arrive far less often than frames,
/// so jumping straight to each target would stutter.
#[derive(Debug, Clone)]
pub struct PositionSmoother {
    factor: f32,
    displayed: HashMap<PlayerId, Position>,
}

impl Default for PositionSmoother {
    fn default() -> Self {
        Self::new(DEFAULT_SMOOTHING)
    }
}

impl PositionSmoother {
    pub fn new(factor: f32) -> Self {
        Self {
            factor: factor.clamp(0.0, 1.0),
            displayed: HashMap::new(),
        }
    }

    /// Advances one frame. Players seen for the first time and the local
    /// player snap to their target; players no longer in the room are
    /// forgotten.
    pub fn step(&mut self, snapshot: &RoomSnapshot) {
        self.displayed
            .retain(|id, _| snapshot.players.iter().any(|p| &p.id == id));

        for player in &snapshot.players {
            let target = player.position;
            match self.displayed.get_mut(&player.id) {
                Some(shown) if !player.is_local => *shown = shown.lerp(&target, self.factor),
                Some(shown) => *shown = target,
                None => {
                    self.displayed.insert(player.id.clone(), target);
                }
            }
        }
    }

    pub fn position(&self, id: &PlayerId) -> Option<Position> {
        self.displayed.get(id).copied()
    }
}
