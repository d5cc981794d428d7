use std::time::Duration;

use hangout_core::{ClientMessage, Position};
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingMove {
    pub position: Position,
    pub rotation: f32,
    pub is_moving: bool,
}

impl From<PendingMove> for ClientMessage {
    fn from(m: PendingMove) -> Self {
        ClientMessage::PlayerMove {
            position: m.position,
            rotation: m.rotation,
            is_moving: m.is_moving,
        }
    }
}

/// Rate limit for outbound `PlayerMove`. At most one message per interval;
/// moves in between collapse into the latest one, which goes out on a
/// later flush.
#[derive(Debug)]
pub struct MoveThrottle {
    interval: Duration,
    last_sent: Option<Instant>,
    pending: Option<PendingMove>,
}

impl MoveThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_sent: None,
            pending: None,
        }
    }

    fn ready(&self, now: Instant) -> bool {
        self.last_sent
            .is_none_or(|at| now.saturating_duration_since(at) >= self.interval)
    }

    /// Returns the move to send right away, if the interval allows it.
    pub fn push(&mut self, m: PendingMove, now: Instant) -> Option<PendingMove> {
        if self.ready(now) {
            self.pending = None;
            self.last_sent = Some(now);
            Some(m)
        } else {
            self.pending = Some(m);
            None
        }
    }

    /// Releases the held move once the interval has passed.
    pub fn flush(&mut self, now: Instant) -> Option<PendingMove> {
        if self.pending.is_some() && self.ready(now) {
            self.last_sent = Some(now);
            self.pending.take()
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.pending = None;
    }
}
