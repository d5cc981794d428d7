use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

use crate::transport::{TransportRole, TransportTag};

/// Per-direction signaling progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalingState {
    Uninitialized,
    Initializing,
    Negotiating,
    Stable,
    Closed,
}

impl SignalingState {
    pub fn can_transition_to(self, next: SignalingState) -> bool {
        use SignalingState::*;
        match (self, next) {
            (Closed, _) => false,
            (_, Closed) => true,
            (Uninitialized, Initializing) => true,
            (Initializing, Negotiating) => true,
            (Negotiating, Stable) => true,
            (Stable, Negotiating) => true,
            _ => false,
        }
    }
}

impl fmt::Display for SignalingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTransition {
    pub role: TransportRole,
    pub from: SignalingState,
    pub to: SignalingState,
}

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} -> {} not allowed", self.role, self.from, self.to)
    }
}

/// State machine for one transport instance. A reset builds a new machine
/// with the next generation; `Closed` is terminal for the instance.
#[derive(Debug, Clone)]
pub struct SignalingMachine {
    tag: TransportTag,
    state: SignalingState,
    deadline: Option<Instant>,
}

impl SignalingMachine {
    pub fn new(role: TransportRole, generation: u64) -> Self {
        Self {
            tag: TransportTag { role, generation },
            state: SignalingState::Uninitialized,
            deadline: None,
        }
    }

    pub fn tag(&self) -> TransportTag {
        self.tag
    }

    pub fn state(&self) -> SignalingState {
        self.state
    }

    /// Moves to `next`. Entering `Negotiating` arms a response deadline,
    /// leaving it disarms it.
    pub fn advance(
        &mut self,
        next: SignalingState,
        timeout: Duration,
    ) -> Result<(), InvalidTransition> {
        if !self.state.can_transition_to(next) {
            return Err(InvalidTransition {
                role: self.tag.role,
                from: self.state,
                to: next,
            });
        }
        self.deadline = match next {
            SignalingState::Negotiating => Some(Instant::now() + timeout),
            _ => None,
        };
        self.state = next;
        Ok(())
    }

    pub fn close(&mut self) {
        self.state = SignalingState::Closed;
        self.deadline = None;
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        matches!(self.deadline, Some(deadline) if now >= deadline)
    }

    /// Whether the side can still carry a new publication or subscription
    /// without a reset.
    pub fn is_open(&self) -> bool {
        matches!(
            self.state,
            SignalingState::Initializing | SignalingState::Negotiating | SignalingState::Stable
        )
    }
}
