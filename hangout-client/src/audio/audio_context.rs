use std::fmt;

use tracing::{debug, info};

/// Opus runs at 48 kHz; everything decoded for playback uses the same rate.
pub const AUDIO_SAMPLE_RATE: u32 = 48_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AudioContextState {
    #[default]
    Idle,
    Running,
    Closed,
}

impl fmt::Display for AudioContextState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// The one decoding/mixing context of a session. Started by the first
/// microphone or remote audio track and closed with the session; once
/// closed it stays closed.
#[derive(Debug, Default)]
pub struct AudioContext {
    state: AudioContextState,
}

impl AudioContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> AudioContextState {
        self.state
    }

    pub fn sample_rate(&self) -> u32 {
        AUDIO_SAMPLE_RATE
    }

    /// Starts the context on first use. Returns `false` if it was already
    /// closed.
    pub fn acquire(&mut self, reason: &str) -> bool {
        match self.state {
            AudioContextState::Idle => {
                info!("Audio context started ({})", reason);
                self.state = AudioContextState::Running;
                true
            }
            AudioContextState::Running => true,
            AudioContextState::Closed => {
                debug!("Audio context closed, not restarting for {}", reason);
                false
            }
        }
    }

    pub fn close(&mut self) {
        if self.state == AudioContextState::Running {
            info!("Audio context closed");
        }
        self.state = AudioContextState::Closed;
    }
}
