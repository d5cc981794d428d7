use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::config::MixerConfig;

struct Frame {
    at: Instant,
    sum_squares: f32,
    samples: usize,
}

/// Talking indicator for one inbound audio source. The level is the RMS
/// over a short sliding window. Turning on is immediate once the level
/// exceeds the threshold; turning off waits until the level has stayed
/// below it for the hold time.
pub struct TalkingDetector {
    threshold: f32,
    hold: Duration,
    window: Duration,
    frames: VecDeque<Frame>,
    last_loud: Option<Instant>,
}

impl TalkingDetector {
    pub fn new(config: &MixerConfig) -> Self {
        Self {
            threshold: config.talking_threshold,
            hold: config.talking_hold,
            window: config.energy_window,
            frames: VecDeque::new(),
            last_loud: None,
        }
    }

    /// Feeds decoded PCM (`-1.0..=1.0`) received at `now` and returns the
    /// indicator state afterwards.
    pub fn observe(&mut self, samples: &[f32], now: Instant) -> bool {
        if !samples.is_empty() {
            self.frames.push_back(Frame {
                at: now,
                sum_squares: samples.iter().map(|s| s * s).sum(),
                samples: samples.len(),
            });
        }
        while let Some(front) = self.frames.front() {
            if now.saturating_duration_since(front.at) > self.window {
                self.frames.pop_front();
            } else {
                break;
            }
        }

        if self.level() > self.threshold {
            self.last_loud = Some(now);
        }
        self.is_talking(now)
    }

    /// RMS over the current window.
    pub fn level(&self) -> f32 {
        let (sum, count) = self
            .frames
            .iter()
            .fold((0.0f32, 0usize), |(s, n), f| (s + f.sum_squares, n + f.samples));
        if count == 0 {
            0.0
        } else {
            (sum / count as f32).sqrt()
        }
    }

    pub fn is_talking(&self, now: Instant) -> bool {
        self.last_loud
            .is_some_and(|at| now.saturating_duration_since(at) < self.hold)
    }
}
