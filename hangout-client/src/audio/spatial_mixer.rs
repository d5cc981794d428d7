use std::collections::HashMap;
use std::time::Instant;

use hangout_core::{PlayerId, Position};

use crate::audio::TalkingDetector;
use crate::config::MixerConfig;

/// Linear falloff: full volume at the listener, silent at `radius` and
/// beyond.
pub fn gain_for_distance(distance: f32, radius: f32) -> f32 {
    if radius <= 0.0 {
        return 0.0;
    }
    (1.0 - distance / radius).clamp(0.0, 1.0)
}

/// Playback gain and talking state for every bound remote audio source.
/// Call [`SpatialAudioMixer::update`] once per frame with the listener
/// position and the sources from the current room snapshot.
pub struct SpatialAudioMixer {
    config: MixerConfig,
    gains: HashMap<PlayerId, f32>,
    talking: HashMap<PlayerId, TalkingDetector>,
}

impl Default for SpatialAudioMixer {
    fn default() -> Self {
        Self::new(MixerConfig::default())
    }
}

impl SpatialAudioMixer {
    pub fn new(config: MixerConfig) -> Self {
        Self {
            config,
            gains: HashMap::new(),
            talking: HashMap::new(),
        }
    }

    pub fn config(&self) -> &MixerConfig {
        &self.config
    }

    /// Recomputes every gain. Sources missing from `sources` are dropped,
    /// along with their talking state.
    pub fn update<I>(&mut self, listener: Position, sources: I)
    where
        I: IntoIterator<Item = (PlayerId, Position)>,
    {
        let radius = self.config.sound_radius;
        self.gains = sources
            .into_iter()
            .map(|(id, position)| {
                let gain = gain_for_distance(listener.distance(&position), radius);
                (id, gain)
            })
            .collect();
        self.talking.retain(|id, _| self.gains.contains_key(id));
    }

    pub fn gain(&self, player_id: &PlayerId) -> Option<f32> {
        self.gains.get(player_id).copied()
    }

    pub fn gains(&self) -> impl Iterator<Item = (&PlayerId, f32)> {
        self.gains.iter().map(|(id, g)| (id, *g))
    }

    /// Feeds decoded inbound audio for `player_id`. Returns whether the
    /// player counts as talking afterwards.
    pub fn observe(&mut self, player_id: &PlayerId, samples: &[f32], now: Instant) -> bool {
        let config = self.config;
        self.talking
            .entry(player_id.clone())
            .or_insert_with(|| TalkingDetector::new(&config))
            .observe(samples, now)
    }

    pub fn is_talking(&self, player_id: &PlayerId, now: Instant) -> bool {
        self.talking
            .get(player_id)
            .is_some_and(|detector| detector.is_talking(now))
    }
}
