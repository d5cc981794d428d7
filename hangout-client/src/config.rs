use std::time::Duration;

use hangout_core::utils::default_stun_urls;
use hangout_core::{IceServerConfig, JoinRequest};

const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(20);
const DEFAULT_LIVENESS_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_NEGOTIATION_TIMEOUT: Duration = Duration::from_secs(15);
const DEFAULT_MOVE_INTERVAL: Duration = Duration::from_millis(100);
const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(50);
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// `ws://` or `wss://` signaling endpoint, without join parameters.
    pub endpoint: String,
    pub join: JoinRequest,
    pub heartbeat_interval: Duration,
    /// Close the channel when nothing arrives for this long. `None` leaves
    /// liveness entirely to the media connection.
    pub liveness_timeout: Option<Duration>,
    pub negotiation_timeout: Duration,
    /// Minimum spacing between outbound `PlayerMove` messages.
    pub move_interval: Duration,
    pub tick_interval: Duration,
    pub event_channel_capacity: usize,
    pub command_channel_capacity: usize,
    pub transport: TransportConfig,
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>, join: JoinRequest) -> Self {
        Self {
            endpoint: endpoint.into(),
            join,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            liveness_timeout: Some(DEFAULT_LIVENESS_TIMEOUT),
            negotiation_timeout: DEFAULT_NEGOTIATION_TIMEOUT,
            move_interval: DEFAULT_MOVE_INTERVAL,
            tick_interval: DEFAULT_TICK_INTERVAL,
            event_channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            command_channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            transport: TransportConfig::default(),
        }
    }

    #[must_use]
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    #[must_use]
    pub fn with_liveness_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.liveness_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_negotiation_timeout(mut self, timeout: Duration) -> Self {
        self.negotiation_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_move_interval(mut self, interval: Duration) -> Self {
        self.move_interval = interval;
        self
    }

    #[must_use]
    pub fn with_transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }
}

/// ICE servers used when the server does not hand out its own.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub ice_servers: Vec<IceServerConfig>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![IceServerConfig {
                urls: default_stun_urls(),
                username: None,
                credential: None,
            }],
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MixerConfig {
    /// Distance at which remote audio fades to silence.
    pub sound_radius: f32,
    /// RMS level above which a source counts as talking.
    pub talking_threshold: f32,
    /// How long the indicator stays on after the level last crossed the threshold.
    pub talking_hold: Duration,
    /// Width of the energy measurement window.
    pub energy_window: Duration,
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            sound_radius: 20.0,
            talking_threshold: 0.02,
            talking_hold: Duration::from_millis(800),
            energy_window: Duration::from_millis(100),
        }
    }
}
