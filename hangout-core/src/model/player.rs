use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-assigned player identity. Opaque to the client.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight characters, used to keep log lines readable.
    pub fn short(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(8)
            .map(|(i, _)| i)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }
}

impl From<&str> for PlayerId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for PlayerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Point in world space.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub const ORIGIN: Position = Position {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn distance(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Moves `t` of the way from `self` toward `target`.
    pub fn lerp(&self, target: &Position, t: f32) -> Position {
        Position {
            x: self.x + (target.x - self.x) * t,
            y: self.y + (target.y - self.y) * t,
            z: self.z + (target.z - self.z) * t,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct FacialFeatures {
    pub eye_style: String,
    pub nose_style: String,
    pub mouth_style: String,
    pub character_type: String,
}

impl Default for FacialFeatures {
    fn default() -> Self {
        Self {
            eye_style: String::new(),
            nose_style: String::new(),
            mouth_style: String::new(),
            character_type: "cat".to_owned(),
        }
    }
}

/// One-shot emote an avatar can play.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Animation {
    Jump,
    Wave,
    Dance,
    #[default]
    #[serde(other)]
    None,
}

/// Player as it travels on the wire in `RoomState` and `PlayerJoined`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerData {
    pub id: PlayerId,
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub activity: String,
    #[serde(default)]
    pub facial_features: FacialFeatures,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub rotation: f32,
    #[serde(default)]
    pub is_moving: bool,
}
