//! Peer protocol message definitions
//! These are the wire types exchanged between host and client

use serde::{Deserialize, Serialize};

use crate::game::{CharacterType, Hazard, ParticleSpawn, PlayerState, Projectile, RoundOutcome};

/// Messages exchanged over the peer link (both directions)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NetMessage {
    /// Client's currently held action codes, every tick
    Input { keys: Vec<String> },

    /// Full authoritative snapshot, every host tick while playing
    #[serde(rename_all = "camelCase")]
    GameState {
        players: [PlayerState; 2],
        projectiles: Vec<Projectile>,
        hazards: Vec<Hazard>,
        /// Seconds left in the round
        time_left: u32,
        wind_force: f32,
        /// Set on the tick the round ends
        #[serde(default, skip_serializing_if = "Option::is_none")]
        outcome: Option<RoundOutcome>,
    },

    /// Cosmetic burst to replay locally
    ParticleEvent {
        x: f32,
        y: f32,
        color: String,
        count: u32,
    },

    /// Character selection sync and match start
    #[serde(rename_all = "camelCase")]
    MenuUpdate {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        p1_char: Option<CharacterType>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        p2_char: Option<CharacterType>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        start_game: Option<bool>,
    },
}

impl NetMessage {
    pub fn particle(spawn: &ParticleSpawn) -> Self {
        NetMessage::ParticleEvent {
            x: spawn.x,
            y: spawn.y,
            color: spawn.color.clone(),
            count: spawn.count,
        }
    }

    pub fn start_game() -> Self {
        NetMessage::MenuUpdate {
            p1_char: None,
            p2_char: None,
            start_game: Some(true),
        }
    }

    /// Wire tag, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            NetMessage::Input { .. } => "INPUT",
            NetMessage::GameState { .. } => "GAME_STATE",
            NetMessage::ParticleEvent { .. } => "PARTICLE_EVENT",
            NetMessage::MenuUpdate { .. } => "MENU_UPDATE",
        }
    }
}

/// Encoding/decoding errors
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Malformed message: {0}")]
    Decode(#[source] serde_json::Error),
}

pub fn encode(msg: &NetMessage) -> Result<String, ProtocolError> {
    serde_json::to_string(msg).map_err(ProtocolError::Encode)
}

pub fn decode(text: &str) -> Result<NetMessage, ProtocolError> {
    serde_json::from_str(text).map_err(ProtocolError::Decode)
}
