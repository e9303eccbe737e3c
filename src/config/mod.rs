//! Configuration module - environment variable parsing

use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use uuid::Uuid;

use crate::game::CharacterType;
use crate::util::time::SIMULATION_TPS;

/// How this instance takes part in a match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetMode {
    /// Both players on the local input set
    Offline,
    /// Authoritative, accepts one remote player
    Host,
    /// Mirrors a host
    Client,
}

impl FromStr for NetMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "offline" => Ok(NetMode::Offline),
            "host" => Ok(NetMode::Host),
            "client" => Ok(NetMode::Client),
            _ => Err(ConfigError::Invalid("NET_MODE")),
        }
    }
}

impl fmt::Display for NetMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NetMode::Offline => "offline",
            NetMode::Host => "host",
            NetMode::Client => "client",
        })
    }
}

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    pub net_mode: NetMode,
    /// Host binding address
    pub listen_addr: SocketAddr,
    /// Host base URL, e.g. `ws://192.168.1.20:9000` (client only)
    pub host_url: Option<String>,
    /// Host identity to dial (client only)
    pub host_peer_id: Option<Uuid>,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Session RNG seed; random when unset
    pub sim_seed: Option<u64>,
    pub p1_character: CharacterType,
    pub p2_character: CharacterType,
    /// Frame ticks per second
    pub tick_rate: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let net_mode = match lookup("NET_MODE") {
            Some(v) => v.parse()?,
            None => NetMode::Offline,
        };

        // PORT wins over LISTEN_ADDR, same as most PaaS setups
        let listen_addr = if let Some(port) = lookup("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            lookup("LISTEN_ADDR").unwrap_or_else(|| "0.0.0.0:9000".to_string())
        };

        let host_url = lookup("HOST_URL");
        let host_peer_id = lookup("HOST_PEER_ID")
            .map(|v| v.trim().parse::<Uuid>())
            .transpose()
            .map_err(|_| ConfigError::Invalid("HOST_PEER_ID"))?;

        if net_mode == NetMode::Client {
            if host_url.is_none() {
                return Err(ConfigError::Missing("HOST_URL"));
            }
            if host_peer_id.is_none() {
                return Err(ConfigError::Missing("HOST_PEER_ID"));
            }
        }

        let tick_rate = match lookup("TICK_RATE") {
            Some(v) => v
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|&tps| tps > 0)
                .ok_or(ConfigError::Invalid("TICK_RATE"))?,
            None => SIMULATION_TPS,
        };

        Ok(Self {
            net_mode,
            listen_addr: listen_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,
            host_url,
            host_peer_id,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            sim_seed: lookup("SIM_SEED")
                .map(|v| v.trim().parse::<u64>())
                .transpose()
                .map_err(|_| ConfigError::Invalid("SIM_SEED"))?,
            p1_character: character(&lookup, "P1_CHARACTER", CharacterType::SirWobbles)?,
            p2_character: character(&lookup, "P2_CHARACTER", CharacterType::GumbyLegs)?,
            tick_rate,
        })
    }
}

fn character<F>(lookup: &F, key: &'static str, default: CharacterType) -> Result<CharacterType, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(v) => v.parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid listen address format")]
    InvalidAddress,

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
