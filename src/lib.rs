//! Stick Brawl - two-player stick fighting with host-authoritative sync
//!
//! Core modules:
//! - `game`: Deterministic fixed-step simulation (physics, combat, match flow)
//! - `ws`: Peer link (wire protocol, host endpoint, client dialer)
//! - `app`: Session ownership, tick roles and async drivers
//! - `config`: Environment configuration

pub mod app;
pub mod config;
pub mod game;
pub mod util;
pub mod ws;
