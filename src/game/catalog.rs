//! Character catalog - fixed per-archetype tuning

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Character archetypes available in the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CharacterType {
    /// Top-heavy, slams the ground
    SirWobbles,
    /// Long legs, spins
    GumbyLegs,
    /// Rotund, rolls invulnerably
    BarrelBob,
    /// Paper thin, glides
    FlatStanley,
    /// Small, throws a hat boomerang
    TinyTim,
}

impl CharacterType {
    pub const ALL: [CharacterType; 5] = [
        CharacterType::SirWobbles,
        CharacterType::GumbyLegs,
        CharacterType::BarrelBob,
        CharacterType::FlatStanley,
        CharacterType::TinyTim,
    ];

    /// Wire tag, e.g. `SIR_WOBBLES`
    pub fn as_str(&self) -> &'static str {
        match self {
            CharacterType::SirWobbles => "SIR_WOBBLES",
            CharacterType::GumbyLegs => "GUMBY_LEGS",
            CharacterType::BarrelBob => "BARREL_BOB",
            CharacterType::FlatStanley => "FLAT_STANLEY",
            CharacterType::TinyTim => "TINY_TIM",
        }
    }

    pub fn stats(&self) -> &'static CharacterStats {
        CharacterStats::for_type(*self)
    }
}

impl fmt::Display for CharacterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown character: {0}")]
pub struct UnknownCharacter(pub String);

impl FromStr for CharacterType {
    type Err = UnknownCharacter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_uppercase();
        CharacterType::ALL
            .into_iter()
            .find(|c| c.as_str() == tag)
            .ok_or_else(|| UnknownCharacter(s.to_string()))
    }
}

/// Physical and flavor constants per archetype
#[derive(Debug, Clone, Copy)]
pub struct CharacterStats {
    pub name: &'static str,
    pub description: &'static str,
    pub color: &'static str,
    /// Hitbox width
    pub width: f32,
    /// Hitbox height
    pub height: f32,
    /// Knockback divisor
    pub mass: f32,
    pub speed_mod: f32,
    pub jump_mod: f32,
    pub trait_name: &'static str,
    pub special_name: &'static str,
    pub special_desc: &'static str,
}

const SIR_WOBBLES: CharacterStats = CharacterStats {
    name: "Sir Wobbles",
    description: "Giant head, trips easily.",
    color: "#fbbf24",
    width: 60.0,
    height: 100.0,
    mass: 1.2,
    speed_mod: 0.9,
    jump_mod: 0.9,
    trait_name: "Top Heavy",
    special_name: "Headbang Quake",
    special_desc: "Slams ground to stun opponent.",
};

const GUMBY_LEGS: CharacterStats = CharacterStats {
    name: "Gumby Legs",
    description: "Long rubbery legs.",
    color: "#4ade80",
    width: 50.0,
    height: 130.0,
    mass: 1.0,
    speed_mod: 1.2,
    jump_mod: 1.1,
    trait_name: "High Step",
    special_name: "Noodle Spin",
    special_desc: "Helicopter legs knockback.",
};

const BARREL_BOB: CharacterStats = CharacterStats {
    name: "Barrel Bob",
    description: "Rotund and rolls.",
    color: "#f87171",
    width: 90.0,
    height: 80.0,
    mass: 1.5,
    speed_mod: 0.8,
    jump_mod: 0.8,
    trait_name: "Bouncy",
    special_name: "Bowling Blitz",
    special_desc: "Rolls invincibly forward.",
};

const FLAT_STANLEY: CharacterStats = CharacterStats {
    name: "Flat Stanley",
    description: "2D and thin.",
    color: "#60a5fa",
    width: 20.0,
    height: 110.0,
    mass: 0.5,
    speed_mod: 1.1,
    jump_mod: 1.3,
    trait_name: "Paper Thin",
    special_name: "Paper Glide",
    special_desc: "Floats in air, fast movement.",
};

// Hat is not part of the hurtbox
const TINY_TIM: CharacterStats = CharacterStats {
    name: "Tiny Tim",
    description: "Small guy, big hat.",
    color: "#c084fc",
    width: 45.0,
    height: 70.0,
    mass: 0.8,
    speed_mod: 1.15,
    jump_mod: 1.1,
    trait_name: "Big Hat",
    special_name: "Hat Boomerang",
    special_desc: "Throws hat to stun.",
};

impl CharacterStats {
    pub fn for_type(character: CharacterType) -> &'static Self {
        match character {
            CharacterType::SirWobbles => &SIR_WOBBLES,
            CharacterType::GumbyLegs => &GUMBY_LEGS,
            CharacterType::BarrelBob => &BARREL_BOB,
            CharacterType::FlatStanley => &FLAT_STANLEY,
            CharacterType::TinyTim => &TINY_TIM,
        }
    }
}
