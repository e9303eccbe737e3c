//! Entity records shared by the engine, the snapshot and the wire

use serde::{Deserialize, Serialize};

use super::catalog::{CharacterStats, CharacterType};
use super::physics::{GROUND_Y, MAX_STICKS, STICK_FULL_DURABILITY, WORLD_WIDTH};

pub const INITIAL_HP: f32 = 100.0;

/// Player slot, 1 or 2
pub type PlayerId = u8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    /// -1 for left, 1 for right
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }
}

/// One competitor (authoritative on host/offline, mirror on client)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    pub id: PlayerId,
    pub character: CharacterType,

    // Position is bottom-center of the hitbox
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,

    pub hp: f32,
    pub max_hp: f32,
    pub facing: Facing,

    pub is_grounded: bool,
    pub is_ducking: bool,
    pub is_attacking: bool,
    pub attack_cooldown: f32,
    pub is_stunned: bool,
    pub stun_timer: f32,

    pub special_cooldown: f32,
    pub is_special_active: bool,
    pub special_timer: f32,

    pub is_flattened: bool,
    pub flatten_timer: f32,

    pub has_stick: bool,
    pub stick_durability: f32,
    pub sticks_remaining_in_pile: u32,
}

impl PlayerState {
    /// Fresh player for match start: P1 left facing right, P2 mirrored
    pub fn new(id: PlayerId, character: CharacterType) -> Self {
        let first = id == 1;
        Self {
            id,
            character,
            x: if first { 200.0 } else { WORLD_WIDTH - 200.0 },
            y: GROUND_Y,
            vx: 0.0,
            vy: 0.0,
            hp: INITIAL_HP,
            max_hp: INITIAL_HP,
            facing: if first { Facing::Right } else { Facing::Left },
            is_grounded: true,
            is_ducking: false,
            is_attacking: false,
            attack_cooldown: 0.0,
            is_stunned: false,
            stun_timer: 0.0,
            special_cooldown: 0.0,
            is_special_active: false,
            special_timer: 0.0,
            is_flattened: false,
            flatten_timer: 0.0,
            has_stick: true,
            stick_durability: STICK_FULL_DURABILITY,
            sticks_remaining_in_pile: MAX_STICKS,
        }
    }

    pub fn stats(&self) -> &'static CharacterStats {
        CharacterStats::for_type(self.character)
    }

    /// Can this player act on input this tick
    pub fn is_free(&self) -> bool {
        !self.is_stunned && !self.is_flattened && self.hp > 0.0
    }

    /// Rolling special grants melee immunity
    pub fn is_rolling(&self) -> bool {
        self.character == CharacterType::BarrelBob && self.is_special_active
    }

    /// Hurtbox as (left, top, width, height)
    pub fn hurtbox(&self) -> (f32, f32, f32, f32) {
        let stats = self.stats();
        (
            self.x - stats.width / 2.0,
            self.y - stats.height,
            stats.width,
            stats.height,
        )
    }

    /// Vertical center of the body
    pub fn torso_y(&self) -> f32 {
        self.y - self.stats().height / 2.0
    }

    pub fn stun(&mut self, frames: f32) {
        self.is_stunned = true;
        self.stun_timer = frames;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectileKind {
    Hat,
}

/// Thrown object owned by a player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Projectile {
    pub id: u32,
    pub owner_id: PlayerId,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub width: f32,
    pub height: f32,
    #[serde(rename = "type")]
    pub kind: ProjectileKind,
    pub return_to_owner: bool,
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HazardKind {
    Anvil,
}

/// Environmental object falling into the arena
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hazard {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    #[serde(rename = "type")]
    pub kind: HazardKind,
    pub vy: f32,
    pub width: f32,
    pub height: f32,
    pub active: bool,
}

/// All simulated entities of one match, mutated in place by the engine
#[derive(Debug, Clone, PartialEq)]
pub struct SimState {
    pub players: [PlayerState; 2],
    pub projectiles: Vec<Projectile>,
    pub hazards: Vec<Hazard>,
    next_entity_id: u32,
}

impl SimState {
    pub fn new(p1: CharacterType, p2: CharacterType) -> Self {
        Self {
            players: [PlayerState::new(1, p1), PlayerState::new(2, p2)],
            projectiles: Vec::new(),
            hazards: Vec::new(),
            next_entity_id: 1,
        }
    }

    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_entity_id;
        self.next_entity_id = self.next_entity_id.wrapping_add(1);
        id
    }

    pub fn player(&self, id: PlayerId) -> Option<&PlayerState> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Mutable access to player `index` and its opponent at the same time
    pub fn pair_mut(&mut self, index: usize) -> (&mut PlayerState, &mut PlayerState) {
        let (first, second) = self.players.split_at_mut(1);
        if index == 0 {
            (&mut first[0], &mut second[0])
        } else {
            (&mut second[0], &mut first[0])
        }
    }

    /// Replace every collection with a received snapshot
    pub fn overwrite(
        &mut self,
        players: [PlayerState; 2],
        projectiles: Vec<Projectile>,
        hazards: Vec<Hazard>,
    ) {
        self.players = players;
        self.projectiles = projectiles;
        self.hazards = hazards;
    }
}
