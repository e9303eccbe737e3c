//! Combat system - stick melee, special abilities, damage

use rand::Rng;
use tracing::debug;

use super::catalog::CharacterType;
use super::entity::{Facing, PlayerState, ProjectileKind};
use super::particles::ParticleSpawn;
use super::physics::rect_intersect;

// Melee
pub const STICK_REACH: f32 = 90.0;
pub const STICK_THICKNESS: f32 = 20.0;
pub const STICK_DAMAGE_BASE: f32 = 10.0;
pub const MOMENTUM_MULTIPLIER: f32 = 1.5;
pub const KNOCKBACK_BASE: f32 = 10.0;
pub const KNOCKBACK_LIFT: f32 = 5.0;
pub const HIT_STUN_BASE: f32 = 10.0;
pub const ATTACK_COOLDOWN_FRAMES: f32 = 20.0;
/// Attack flag stays up until the cooldown drops below this
pub const ATTACK_ACTIVE_WINDOW: f32 = 10.0;
pub const STICK_DURABILITY_LOSS_PER_HIT: f32 = 25.0;
pub const STICK_BREAK_MIN_DAMAGE: f32 = 25.0;
pub const STICK_BREAK_ROLL: f32 = 0.7;
pub const IMMUNE_BOUNCE_SPEED: f32 = 10.0;
pub const IMMUNE_BOUNCE_STUN: f32 = 15.0;

// Specials
pub const SPECIAL_COOLDOWN_FRAMES: f32 = 300.0;
pub const QUAKE_LAUNCH: f32 = -12.0;
pub const QUAKE_STUN: f32 = 60.0;
pub const ROLL_SPEED: f32 = 20.0;
pub const GLIDE_LAUNCH: f32 = -10.0;
pub const GLIDE_MAX_FALL: f32 = 1.0;
pub const GLIDE_BOOST: f32 = 1.05;
pub const SPIN_RANGE: f32 = 80.0;
pub const SPIN_KNOCKBACK: f32 = 15.0;
pub const SPIN_LIFT: f32 = -5.0;
pub const SPIN_DAMAGE: f32 = 0.5;

pub const COLOR_HIT: &str = "#ef4444";
pub const COLOR_SPLINTER: &str = "#78350f";

/// Outcome of one melee swing
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SwingResult {
    Miss,
    Hit { damage: f32 },
    Deflected,
}

/// Combat system for melee and ability resolution
pub struct CombatSystem;

impl CombatSystem {
    /// Apply damage to a player, never storing hp below zero
    pub fn apply_damage(target: &mut PlayerState, damage: f32) {
        target.hp = (target.hp - damage).max(0.0);
    }

    /// Special duration in ticks per archetype
    pub fn special_duration(character: CharacterType) -> f32 {
        match character {
            CharacterType::SirWobbles => 20.0,
            CharacterType::GumbyLegs => 60.0,
            CharacterType::BarrelBob => 60.0,
            CharacterType::FlatStanley => 120.0,
            CharacterType::TinyTim => 30.0,
        }
    }

    /// Start the special if it is off cooldown; returns a projectile to launch
    pub fn activate_special(
        p: &mut PlayerState,
        opponent: &mut PlayerState,
        spawns: &mut Vec<ParticleSpawn>,
    ) -> Option<ProjectileKind> {
        if p.special_cooldown > 0.0 || p.is_special_active {
            return None;
        }

        p.is_special_active = true;
        p.special_cooldown = SPECIAL_COOLDOWN_FRAMES;
        p.special_timer = Self::special_duration(p.character);
        debug!(player = p.id, character = %p.character, "Special activated");

        match p.character {
            CharacterType::SirWobbles => {
                if p.is_grounded && opponent.is_grounded {
                    opponent.vy = QUAKE_LAUNCH;
                    opponent.stun(QUAKE_STUN);
                    spawns.push(ParticleSpawn::new(
                        opponent.x,
                        opponent.y,
                        p.stats().color,
                        10,
                    ));
                }
                None
            }
            CharacterType::GumbyLegs => None,
            CharacterType::BarrelBob => {
                p.vx = p.facing.sign() * ROLL_SPEED;
                None
            }
            CharacterType::FlatStanley => {
                p.vy = GLIDE_LAUNCH;
                None
            }
            CharacterType::TinyTim => Some(ProjectileKind::Hat),
        }
    }

    /// Effects applied every tick while a special is active
    pub fn continuous_special(p: &mut PlayerState, opponent: &mut PlayerState) {
        if !p.is_special_active {
            return;
        }
        match p.character {
            CharacterType::GumbyLegs => {
                if (p.x - opponent.x).abs() < SPIN_RANGE && (p.y - opponent.y).abs() < SPIN_RANGE {
                    opponent.vx = if p.x < opponent.x {
                        SPIN_KNOCKBACK
                    } else {
                        -SPIN_KNOCKBACK
                    };
                    opponent.vy = SPIN_LIFT;
                    Self::apply_damage(opponent, SPIN_DAMAGE);
                }
            }
            CharacterType::FlatStanley => {
                p.vy = p.vy.min(GLIDE_MAX_FALL);
                p.vx *= GLIDE_BOOST;
            }
            CharacterType::SirWobbles | CharacterType::BarrelBob | CharacterType::TinyTim => {}
        }
    }

    /// Stick hitbox in front of the attacker at torso height
    pub fn stick_hitbox(p: &PlayerState) -> (f32, f32, f32, f32) {
        let stats = p.stats();
        let x = match p.facing {
            Facing::Right => p.x + stats.width / 2.0,
            Facing::Left => p.x - stats.width / 2.0 - STICK_REACH,
        };
        (x, p.y - stats.height / 2.0, STICK_REACH, STICK_THICKNESS)
    }

    /// Swing the stick if allowed; resolves hit, knockback and breakage
    pub fn try_melee<R: Rng + ?Sized>(
        p: &mut PlayerState,
        opponent: &mut PlayerState,
        rng: &mut R,
        spawns: &mut Vec<ParticleSpawn>,
    ) -> SwingResult {
        if p.attack_cooldown > 0.0 || !p.has_stick || p.is_special_active {
            return SwingResult::Miss;
        }

        p.is_attacking = true;
        p.attack_cooldown = ATTACK_COOLDOWN_FRAMES;

        if !rect_intersect(Self::stick_hitbox(p), opponent.hurtbox()) {
            return SwingResult::Miss;
        }

        let dir = p.facing.sign();

        if opponent.is_rolling() {
            p.vx = -dir * IMMUNE_BOUNCE_SPEED;
            p.stun(IMMUNE_BOUNCE_STUN);
            return SwingResult::Deflected;
        }

        let velocity_bonus = p.vx.abs() * MOMENTUM_MULTIPLIER;
        let damage = STICK_DAMAGE_BASE + velocity_bonus;

        Self::apply_damage(opponent, damage);
        opponent.vx += dir * (KNOCKBACK_BASE + velocity_bonus) / opponent.stats().mass;
        opponent.vy -= KNOCKBACK_LIFT;
        opponent.stun(HIT_STUN_BASE + damage / 2.0);

        p.stick_durability = (p.stick_durability - STICK_DURABILITY_LOSS_PER_HIT).max(0.0);
        if p.stick_durability <= 0.0 {
            p.has_stick = false;
            spawns.push(ParticleSpawn::new(p.x, p.y - 40.0, COLOR_SPLINTER, 8));
        }

        if damage > STICK_BREAK_MIN_DAMAGE
            && opponent.has_stick
            && rng.gen::<f32>() > STICK_BREAK_ROLL
        {
            opponent.has_stick = false;
            spawns.push(ParticleSpawn::new(opponent.x, opponent.y - 50.0, COLOR_SPLINTER, 3));
        }

        spawns.push(ParticleSpawn::new(opponent.x, opponent.torso_y(), COLOR_HIT, 5));

        debug!(attacker = p.id, target = opponent.id, damage, "Stick hit");
        SwingResult::Hit { damage }
    }

    /// Release the cooldown and drop the attack flag after the active window
    pub fn tick_attack_cooldown(p: &mut PlayerState) {
        if p.attack_cooldown > 0.0 {
            p.attack_cooldown = (p.attack_cooldown - 1.0).max(0.0);
            if p.attack_cooldown < ATTACK_ACTIVE_WINDOW {
                p.is_attacking = false;
            }
        }
    }
}
