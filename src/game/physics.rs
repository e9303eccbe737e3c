//! Arena physics: gravity, friction, world bounds and stick resupply

use super::catalog::CharacterType;
use super::entity::{PlayerId, PlayerState};

// World dimensions (logical pixels)
pub const WORLD_WIDTH: f32 = 1200.0;
pub const WORLD_HEIGHT: f32 = 600.0;
pub const GROUND_Y: f32 = 500.0;

// Motion, all per tick
pub const GRAVITY: f32 = 0.6;
pub const FRICTION: f32 = 0.85;
pub const AIR_FRICTION: f32 = 0.98;
pub const ROLLING_FRICTION: f32 = 0.98;
pub const MOVE_ACCEL: f32 = 1.2;
pub const JUMP_FORCE: f32 = -16.0;
pub const MAX_SPEED: f32 = 12.0;
pub const ROLLING_MAX_SPEED: f32 = 25.0;
pub const WALL_BOUNCE: f32 = -0.5;

// Sticks
pub const MAX_STICKS: u32 = 5;
pub const STICK_FULL_DURABILITY: f32 = 100.0;
pub const PILE_INSET: f32 = 50.0;
pub const PILE_PICKUP_RADIUS: f32 = 60.0;

/// Axis-aligned overlap of two (x, y, w, h) boxes
pub fn rect_intersect(a: (f32, f32, f32, f32), b: (f32, f32, f32, f32)) -> bool {
    let (x1, y1, w1, h1) = a;
    let (x2, y2, w2, h2) = b;
    x2 < x1 + w1 && x2 + w2 > x1 && y2 < y1 + h1 && y2 + h2 > y1
}

/// Horizontal position of a player's stick pile
pub fn pile_x(id: PlayerId) -> f32 {
    if id == 1 {
        PILE_INSET
    } else {
        WORLD_WIDTH - PILE_INSET
    }
}

/// Physics system for per-tick player motion
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Tick down status timers, releasing their flags at zero
    pub fn countdown_status(p: &mut PlayerState, dt: f32) {
        if p.is_stunned {
            p.stun_timer = (p.stun_timer - dt).max(0.0);
            if p.stun_timer <= 0.0 {
                p.is_stunned = false;
            }
        }
        if p.is_flattened {
            p.flatten_timer = (p.flatten_timer - dt).max(0.0);
            if p.flatten_timer <= 0.0 {
                p.is_flattened = false;
            }
        }
        if p.special_cooldown > 0.0 {
            p.special_cooldown = (p.special_cooldown - dt).max(0.0);
        }
        if p.is_special_active {
            p.special_timer = (p.special_timer - dt).max(0.0);
            if p.special_timer <= 0.0 {
                p.is_special_active = false;
            }
        }
    }

    /// Gravity, friction, speed cap and integration
    pub fn integrate(p: &mut PlayerState) {
        let rolling = p.is_rolling();

        p.vy += GRAVITY;
        p.vx *= if p.is_grounded {
            if p.character == CharacterType::BarrelBob {
                ROLLING_FRICTION
            } else {
                FRICTION
            }
        } else {
            AIR_FRICTION
        };

        let max_speed = if rolling { ROLLING_MAX_SPEED } else { MAX_SPEED };
        p.vx = p.vx.clamp(-max_speed, max_speed);

        p.x += p.vx;
        p.y += p.vy;
    }

    /// Ground line and arena walls
    pub fn collide_world(p: &mut PlayerState) {
        let half_width = p.stats().width / 2.0;

        if p.y >= GROUND_Y {
            p.y = GROUND_Y;
            p.vy = 0.0;
            p.is_grounded = true;
        }
        if p.x < half_width {
            p.x = half_width;
            p.vx *= WALL_BOUNCE;
        }
        if p.x > WORLD_WIDTH - half_width {
            p.x = WORLD_WIDTH - half_width;
            p.vx *= WALL_BOUNCE;
        }
    }

    /// Pick up a fresh stick near the own pile; returns true on pickup
    pub fn try_resupply(p: &mut PlayerState) -> bool {
        if p.has_stick || p.sticks_remaining_in_pile == 0 || !p.is_grounded {
            return false;
        }
        if (p.x - pile_x(p.id)).abs() >= PILE_PICKUP_RADIUS {
            return false;
        }
        p.has_stick = true;
        p.stick_durability = STICK_FULL_DURABILITY;
        p.sticks_remaining_in_pile -= 1;
        true
    }
}
