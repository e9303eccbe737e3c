//! Boomerang projectiles: decelerating throw, then homing return

use super::entity::{PlayerState, Projectile, ProjectileKind};

pub const HAT_SPEED: f32 = 15.0;
pub const HAT_WIDTH: f32 = 40.0;
pub const HAT_HEIGHT: f32 = 20.0;
/// Height above the owner's feet where the hat is thrown from and caught
pub const HAT_HOLD_HEIGHT: f32 = 40.0;
pub const HAT_DRAG: f32 = 0.95;
pub const RETURN_THRESHOLD: f32 = 1.0;
pub const RETURN_SPEED: f32 = 15.0;
pub const CATCH_DISTANCE: f32 = 30.0;
pub const HAT_DAMAGE: f32 = 5.0;
pub const HAT_STUN: f32 = 60.0;

impl Projectile {
    /// Launch a projectile from `owner` toward its facing
    pub fn launch(kind: ProjectileKind, id: u32, owner: &PlayerState) -> Self {
        match kind {
            ProjectileKind::Hat => Self {
                id,
                owner_id: owner.id,
                x: owner.x,
                y: owner.y - HAT_HOLD_HEIGHT,
                vx: owner.facing.sign() * HAT_SPEED,
                vy: 0.0,
                width: HAT_WIDTH,
                height: HAT_HEIGHT,
                kind,
                return_to_owner: false,
                active: true,
            },
        }
    }

    /// Move one tick; a missing owner retires the projectile
    pub fn update(&mut self, owner: Option<&PlayerState>) {
        if !self.return_to_owner {
            self.x += self.vx;
            self.vx *= HAT_DRAG;
            if self.vx.abs() < RETURN_THRESHOLD {
                self.return_to_owner = true;
            }
            return;
        }

        let Some(owner) = owner else {
            self.active = false;
            return;
        };

        let dx = owner.x - self.x;
        let dy = (owner.y - HAT_HOLD_HEIGHT) - self.y;
        let dist = (dx * dx + dy * dy).sqrt();
        // Catch radius also keeps dist away from zero
        if dist < CATCH_DISTANCE {
            self.active = false;
        } else {
            self.x += dx / dist * RETURN_SPEED;
            self.y += dy / dist * RETURN_SPEED;
        }
    }

    pub fn check_hit(&self, target: &PlayerState) -> bool {
        let stats = target.stats();
        (self.x - target.x).abs() < stats.width
            && (self.y - target.torso_y()).abs() < stats.height / 2.0
    }
}
