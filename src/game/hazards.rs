//! Falling anvils

use super::entity::{Hazard, HazardKind, PlayerState};
use super::physics::{GRAVITY, GROUND_Y, WORLD_WIDTH};

pub const ANVIL_DAMAGE: f32 = 30.0;
pub const ANVIL_WIDTH: f32 = 60.0;
pub const ANVIL_HEIGHT: f32 = 50.0;
pub const ANVIL_SPAWN_Y: f32 = -100.0;
/// Spawn x is kept this far from either wall
pub const ANVIL_SPAWN_MARGIN: f32 = 50.0;
pub const FLATTEN_FRAMES: f32 = 120.0;
pub const FLATTEN_STUN: f32 = 60.0;
pub const COLOR_DEBRIS: &str = "#333";

impl Hazard {
    /// Anvil above the arena; `t` in [0, 1) picks the column
    pub fn anvil(id: u32, t: f32) -> Self {
        Self {
            id,
            x: t * (WORLD_WIDTH - 2.0 * ANVIL_SPAWN_MARGIN) + ANVIL_SPAWN_MARGIN,
            y: ANVIL_SPAWN_Y,
            kind: HazardKind::Anvil,
            vy: 0.0,
            width: ANVIL_WIDTH,
            height: ANVIL_HEIGHT,
            active: true,
        }
    }

    pub fn fall(&mut self) {
        self.vy += GRAVITY;
        self.y += self.vy;
    }

    pub fn hits(&self, target: &PlayerState) -> bool {
        let stats = target.stats();
        (self.x - target.x).abs() < (self.width + stats.width) / 2.0
            && (self.y - target.torso_y()).abs() < stats.height / 2.0
    }

    pub fn has_landed(&self) -> bool {
        self.y > GROUND_Y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::catalog::CharacterType;

    #[test]
    fn spawn_column_stays_inside_margins() {
        assert_eq!(Hazard::anvil(1, 0.0).x, ANVIL_SPAWN_MARGIN);
        assert!(Hazard::anvil(1, 0.999).x < WORLD_WIDTH - ANVIL_SPAWN_MARGIN);
    }

    #[test]
    fn falls_under_gravity() {
        let mut anvil = Hazard::anvil(1, 0.5);
        anvil.fall();
        anvil.fall();
        assert!((anvil.vy - 2.0 * GRAVITY).abs() < 1e-5);
        assert!((anvil.y - (ANVIL_SPAWN_Y + 3.0 * GRAVITY)).abs() < 1e-4);
    }

    #[test]
    fn overlaps_player_torso() {
        let p = PlayerState::new(1, CharacterType::SirWobbles);
        let mut anvil = Hazard::anvil(1, 0.0);
        anvil.x = p.x + 50.0;
        anvil.y = p.torso_y();
        assert!(anvil.hits(&p));
        anvil.x = p.x + 61.0;
        assert!(!anvil.hits(&p));
    }
}
