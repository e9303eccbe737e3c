//! Game simulation modules

pub mod catalog;
pub mod combat;
pub mod engine;
pub mod entity;
pub mod hazards;
pub mod input;
pub mod r#match;
pub mod particles;
pub mod physics;
pub mod projectiles;
pub mod snapshot;

pub use catalog::{CharacterStats, CharacterType};
pub use engine::{advance_tick, RoundOutcome, TickOutcome};
pub use entity::{Facing, Hazard, PlayerId, PlayerState, Projectile, SimState};
pub use input::{InputSet, TickInputs};
pub use particles::{ParticleSpawn, ParticleSystem};
pub use r#match::{MatchController, MatchPhase, SecondOutcome};
pub use snapshot::{apply_snapshot, SnapshotBuilder};
