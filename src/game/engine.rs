//! Authoritative per-tick simulation
//!
//! Sub-step order per player (P1 then P2, P2 sees P1's results):
//!  1. Status timers
//!  2. Special, movement, wind, duck, melee (only when free to act)
//!  3. Continuous special effects
//!  4. Gravity, friction, speed cap, integration
//!  5. Attack cooldown
//!  6. Ground and wall collision
//!  7. Stick resupply
//!  8. Defeat check
//!
//! Then projectiles, hazards, removal of inactive entities and a final
//! defeat sweep for damage dealt after a player's own sub-steps.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::catalog::CharacterType;
use super::combat::CombatSystem;
use super::entity::{Facing, PlayerId, PlayerState, Projectile, SimState};
use super::hazards::{ANVIL_DAMAGE, COLOR_DEBRIS, FLATTEN_FRAMES, FLATTEN_STUN};
use super::input::{Intent, TickInputs};
use super::particles::ParticleSpawn;
use super::physics::{PhysicsSystem, GROUND_Y, JUMP_FORCE, MOVE_ACCEL};
use super::projectiles::{HAT_DAMAGE, HAT_STUN};

/// Paper-thin characters catch three times the wind
pub const PAPER_WIND_FACTOR: f32 = 3.0;
pub const COLOR_HAT_HIT: &str = "#c084fc";

/// How a round finished; `winner: None` is a draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundOutcome {
    pub winner: Option<PlayerId>,
}

impl RoundOutcome {
    pub fn won_by(id: PlayerId) -> Self {
        Self { winner: Some(id) }
    }

    pub fn draw() -> Self {
        Self { winner: None }
    }
}

/// Side effects of one tick
#[derive(Debug, Default)]
pub struct TickOutcome {
    pub particle_spawns: Vec<ParticleSpawn>,
    pub round_ended: Option<RoundOutcome>,
}

/// Advance the match by one fixed tick
pub fn advance_tick<R: Rng + ?Sized>(
    state: &mut SimState,
    inputs: &TickInputs<'_>,
    wind_force: f32,
    rng: &mut R,
) -> TickOutcome {
    let mut outcome = TickOutcome::default();

    for index in 0..state.players.len() {
        step_player(state, index, inputs.intent(index), wind_force, rng, &mut outcome);
    }

    update_projectiles(state, &mut outcome.particle_spawns);
    update_hazards(state, &mut outcome.particle_spawns);

    state.projectiles.retain(|p| p.active);
    state.hazards.retain(|h| h.active);

    for index in 0..state.players.len() {
        check_defeat(state, index, &mut outcome);
    }

    outcome
}

fn step_player<R: Rng + ?Sized>(
    state: &mut SimState,
    index: usize,
    intent: Intent,
    wind_force: f32,
    rng: &mut R,
    outcome: &mut TickOutcome,
) {
    let spawns = &mut outcome.particle_spawns;

    let launched = {
        let (p, opponent) = state.pair_mut(index);
        let mut launched = None;

        PhysicsSystem::countdown_status(p, 1.0);

        if p.is_free() {
            if intent.special {
                if let Some(kind) = CombatSystem::activate_special(p, opponent, spawns) {
                    launched = Some(Projectile::launch(kind, 0, p));
                }
            }

            if !p.is_rolling() {
                apply_movement(p, &intent);
            }

            let wind_factor = if p.character == CharacterType::FlatStanley {
                PAPER_WIND_FACTOR
            } else {
                1.0
            };
            p.vx += wind_force * wind_factor;
            p.is_ducking = intent.duck;

            if intent.attack {
                CombatSystem::try_melee(p, opponent, rng, spawns);
            }
        }

        CombatSystem::continuous_special(p, opponent);
        PhysicsSystem::integrate(p);
        CombatSystem::tick_attack_cooldown(p);
        PhysicsSystem::collide_world(p);
        PhysicsSystem::try_resupply(p);

        launched
    };

    if let Some(mut projectile) = launched {
        projectile.id = state.next_entity_id();
        state.projectiles.push(projectile);
    }

    check_defeat(state, index, outcome);
}

fn apply_movement(p: &mut PlayerState, intent: &Intent) {
    let stats = p.stats();
    if intent.left {
        p.vx -= MOVE_ACCEL * stats.speed_mod;
        p.facing = Facing::Left;
    }
    if intent.right {
        p.vx += MOVE_ACCEL * stats.speed_mod;
        p.facing = Facing::Right;
    }
    if intent.jump && p.is_grounded {
        p.vy = JUMP_FORCE * stats.jump_mod;
        p.is_grounded = false;
    }
}

/// First knockout of the tick decides the round
fn check_defeat(state: &SimState, index: usize, outcome: &mut TickOutcome) {
    if outcome.round_ended.is_some() {
        return;
    }
    let p = &state.players[index];
    if p.hp <= 0.0 {
        let winner = state.players[1 - index].id;
        outcome.round_ended = Some(RoundOutcome::won_by(winner));
    }
}

fn update_projectiles(state: &mut SimState, spawns: &mut Vec<ParticleSpawn>) {
    let players = &mut state.players;

    for projectile in state.projectiles.iter_mut() {
        let owner = players.iter().find(|p| p.id == projectile.owner_id);
        projectile.update(owner);

        if !projectile.active {
            continue;
        }

        let Some(target) = players.iter_mut().find(|p| p.id != projectile.owner_id) else {
            continue;
        };
        if projectile.check_hit(target) {
            target.stun(HAT_STUN);
            CombatSystem::apply_damage(target, HAT_DAMAGE);
            spawns.push(ParticleSpawn::new(target.x, target.y - 50.0, COLOR_HAT_HIT, 5));
            projectile.return_to_owner = true;
        }
    }
}

fn update_hazards(state: &mut SimState, spawns: &mut Vec<ParticleSpawn>) {
    let players = &mut state.players;

    for hazard in state.hazards.iter_mut() {
        hazard.fall();

        for p in players.iter_mut() {
            if hazard.hits(p) {
                CombatSystem::apply_damage(p, ANVIL_DAMAGE);
                p.is_flattened = true;
                p.flatten_timer = FLATTEN_FRAMES;
                p.stun(FLATTEN_STUN);
                hazard.active = false;
                spawns.push(ParticleSpawn::new(p.x, p.y, COLOR_DEBRIS, 10));
            }
        }

        if hazard.active && hazard.has_landed() {
            hazard.active = false;
            spawns.push(ParticleSpawn::new(hazard.x, GROUND_Y, COLOR_DEBRIS, 5));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::combat::{IMMUNE_BOUNCE_STUN, STICK_DAMAGE_BASE};
    use crate::game::entity::{Hazard, ProjectileKind};
    use crate::game::input::InputSet;
    use crate::game::physics::{pile_x, MAX_STICKS};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    fn close_quarters(p1: CharacterType, p2: CharacterType) -> SimState {
        let mut state = SimState::new(p1, p2);
        state.players[0].x = 500.0;
        state.players[1].x = 560.0;
        state
    }

    fn held(codes: &[&str]) -> InputSet {
        codes.iter().copied().collect()
    }

    #[test]
    fn standing_swing_deals_base_damage() {
        let mut state = close_quarters(CharacterType::SirWobbles, CharacterType::GumbyLegs);
        let keys = held(&["Space"]);
        let out = advance_tick(&mut state, &TickInputs::shared(&keys), 0.0, &mut rng());

        let p2 = &state.players[1];
        assert_eq!(p2.hp, 100.0 - STICK_DAMAGE_BASE);
        assert!(p2.is_stunned);
        // stun of 10 + damage/2 already ticked once in P2's own sub-step
        assert_eq!(p2.stun_timer, 10.0 + STICK_DAMAGE_BASE / 2.0 - 1.0);
        assert_eq!(state.players[0].stick_durability, 75.0);
        assert!(out.round_ended.is_none());
        assert!(!out.particle_spawns.is_empty());
    }

    #[test]
    fn stunned_player_inputs_change_nothing() {
        let mut idle = close_quarters(CharacterType::TinyTim, CharacterType::GumbyLegs);
        idle.players[0].stun(30.0);
        let mut mashing = idle.clone();

        let none = InputSet::new();
        let all = held(&["KeyA", "KeyD", "KeyW", "KeyS", "Space", "KeyF"]);
        advance_tick(&mut idle, &TickInputs::split(&none, &none), 0.0, &mut rng());
        advance_tick(&mut mashing, &TickInputs::split(&all, &none), 0.0, &mut rng());

        assert_eq!(idle, mashing);
        assert_eq!(mashing.players[0].stun_timer, 29.0);
        assert!(mashing.projectiles.is_empty());
    }

    #[test]
    fn flattened_player_cannot_jump() {
        let mut state = SimState::new(CharacterType::SirWobbles, CharacterType::GumbyLegs);
        state.players[0].is_flattened = true;
        state.players[0].flatten_timer = 10.0;
        let keys = held(&["KeyW"]);
        advance_tick(&mut state, &TickInputs::shared(&keys), 0.0, &mut rng());
        assert!(state.players[0].is_grounded);
        assert_eq!(state.players[0].y, GROUND_Y);
    }

    #[test]
    fn rolling_opponent_takes_no_damage() {
        let mut state = close_quarters(CharacterType::SirWobbles, CharacterType::BarrelBob);
        state.players[1].is_special_active = true;
        state.players[1].special_timer = 30.0;
        let keys = held(&["Space"]);
        advance_tick(&mut state, &TickInputs::split(&keys, &InputSet::new()), 0.0, &mut rng());

        assert_eq!(state.players[1].hp, 100.0);
        assert!(state.players[0].is_stunned);
        assert_eq!(state.players[0].stun_timer, IMMUNE_BOUNCE_STUN);
        assert!(state.players[0].vx < 0.0);
    }

    #[test]
    fn rolling_locks_direction() {
        let mut state = SimState::new(CharacterType::BarrelBob, CharacterType::GumbyLegs);
        let keys = held(&["KeyF", "KeyA"]);
        advance_tick(&mut state, &TickInputs::split(&keys, &InputSet::new()), 0.0, &mut rng());
        let p1 = &state.players[0];
        assert!(p1.is_special_active);
        assert_eq!(p1.facing, Facing::Right);
        assert!((p1.vx - 19.6).abs() < 1e-4);
    }

    #[test]
    fn paper_thin_catches_triple_wind() {
        let mut state = SimState::new(CharacterType::FlatStanley, CharacterType::SirWobbles);
        let none = InputSet::new();
        advance_tick(&mut state, &TickInputs::shared(&none), 0.2, &mut rng());
        assert!((state.players[0].vx - 0.6 * 0.85).abs() < 1e-5);
        assert!((state.players[1].vx - 0.2 * 0.85).abs() < 1e-5);
    }

    #[test]
    fn knockout_ends_round_on_the_same_tick() {
        let mut state = close_quarters(CharacterType::SirWobbles, CharacterType::GumbyLegs);
        state.players[1].hp = 5.0;
        let keys = held(&["Space"]);
        let out = advance_tick(&mut state, &TickInputs::shared(&keys), 0.0, &mut rng());
        assert_eq!(out.round_ended, Some(RoundOutcome::won_by(1)));
        assert_eq!(state.players[1].hp, 0.0);
    }

    #[test]
    fn late_knockout_on_first_player_is_caught_by_sweep() {
        let mut state = close_quarters(CharacterType::SirWobbles, CharacterType::GumbyLegs);
        state.players[0].hp = 5.0;
        let keys = held(&["Enter"]);
        let out = advance_tick(&mut state, &TickInputs::shared(&keys), 0.0, &mut rng());
        assert_eq!(out.round_ended, Some(RoundOutcome::won_by(2)));
    }

    #[test]
    fn resupply_at_own_pile() {
        let mut state = SimState::new(CharacterType::SirWobbles, CharacterType::GumbyLegs);
        state.players[0].has_stick = false;
        state.players[0].stick_durability = 0.0;
        state.players[0].x = pile_x(1) + 10.0;
        state.players[1].has_stick = false;
        state.players[1].stick_durability = 0.0;

        let none = InputSet::new();
        advance_tick(&mut state, &TickInputs::shared(&none), 0.0, &mut rng());

        assert!(state.players[0].has_stick);
        assert_eq!(state.players[0].stick_durability, 100.0);
        assert_eq!(state.players[0].sticks_remaining_in_pile, MAX_STICKS - 1);
        assert!(!state.players[1].has_stick);
        assert_eq!(state.players[1].sticks_remaining_in_pile, MAX_STICKS);
    }

    #[test]
    fn hat_is_thrown_and_eventually_removed() {
        let mut state = SimState::new(CharacterType::TinyTim, CharacterType::SirWobbles);
        let throw = held(&["KeyF"]);
        let none = InputSet::new();
        advance_tick(&mut state, &TickInputs::shared(&throw), 0.0, &mut rng());
        assert_eq!(state.projectiles.len(), 1);
        let hat = &state.projectiles[0];
        assert_eq!(hat.kind, ProjectileKind::Hat);
        assert_eq!(hat.owner_id, 1);
        assert_eq!(hat.x, 200.0 + 15.0);

        for _ in 0..200 {
            advance_tick(&mut state, &TickInputs::shared(&none), 0.0, &mut rng());
        }
        assert!(state.projectiles.is_empty());
    }

    #[test]
    fn hat_stuns_and_turns_back() {
        let mut state = close_quarters(CharacterType::TinyTim, CharacterType::SirWobbles);
        state.players[1].x = 530.0;
        let throw = held(&["KeyF"]);
        advance_tick(&mut state, &TickInputs::split(&throw, &InputSet::new()), 0.0, &mut rng());
        let p2 = &state.players[1];
        assert!(p2.is_stunned);
        assert_eq!(p2.hp, 95.0);
        assert!(state.projectiles[0].return_to_owner);
    }

    #[test]
    fn anvil_flattens_player() {
        let mut state = SimState::new(CharacterType::SirWobbles, CharacterType::GumbyLegs);
        let mut anvil = Hazard::anvil(state.next_entity_id(), 0.0);
        anvil.x = state.players[0].x;
        anvil.y = state.players[0].torso_y() - 1.0;
        state.hazards.push(anvil);

        let none = InputSet::new();
        let out = advance_tick(&mut state, &TickInputs::shared(&none), 0.0, &mut rng());
        let p1 = &state.players[0];
        assert_eq!(p1.hp, 100.0 - ANVIL_DAMAGE);
        assert!(p1.is_flattened && p1.is_stunned);
        assert_eq!(p1.flatten_timer, FLATTEN_FRAMES);
        assert!(state.hazards.is_empty());
        assert!(out.particle_spawns.iter().any(|s| s.count == 10));
    }

    #[test]
    fn anvil_missing_everyone_shatters_on_ground() {
        let mut state = SimState::new(CharacterType::SirWobbles, CharacterType::GumbyLegs);
        let mut anvil = Hazard::anvil(state.next_entity_id(), 0.5);
        anvil.y = GROUND_Y - 0.1;
        anvil.vy = 5.0;
        state.hazards.push(anvil);

        let none = InputSet::new();
        let out = advance_tick(&mut state, &TickInputs::shared(&none), 0.0, &mut rng());
        assert!(state.hazards.is_empty());
        assert_eq!(out.particle_spawns.len(), 1);
        assert_eq!(out.particle_spawns[0].y, GROUND_Y);
        assert_eq!(state.players[0].hp, 100.0);
    }

    #[test]
    fn hp_never_increases_or_goes_negative() {
        let mut state = close_quarters(CharacterType::GumbyLegs, CharacterType::TinyTim);
        let mut rng = rng();
        let frames = [
            held(&["Space", "Enter"]),
            held(&["KeyF", "ShiftRight", "KeyD"]),
            held(&["ArrowLeft", "Space"]),
            InputSet::new(),
        ];
        let mut last = [100.0, 100.0];
        for tick in 0..600 {
            let keys = &frames[tick % frames.len()];
            let out = advance_tick(&mut state, &TickInputs::shared(keys), 0.1, &mut rng);
            for (i, p) in state.players.iter().enumerate() {
                assert!(p.hp <= last[i]);
                assert!(p.hp >= 0.0);
                last[i] = p.hp;
            }
            if out.round_ended.is_some() {
                break;
            }
        }
    }
}
