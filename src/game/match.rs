//! Match phase, round timer and environment (wind, hazard spawns)

use rand::Rng;
use tracing::{debug, info};

use super::catalog::CharacterType;
use super::engine::RoundOutcome;
use super::entity::{Hazard, SimState};

/// Round length in seconds
pub const ROUND_DURATION: u32 = 80;

pub const WIND_CHANGE_CHANCE: f32 = 0.1;
pub const WIND_CALM_CHANCE: f32 = 0.05;
pub const MAX_WIND: f32 = 0.2;
pub const ANVIL_SPAWN_CHANCE: f32 = 0.08;

/// Match phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    /// Character selection, nothing simulated
    Menu,
    /// Round in progress
    Playing,
    /// Round over, winner recorded
    GameOver,
}

/// What the once-per-second cadence changed
#[derive(Debug, Default, PartialEq)]
pub struct SecondOutcome {
    pub round_ended: Option<RoundOutcome>,
    pub wind_changed: bool,
    pub hazard_spawned: Option<u32>,
}

/// Owns the round state machine and the simulated entities
#[derive(Debug)]
pub struct MatchController {
    phase: MatchPhase,
    sim: SimState,
    time_left: u32,
    wind_force: f32,
    outcome: Option<RoundOutcome>,
}

impl MatchController {
    pub fn new() -> Self {
        Self {
            phase: MatchPhase::Menu,
            sim: SimState::new(CharacterType::SirWobbles, CharacterType::GumbyLegs),
            time_left: ROUND_DURATION,
            wind_force: 0.0,
            outcome: None,
        }
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn is_playing(&self) -> bool {
        self.phase == MatchPhase::Playing
    }

    pub fn sim(&self) -> &SimState {
        &self.sim
    }

    pub fn sim_mut(&mut self) -> &mut SimState {
        &mut self.sim
    }

    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    pub fn wind_force(&self) -> f32 {
        self.wind_force
    }

    pub fn outcome(&self) -> Option<RoundOutcome> {
        self.outcome
    }

    /// Fresh players, no transient entities, full timer, calm air
    pub fn start_match(&mut self, p1: CharacterType, p2: CharacterType) {
        self.sim = SimState::new(p1, p2);
        self.time_left = ROUND_DURATION;
        self.wind_force = 0.0;
        self.outcome = None;
        self.phase = MatchPhase::Playing;
        info!(p1 = %p1, p2 = %p2, "Match started");
    }

    /// Record the result; only a round in progress can end
    pub fn end_round(&mut self, outcome: RoundOutcome) -> bool {
        if self.phase != MatchPhase::Playing {
            return false;
        }
        self.outcome = Some(outcome);
        self.phase = MatchPhase::GameOver;
        match outcome.winner {
            Some(winner) => info!(winner, "Round over"),
            None => info!("Round over, draw"),
        }
        true
    }

    pub fn return_to_menu(&mut self) {
        if self.phase != MatchPhase::Menu {
            info!(from = ?self.phase, "Returning to menu");
        }
        self.phase = MatchPhase::Menu;
    }

    /// Once-per-second cadence, run only by the authoritative side
    pub fn on_second<R: Rng + ?Sized>(&mut self, rng: &mut R) -> SecondOutcome {
        let mut out = SecondOutcome::default();
        if self.phase != MatchPhase::Playing {
            return out;
        }

        if self.time_left <= 1 {
            self.time_left = 0;
            let outcome = self.expiry_outcome();
            self.end_round(outcome);
            out.round_ended = Some(outcome);
            return out;
        }
        self.time_left -= 1;

        if rng.gen::<f32>() < WIND_CHANGE_CHANCE {
            let dir = if rng.gen::<f32>() > 0.5 { 1.0 } else { -1.0 };
            self.wind_force = dir * (rng.gen::<f32>() * MAX_WIND);
            out.wind_changed = true;
        } else if rng.gen::<f32>() < WIND_CALM_CHANCE {
            self.wind_force = 0.0;
            out.wind_changed = true;
        }

        if rng.gen::<f32>() < ANVIL_SPAWN_CHANCE {
            let id = self.sim.next_entity_id();
            let anvil = Hazard::anvil(id, rng.gen::<f32>());
            debug!(hazard_id = id, x = anvil.x, "Anvil spawned");
            self.sim.hazards.push(anvil);
            out.hazard_spawned = Some(id);
        }

        out
    }

    /// Time ran out: a knockout still pending wins, otherwise a draw
    fn expiry_outcome(&self) -> RoundOutcome {
        let [p1, p2] = &self.sim.players;
        match (p1.hp <= 0.0, p2.hp <= 0.0) {
            (true, false) => RoundOutcome::won_by(p2.id),
            (false, true) => RoundOutcome::won_by(p1.id),
            _ => RoundOutcome::draw(),
        }
    }

    /// Mirror the host's timer and wind (client side)
    pub fn mirror_environment(&mut self, time_left: u32, wind_force: f32) {
        self.time_left = time_left;
        self.wind_force = wind_force;
    }
}

impl Default for MatchController {
    fn default() -> Self {
        Self::new()
    }
}
