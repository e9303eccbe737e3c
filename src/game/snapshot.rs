//! Snapshot building (host) and application (client)

use tracing::{debug, trace};

use crate::ws::protocol::{encode, NetMessage, ProtocolError};

use super::engine::RoundOutcome;
use super::r#match::MatchController;

/// Builds full-state snapshots for network transmission
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    stats: SnapshotStats,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a GAME_STATE message from the current match.
    /// `outcome` is attached only on the tick the round ended.
    pub fn build(&self, controller: &MatchController, outcome: Option<RoundOutcome>) -> NetMessage {
        let sim = controller.sim();
        NetMessage::GameState {
            players: sim.players.clone(),
            projectiles: sim.projectiles.clone(),
            hazards: sim.hazards.clone(),
            time_left: controller.time_left(),
            wind_force: controller.wind_force(),
            outcome,
        }
    }

    /// Encoded size is tracked for the periodic debug line
    pub fn measure(&mut self, msg: &NetMessage) -> Result<usize, ProtocolError> {
        let bytes = encode(msg)?.len();
        self.stats.record(bytes);
        if self.stats.total_snapshots % 600 == 0 {
            debug!(
                snapshots = self.stats.total_snapshots,
                avg_bytes = self.stats.avg_bytes(),
                "Snapshot stats"
            );
        }
        Ok(bytes)
    }

    pub fn stats(&self) -> &SnapshotStats {
        &self.stats
    }
}

/// Overwrite the local match with a received GAME_STATE.
/// Returns the outcome carried by the snapshot, if any; other messages are ignored.
pub fn apply_snapshot(controller: &mut MatchController, msg: NetMessage) -> Option<RoundOutcome> {
    let NetMessage::GameState {
        players,
        projectiles,
        hazards,
        time_left,
        wind_force,
        outcome,
    } = msg
    else {
        return None;
    };

    trace!(time_left, projectiles = projectiles.len(), hazards = hazards.len(), "Applying snapshot");
    controller.sim_mut().overwrite(players, projectiles, hazards);
    controller.mirror_environment(time_left, wind_force);
    outcome
}

/// Snapshot size stats for debugging
#[derive(Debug, Default)]
pub struct SnapshotStats {
    pub total_snapshots: u64,
    pub total_bytes: u64,
}

impl SnapshotStats {
    pub fn record(&mut self, bytes: usize) {
        self.total_snapshots += 1;
        self.total_bytes += bytes as u64;
    }

    pub fn avg_bytes(&self) -> u64 {
        if self.total_snapshots == 0 {
            0
        } else {
            self.total_bytes / self.total_snapshots
        }
    }
}
