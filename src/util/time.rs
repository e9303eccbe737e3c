//! Tick cadence for the frame and match drivers

use std::time::Duration;

/// Default frame ticks per second
pub const SIMULATION_TPS: u32 = 60;

/// Period of the match clock (timer, wind, hazard spawns)
pub const MATCH_CLOCK_PERIOD: Duration = Duration::from_secs(1);

/// Wall-clock length of one frame tick
pub fn tick_interval(tps: u32) -> Duration {
    Duration::from_micros(1_000_000 / u64::from(tps.max(1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rate_is_sixty_hertz() {
        assert_eq!(tick_interval(SIMULATION_TPS), Duration::from_micros(16_666));
    }

    #[test]
    fn zero_rate_is_clamped() {
        assert_eq!(tick_interval(0), Duration::from_secs(1));
    }
}
