use crate::types::{Mode, Personality};

pub const TICK_RATE: u32 = 60;

/// Arcade patrol/pursuit cadence; `None` marks the open-ended final phase.
pub const PHASE_SCHEDULE_MS: [(Mode, Option<u64>); 8] = [
    (Mode::Patrol, Some(7_000)),
    (Mode::Pursuit, Some(20_000)),
    (Mode::Patrol, Some(7_000)),
    (Mode::Pursuit, Some(20_000)),
    (Mode::Patrol, Some(5_000)),
    (Mode::Pursuit, Some(20_000)),
    (Mode::Patrol, Some(5_000)),
    (Mode::Pursuit, None),
];

pub const FLEE_DURATION_MS: u64 = 6_000;
pub const DEATH_PAUSE_MS: u64 = 2_000;

pub const PLAYER_BASE_SPEED: f64 = 0.16;
pub const PURSUER_BASE_SPEED: f64 = 0.15;
pub const FLEE_SPEED_FACTOR: f64 = 2.0 / 3.0;
pub const RETREAT_SPEED_FACTOR: f64 = 2.0;

pub const PELLET_SCORE: u32 = 10;
pub const ENERGIZER_SCORE: u32 = 50;
pub const COMBO_BASE: u32 = 200;
pub const STARTING_LIVES: u32 = 3;
pub const EXTRA_LIFE_SCORE: u32 = 10_000;

pub const OPPORTUNIST_RADIUS: f64 = 8.0;
pub const AMBUSHER_LEAD: i32 = 4;
pub const FLANKER_LEAD: i32 = 2;
/// Upper bound for configured leads; keeps targeting arithmetic in range.
pub const MAX_LEAD: i32 = 64;

/// Distance from the center treated as "on" the center.
pub const CENTER_EPSILON: f64 = 0.001;
/// Largest displacement applied in one movement sub-step.
pub const MAX_SUBSTEP: f64 = 0.5;
/// Keeps a wrapped coordinate strictly inside the last column.
pub const WRAP_EPSILON: f64 = 1e-9;
pub const HOME_NEIGHBORHOOD: i32 = 1;
pub const MAX_STALLED_TICKS: u32 = 120;
/// Scatter corners sit this many cells outside the grid.
pub const SCATTER_MARGIN: i32 = 2;

pub fn release_delay_ms(personality: Personality) -> u64 {
    match personality {
        Personality::Direct => 0,
        Personality::Ambusher => 1_000,
        Personality::Flanker => 3_000,
        Personality::Opportunist => 5_000,
    }
}

pub fn ms_to_ticks(ms: u64, tick_rate: u32) -> u32 {
    if ms == 0 {
        return 0;
    }
    let ticks = (ms as f64 * tick_rate as f64 / 1000.0).round() as u64;
    ticks.clamp(1, u32::MAX as u64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ms_to_ticks_rounds_and_keeps_nonzero_durations() {
        assert_eq!(ms_to_ticks(7_000, 60), 420);
        assert_eq!(ms_to_ticks(0, 60), 0);
        assert_eq!(ms_to_ticks(1, 60), 1);
        assert_eq!(ms_to_ticks(2_500, 20), 50);
    }

    #[test]
    fn default_schedule_ends_open() {
        let (mode, duration) = PHASE_SCHEDULE_MS[PHASE_SCHEDULE_MS.len() - 1];
        assert_eq!(mode, Mode::Pursuit);
        assert!(duration.is_none());
        assert!(PHASE_SCHEDULE_MS[..PHASE_SCHEDULE_MS.len() - 1]
            .iter()
            .all(|(_, d)| d.is_some()));
    }
}
