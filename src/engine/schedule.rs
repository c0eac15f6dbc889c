use crate::config::GameConfig;
use crate::constants::ms_to_ticks;
use crate::types::Mode;

/// Global patrol/pursuit cadence, counted in ticks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhaseSchedule {
    phases: Vec<(Mode, Option<u32>)>,
    index: usize,
    remaining: Option<u32>,
}

impl PhaseSchedule {
    pub fn from_config(config: &GameConfig) -> Self {
        let phases: Vec<(Mode, Option<u32>)> = config
            .phase_schedule
            .iter()
            .map(|phase| {
                (
                    phase.mode,
                    phase.duration_ms.map(|ms| ms_to_ticks(ms, config.tick_rate)),
                )
            })
            .collect();
        let remaining = phases.first().and_then(|(_, ticks)| *ticks);
        Self {
            phases,
            index: 0,
            remaining,
        }
    }

    pub fn reset(&mut self) {
        self.index = 0;
        self.remaining = self.phases.first().and_then(|(_, ticks)| *ticks);
    }

    pub fn mode(&self) -> Mode {
        self.phases
            .get(self.index)
            .map(|(mode, _)| *mode)
            .unwrap_or(Mode::Pursuit)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Ticks left in the current phase; `None` for the open-ended phase.
    pub fn remaining(&self) -> Option<u32> {
        self.remaining
    }

    /// Counts one tick down. Returns the new mode when a phase boundary is crossed.
    pub fn tick(&mut self) -> Option<Mode> {
        let remaining = self.remaining?;
        let remaining = remaining.saturating_sub(1);
        if remaining > 0 {
            self.remaining = Some(remaining);
            return None;
        }
        if self.index + 1 >= self.phases.len() {
            self.remaining = None;
            return None;
        }
        self.index += 1;
        self.remaining = self.phases[self.index].1;
        Some(self.mode())
    }
}
