use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{
    ms_to_ticks, release_delay_ms, AMBUSHER_LEAD, COMBO_BASE, DEATH_PAUSE_MS, ENERGIZER_SCORE,
    EXTRA_LIFE_SCORE, FLANKER_LEAD, FLEE_DURATION_MS, FLEE_SPEED_FACTOR, MAX_LEAD,
    OPPORTUNIST_RADIUS, PELLET_SCORE, PHASE_SCHEDULE_MS, PLAYER_BASE_SPEED, PURSUER_BASE_SPEED,
    RETREAT_SPEED_FACTOR, STARTING_LIVES, TICK_RATE,
};
use crate::error::ConfigError;
use crate::types::{Mode, Personality};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseSpec {
    pub mode: Mode,
    /// `None` keeps the phase forever.
    pub duration_ms: Option<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReleaseDelays {
    pub direct: u64,
    pub ambusher: u64,
    pub flanker: u64,
    pub opportunist: u64,
}

impl ReleaseDelays {
    pub fn for_personality(&self, personality: Personality) -> u64 {
        match personality {
            Personality::Direct => self.direct,
            Personality::Ambusher => self.ambusher,
            Personality::Flanker => self.flanker,
            Personality::Opportunist => self.opportunist,
        }
    }
}

impl Default for ReleaseDelays {
    fn default() -> Self {
        Self {
            direct: release_delay_ms(Personality::Direct),
            ambusher: release_delay_ms(Personality::Ambusher),
            flanker: release_delay_ms(Personality::Flanker),
            opportunist: release_delay_ms(Personality::Opportunist),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameConfig {
    pub tick_rate: u32,
    pub phase_schedule: Vec<PhaseSpec>,
    pub flee_duration_ms: u64,
    pub death_pause_ms: u64,
    pub release_delay_ms: ReleaseDelays,
    pub player_speed: f64,
    pub pursuer_speed: f64,
    pub flee_speed_factor: f64,
    pub retreat_speed_factor: f64,
    pub pellet_score: u32,
    pub energizer_score: u32,
    pub combo_base: u32,
    pub starting_lives: u32,
    pub extra_life_score: Option<u32>,
    pub opportunist_radius: f64,
    pub ambusher_lead: i32,
    pub flanker_lead: i32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_rate: TICK_RATE,
            phase_schedule: PHASE_SCHEDULE_MS
                .iter()
                .map(|&(mode, duration_ms)| PhaseSpec { mode, duration_ms })
                .collect(),
            flee_duration_ms: FLEE_DURATION_MS,
            death_pause_ms: DEATH_PAUSE_MS,
            release_delay_ms: ReleaseDelays::default(),
            player_speed: PLAYER_BASE_SPEED,
            pursuer_speed: PURSUER_BASE_SPEED,
            flee_speed_factor: FLEE_SPEED_FACTOR,
            retreat_speed_factor: RETREAT_SPEED_FACTOR,
            pellet_score: PELLET_SCORE,
            energizer_score: ENERGIZER_SCORE,
            combo_base: COMBO_BASE,
            starting_lives: STARTING_LIVES,
            extra_life_score: Some(EXTRA_LIFE_SCORE),
            opportunist_radius: OPPORTUNIST_RADIUS,
            ambusher_lead: AMBUSHER_LEAD,
            flanker_lead: FLANKER_LEAD,
        }
    }
}

impl GameConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate == 0 {
            return Err(ConfigError::ZeroTickRate);
        }
        check_speed("playerSpeed", self.player_speed)?;
        check_speed("pursuerSpeed", self.pursuer_speed)?;
        check_speed(
            "pursuerSpeed * fleeSpeedFactor",
            self.pursuer_speed * self.flee_speed_factor,
        )?;
        check_speed(
            "pursuerSpeed * retreatSpeedFactor",
            self.pursuer_speed * self.retreat_speed_factor,
        )?;

        check_lead("ambusherLead", self.ambusher_lead)?;
        check_lead("flankerLead", self.flanker_lead)?;

        let Some(last) = self.phase_schedule.last() else {
            return Err(ConfigError::EmptySchedule);
        };
        for (index, phase) in self.phase_schedule.iter().enumerate() {
            if !phase.mode.is_scheduled() {
                return Err(ConfigError::UnscheduledMode {
                    index,
                    mode: format!("{:?}", phase.mode).to_lowercase(),
                });
            }
            if phase.duration_ms.is_none() && index + 1 < self.phase_schedule.len() {
                return Err(ConfigError::UnboundedPhaseNotLast { index });
            }
        }
        if last.duration_ms.is_some() {
            return Err(ConfigError::FinalPhaseBounded);
        }
        Ok(())
    }

    pub fn flee_ticks(&self) -> u32 {
        ms_to_ticks(self.flee_duration_ms, self.tick_rate)
    }

    pub fn death_pause_ticks(&self) -> u32 {
        ms_to_ticks(self.death_pause_ms, self.tick_rate)
    }

    pub fn release_ticks(&self, personality: Personality) -> u32 {
        ms_to_ticks(
            self.release_delay_ms.for_personality(personality),
            self.tick_rate,
        )
    }
}

fn check_speed(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidSpeed { name, value })
    }
}

fn check_lead(name: &'static str, value: i32) -> Result<(), ConfigError> {
    if (0..=MAX_LEAD).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidLead {
            name,
            value,
            max: MAX_LEAD,
        })
    }
}
