use thiserror::Error;

use crate::types::Personality;

#[derive(Debug, Error)]
pub enum MazeError {
    #[error("layout has no rows")]
    Empty,
    #[error("row {row} has {found} columns, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("unknown symbol {symbol:?} at ({row}, {col})")]
    UnknownSymbol { row: usize, col: usize, symbol: char },
    #[error("layout has no player start")]
    MissingPlayerStart,
    #[error("second player start at ({row}, {col})")]
    DuplicatePlayerStart { row: usize, col: usize },
    #[error("second {personality:?} pursuer start at ({row}, {col})")]
    DuplicatePursuer {
        personality: Personality,
        row: usize,
        col: usize,
    },
    #[error("open cell on the top or bottom edge at ({row}, {col})")]
    OpenBorder { row: usize, col: usize },
    #[error("cell ({row}, {col}) is not reachable from the player start")]
    Unreachable { row: usize, col: usize },
    #[error("wall mask has {found} cells, grid needs {expected}")]
    WallMask { expected: usize, found: usize },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("tick rate must be positive")]
    ZeroTickRate,
    #[error("{name} resolves to {value} cells/tick, expected a value in (0, 1]")]
    InvalidSpeed { name: &'static str, value: f64 },
    #[error("{name} is {value}, expected a lead in 0..={max}")]
    InvalidLead {
        name: &'static str,
        value: i32,
        max: i32,
    },
    #[error("phase schedule is empty")]
    EmptySchedule,
    #[error("phase {index} is open-ended but not last")]
    UnboundedPhaseNotLast { index: usize },
    #[error("final phase must be open-ended")]
    FinalPhaseBounded,
    #[error("phase {index} uses {mode}, only patrol and pursuit are scheduled")]
    UnscheduledMode { index: usize, mode: String },
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Maze(#[from] MazeError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
