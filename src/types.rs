use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Tie-break order for every direction decision.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }

    /// `(row, col)` unit step.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (-1, 0),
            Self::Down => (1, 0),
            Self::Left => (0, -1),
            Self::Right => (0, 1),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub row: i32,
    pub col: i32,
}

impl Cell {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Unwrapped neighbor; may lie outside the grid.
    pub fn step(self, dir: Direction, distance: i32) -> Self {
        let (dr, dc) = dir.delta();
        Self {
            row: self.row + dr * distance,
            col: self.col + dc * distance,
        }
    }

    pub fn distance_sq(self, other: Cell) -> i64 {
        let dr = (self.row - other.row) as i64;
        let dc = (self.col - other.col) as i64;
        dr * dr + dc * dc
    }

    pub fn chebyshev(self, other: Cell) -> i32 {
        (self.row - other.row).abs().max((self.col - other.col).abs())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    Empty,
    Wall,
    Pellet,
    Energizer,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Dormant,
    Patrol,
    Pursuit,
    Flee,
    Retreating,
}

impl Mode {
    /// Modes that follow the global patrol/pursuit schedule.
    pub fn is_scheduled(self) -> bool {
        matches!(self, Self::Patrol | Self::Pursuit)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Personality {
    Direct,
    Ambusher,
    Flanker,
    Opportunist,
}

impl Personality {
    pub const ALL: [Personality; 4] = [
        Personality::Direct,
        Personality::Ambusher,
        Personality::Flanker,
        Personality::Opportunist,
    ];

    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '1' => Some(Self::Direct),
            '2' => Some(Self::Ambusher),
            '3' => Some(Self::Flanker),
            '4' => Some(Self::Opportunist),
            _ => None,
        }
    }
}

/// Read-only bundle handed to targeting every tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Descriptor {
    pub player_cell: Cell,
    pub player_direction: Direction,
    pub primary_cell: Option<Cell>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOverReason {
    LevelCleared,
    OutOfLives,
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerView {
    pub row: i32,
    pub col: i32,
    #[serde(rename = "rowExact")]
    pub row_exact: f64,
    #[serde(rename = "colExact")]
    pub col_exact: f64,
    pub dir: Direction,
    pub speed: f64,
    pub turning: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct PursuerView {
    pub id: usize,
    pub personality: Personality,
    pub row: i32,
    pub col: i32,
    #[serde(rename = "rowExact")]
    pub row_exact: f64,
    #[serde(rename = "colExact")]
    pub col_exact: f64,
    pub dir: Direction,
    #[serde(rename = "nextDir")]
    pub next_dir: Option<Direction>,
    pub mode: Mode,
    pub speed: f64,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    PursuerCreated {
        id: usize,
        personality: Personality,
        home: Cell,
        scatter: Cell,
    },
    ModeChanged {
        id: usize,
        from: Mode,
        to: Mode,
    },
    DirectionCommitted {
        id: usize,
        cell: Cell,
        from: Direction,
        to: Direction,
    },
    PursuerStalled {
        id: usize,
        cell: Cell,
        ticks: u32,
    },
    PhaseAdvanced {
        index: usize,
        mode: Mode,
    },
    FleeStarted {
        #[serde(rename = "durationTicks")]
        duration_ticks: u32,
    },
    FleeEnded,
    PelletEaten {
        cell: Cell,
    },
    EnergizerEaten {
        cell: Cell,
    },
    PursuerCaptured {
        id: usize,
        bonus: u32,
    },
    PlayerCaught {
        id: usize,
        #[serde(rename = "livesLeft")]
        lives_left: u32,
    },
    ExtraLife {
        lives: u32,
    },
    RoundReset,
    LevelCleared,
    GameOver {
        reason: GameOverReason,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    #[serde(rename = "globalMode")]
    pub global_mode: Mode,
    #[serde(rename = "fleeTicksLeft")]
    pub flee_ticks_left: u32,
    pub score: u32,
    pub lives: u32,
    #[serde(rename = "pelletsTotal")]
    pub pellets_total: usize,
    #[serde(rename = "pelletsConsumed")]
    pub pellets_consumed: usize,
    #[serde(rename = "levelComplete")]
    pub level_complete: bool,
    pub paused: bool,
    pub ended: bool,
    pub reason: Option<GameOverReason>,
    pub player: PlayerView,
    pub pursuers: Vec<PursuerView>,
    pub events: Vec<RuntimeEvent>,
}
