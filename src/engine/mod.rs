use crate::config::GameConfig;
use crate::error::EngineError;
use crate::observer::EngineObserver;
use crate::rng::{RandomSource, Rng};
use crate::types::{
    Cell, CellKind, Descriptor, Direction, GameOverReason, Mode, Personality, RuntimeEvent,
    Snapshot,
};
use crate::world::{parse_layout, Maze};

pub mod ghost;
pub mod kinematics;
pub mod player;
pub mod schedule;
pub mod targeting;

use self::ghost::{GhostMover, MoveContext, SpeedProfile};
use self::player::PlayerMover;
use self::schedule::PhaseSchedule;
use self::targeting::{scatter_corner, Targeting};

#[derive(Default)]
pub struct GameEngineOptions {
    pub seed: u32,
    /// Replaces the built-in generator; it is reseeded with `seed` on every reset.
    pub random_source: Option<Box<dyn RandomSource>>,
    pub observer: Option<Box<dyn EngineObserver>>,
}

pub struct GameEngine {
    config: GameConfig,
    maze: Maze,
    seed: u32,

    rng: Box<dyn RandomSource>,
    observer: Option<Box<dyn EngineObserver>>,
    player: PlayerMover,
    pursuers: Vec<GhostMover>,
    release_timers: Vec<Option<u32>>,
    schedule: PhaseSchedule,
    consumed: Vec<bool>,
    events: Vec<RuntimeEvent>,
    pending: Vec<RuntimeEvent>,

    tick: u64,
    score: u32,
    lives: u32,
    extra_life_awarded: bool,
    combo: u32,
    flee_ticks_left: u32,
    pause_ticks_left: u32,
    pellets_total: usize,
    pellets_consumed: usize,
    level_complete: bool,
    ended: bool,
    end_reason: Option<GameOverReason>,
}

impl GameEngine {
    pub fn new(
        maze: Maze,
        config: GameConfig,
        options: GameEngineOptions,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let (rows, cols) = maze.grid.dimensions();
        let speeds = SpeedProfile {
            base: config.pursuer_speed,
            flee_factor: config.flee_speed_factor,
            retreat_factor: config.retreat_speed_factor,
        };
        let pursuers: Vec<GhostMover> = maze
            .pursuers
            .iter()
            .enumerate()
            .map(|(id, &(personality, home))| {
                GhostMover::new(
                    id,
                    Targeting::for_personality(personality, &config),
                    home,
                    scatter_corner(personality, rows, cols),
                    speeds,
                )
            })
            .collect();
        let rng = options
            .random_source
            .unwrap_or_else(|| Box::new(Rng::new(options.seed)));

        let mut engine = Self {
            player: PlayerMover::new(maze.player_start, config.player_speed),
            release_timers: vec![None; pursuers.len()],
            schedule: PhaseSchedule::from_config(&config),
            consumed: vec![false; maze.kinds.len()],
            pellets_total: maze.collectible_count(),
            lives: config.starting_lives,
            combo: config.combo_base,
            pursuers,
            config,
            maze,
            seed: options.seed,
            rng,
            observer: options.observer,
            events: Vec::new(),
            pending: Vec::new(),
            tick: 0,
            score: 0,
            extra_life_awarded: false,
            flee_ticks_left: 0,
            pause_ticks_left: 0,
            pellets_consumed: 0,
            level_complete: false,
            ended: false,
            end_reason: None,
        };
        engine.reset();

        for index in 0..engine.pursuers.len() {
            let pursuer = &engine.pursuers[index];
            let event = RuntimeEvent::PursuerCreated {
                id: pursuer.id(),
                personality: pursuer.personality(),
                home: pursuer.home(),
                scatter: pursuer.scatter(),
            };
            engine.emit(event);
        }
        Ok(engine)
    }

    pub fn from_layout(
        layout: &str,
        config: GameConfig,
        options: GameEngineOptions,
    ) -> Result<Self, EngineError> {
        let maze = parse_layout(layout)?;
        Self::new(maze, config, options)
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn end_reason(&self) -> Option<GameOverReason> {
        self.end_reason
    }

    pub fn level_complete(&self) -> bool {
        self.level_complete
    }

    pub fn is_paused(&self) -> bool {
        self.pause_ticks_left > 0
    }

    pub fn pellets_total(&self) -> usize {
        self.pellets_total
    }

    pub fn pellets_consumed(&self) -> usize {
        self.pellets_consumed
    }

    pub fn global_mode(&self) -> Mode {
        self.schedule.mode()
    }

    pub fn flee_ticks_left(&self) -> u32 {
        self.flee_ticks_left
    }

    pub fn player(&self) -> &PlayerMover {
        &self.player
    }

    pub fn pursuers(&self) -> &[GhostMover] {
        &self.pursuers
    }

    /// `true` while the collectible at `cell` is still on the board.
    pub fn has_collectible(&self, cell: Cell) -> bool {
        matches!(
            self.maze.kind_at(cell),
            CellKind::Pellet | CellKind::Energizer
        ) && self
            .cell_index(cell)
            .map(|index| !self.consumed[index])
            .unwrap_or(false)
    }

    /// Forwards a turn to the player. Refused while paused or after the game ended.
    pub fn request_turn(&mut self, dir: Direction) -> bool {
        if self.ended || self.is_paused() {
            return false;
        }
        self.player.request_turn(dir, &self.maze.grid)
    }

    /// Full reinitialization: board, score, lives, clock and random source.
    pub fn reset(&mut self) {
        self.rng.reseed(self.seed);
        self.consumed.fill(false);
        self.pellets_consumed = 0;
        self.score = 0;
        self.lives = self.config.starting_lives;
        self.extra_life_awarded = false;
        self.tick = 0;
        self.level_complete = false;
        self.ended = false;
        self.end_reason = None;
        self.reset_round();
        self.events.clear();
        self.pending.clear();
    }

    /// Puts every actor back on its start cell after a lost life.
    pub fn reset_round(&mut self) {
        self.player.reset();
        for pursuer in &mut self.pursuers {
            pursuer.reset();
        }
        self.release_timers = self
            .pursuers
            .iter()
            .map(|pursuer| Some(self.config.release_ticks(pursuer.personality())))
            .collect();
        self.schedule.reset();
        self.flee_ticks_left = 0;
        self.pause_ticks_left = 0;
        self.combo = self.config.combo_base;
    }

    pub fn advance(&mut self) {
        if self.ended {
            return;
        }
        self.tick += 1;

        if self.pause_ticks_left > 0 {
            self.pause_ticks_left -= 1;
            if self.pause_ticks_left == 0 {
                self.reset_round();
                self.emit(RuntimeEvent::RoundReset);
            }
            return;
        }

        self.update_release_timers();
        self.update_mode_timers();

        let descriptor = self.descriptor();
        self.player.update(&self.maze.grid);
        {
            let mut ctx = MoveContext {
                grid: &self.maze.grid,
                descriptor: &descriptor,
                rng: &mut *self.rng,
                events: &mut self.pending,
            };
            for pursuer in &mut self.pursuers {
                pursuer.update(&mut ctx);
            }
        }
        self.flush_pending();

        self.consume_collectible();
        if self.pellets_total > 0 && self.pellets_consumed >= self.pellets_total {
            self.level_complete = true;
            self.emit(RuntimeEvent::LevelCleared);
            self.finish(GameOverReason::LevelCleared);
            return;
        }

        if self.resolve_collisions() {
            return;
        }
        self.settle_retreating();
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let snapshot = Snapshot {
            tick: self.tick,
            global_mode: self.schedule.mode(),
            flee_ticks_left: self.flee_ticks_left,
            score: self.score,
            lives: self.lives,
            pellets_total: self.pellets_total,
            pellets_consumed: self.pellets_consumed,
            level_complete: self.level_complete,
            paused: self.is_paused(),
            ended: self.ended,
            reason: self.end_reason,
            player: self.player.view(),
            pursuers: self.pursuers.iter().map(GhostMover::view).collect(),
            events: if include_events {
                self.events.clone()
            } else {
                Vec::new()
            },
        };
        if include_events {
            self.events.clear();
        }
        snapshot
    }

    fn descriptor(&self) -> Descriptor {
        Descriptor {
            player_cell: self.player.cell(),
            player_direction: self.player.direction(),
            primary_cell: self
                .pursuers
                .iter()
                .find(|pursuer| pursuer.personality() == Personality::Direct)
                .map(GhostMover::cell),
        }
    }

    fn update_release_timers(&mut self) {
        let mode = self.schedule.mode();
        for index in 0..self.pursuers.len() {
            let Some(left) = self.release_timers[index] else {
                continue;
            };
            let left = left.saturating_sub(1);
            if left > 0 {
                self.release_timers[index] = Some(left);
                continue;
            }
            self.release_timers[index] = None;
            self.set_pursuer_mode(index, mode);
        }
    }

    fn update_mode_timers(&mut self) {
        if self.flee_ticks_left > 0 {
            self.flee_ticks_left -= 1;
            if self.flee_ticks_left == 0 {
                self.emit(RuntimeEvent::FleeEnded);
                let mode = self.schedule.mode();
                for index in 0..self.pursuers.len() {
                    if self.pursuers[index].mode() == Mode::Flee {
                        self.set_pursuer_mode(index, mode);
                    }
                }
            }
            return;
        }

        let Some(mode) = self.schedule.tick() else {
            return;
        };
        self.emit(RuntimeEvent::PhaseAdvanced {
            index: self.schedule.index(),
            mode,
        });
        for index in 0..self.pursuers.len() {
            if self.pursuers[index].mode().is_scheduled() {
                self.set_pursuer_mode(index, mode);
            }
        }
    }

    fn consume_collectible(&mut self) {
        let cell = self.player.cell();
        let Some(index) = self.cell_index(cell) else {
            return;
        };
        if self.consumed[index] {
            return;
        }
        match self.maze.kind_at(cell) {
            CellKind::Pellet => {
                self.consumed[index] = true;
                self.pellets_consumed += 1;
                self.emit(RuntimeEvent::PelletEaten { cell });
                self.add_score(self.config.pellet_score);
            }
            CellKind::Energizer => {
                self.consumed[index] = true;
                self.pellets_consumed += 1;
                self.emit(RuntimeEvent::EnergizerEaten { cell });
                self.add_score(self.config.energizer_score);
                self.start_flee();
            }
            _ => {}
        }
    }

    fn start_flee(&mut self) {
        self.combo = self.config.combo_base;
        let duration_ticks = self.config.flee_ticks();
        if duration_ticks == 0 {
            return;
        }
        self.flee_ticks_left = duration_ticks;
        self.emit(RuntimeEvent::FleeStarted { duration_ticks });
        for index in 0..self.pursuers.len() {
            if self.pursuers[index].mode() != Mode::Dormant {
                self.set_pursuer_mode(index, Mode::Flee);
            }
        }
    }

    /// Returns `true` when the player lost a life this tick.
    fn resolve_collisions(&mut self) -> bool {
        let cell = self.player.cell();
        for index in 0..self.pursuers.len() {
            let pursuer = &self.pursuers[index];
            if pursuer.cell() != cell {
                continue;
            }
            let id = pursuer.id();
            match pursuer.mode() {
                Mode::Flee => {
                    let bonus = self.combo;
                    self.set_pursuer_mode(index, Mode::Retreating);
                    self.combo = self.combo.saturating_mul(2);
                    self.emit(RuntimeEvent::PursuerCaptured { id, bonus });
                    self.add_score(bonus);
                }
                Mode::Patrol | Mode::Pursuit => {
                    self.lose_life(id);
                    return true;
                }
                Mode::Dormant | Mode::Retreating => {}
            }
        }
        false
    }

    fn lose_life(&mut self, id: usize) {
        self.lives = self.lives.saturating_sub(1);
        self.emit(RuntimeEvent::PlayerCaught {
            id,
            lives_left: self.lives,
        });
        if self.lives == 0 {
            self.finish(GameOverReason::OutOfLives);
            return;
        }
        let pause = self.config.death_pause_ticks();
        if pause == 0 {
            self.reset_round();
            self.emit(RuntimeEvent::RoundReset);
        } else {
            self.pause_ticks_left = pause;
        }
    }

    fn settle_retreating(&mut self) {
        for index in 0..self.pursuers.len() {
            let pursuer = &self.pursuers[index];
            if pursuer.mode() != Mode::Retreating || pursuer.cell() != pursuer.home() {
                continue;
            }
            let delay = self.config.release_ticks(pursuer.personality());
            self.set_pursuer_mode(index, Mode::Dormant);
            self.release_timers[index] = Some(delay);
        }
    }

    fn add_score(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
        let Some(threshold) = self.config.extra_life_score else {
            return;
        };
        if !self.extra_life_awarded && self.score >= threshold {
            self.extra_life_awarded = true;
            self.lives = self.lives.saturating_add(1);
            self.emit(RuntimeEvent::ExtraLife { lives: self.lives });
        }
    }

    fn finish(&mut self, reason: GameOverReason) {
        self.ended = true;
        self.end_reason = Some(reason);
        self.emit(RuntimeEvent::GameOver { reason });
    }

    fn set_pursuer_mode(&mut self, index: usize, mode: Mode) {
        let descriptor = self.descriptor();
        {
            let mut ctx = MoveContext {
                grid: &self.maze.grid,
                descriptor: &descriptor,
                rng: &mut *self.rng,
                events: &mut self.pending,
            };
            if let Some(pursuer) = self.pursuers.get_mut(index) {
                pursuer.set_mode(mode, &mut ctx);
            }
        }
        self.flush_pending();
    }

    fn flush_pending(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        for event in pending {
            self.emit(event);
        }
    }

    fn emit(&mut self, event: RuntimeEvent) {
        if let Some(observer) = self.observer.as_mut() {
            observer.on_event(self.tick, &event);
        }
        self.events.push(event);
    }

    fn cell_index(&self, cell: Cell) -> Option<usize> {
        if !self.maze.grid.contains(cell) {
            return None;
        }
        let (_, cols) = self.maze.grid.dimensions();
        Some((cell.row * cols + cell.col) as usize)
    }
}
