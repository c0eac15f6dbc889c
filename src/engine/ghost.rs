use crate::constants::{CENTER_EPSILON, HOME_NEIGHBORHOOD, MAX_STALLED_TICKS};
use crate::rng::RandomSource;
use crate::types::{Cell, Descriptor, Direction, Mode, Personality, PursuerView, RuntimeEvent};
use crate::world::Grid;

use super::kinematics::{substeps, KinematicState};
use super::targeting::{OwnState, Targeting};

/// Everything a pursuer may read or draw from during one call.
pub struct MoveContext<'a> {
    pub grid: &'a Grid,
    pub descriptor: &'a Descriptor,
    pub rng: &'a mut dyn RandomSource,
    pub events: &'a mut Vec<RuntimeEvent>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpeedProfile {
    pub base: f64,
    pub flee_factor: f64,
    pub retreat_factor: f64,
}

impl SpeedProfile {
    /// Flee and retreat speeds both scale the base speed.
    pub fn for_mode(&self, mode: Mode) -> f64 {
        match mode {
            Mode::Flee => self.base * self.flee_factor,
            Mode::Retreating => self.base * self.retreat_factor,
            _ => self.base,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Commit {
    Straight,
    Turned,
    Blocked,
}

#[derive(Clone, Debug)]
pub struct GhostMover {
    id: usize,
    targeting: Targeting,
    home: Cell,
    scatter: Cell,
    speeds: SpeedProfile,
    mode: Mode,
    kin: KinematicState,
    next_direction: Option<Direction>,
    next_cell: Option<Cell>,
    exiting_home: bool,
    stalled_ticks: u32,
    stall_reported: bool,
}

impl GhostMover {
    pub const HOME_DIRECTION: Direction = Direction::Up;

    pub fn new(
        id: usize,
        targeting: Targeting,
        home: Cell,
        scatter: Cell,
        speeds: SpeedProfile,
    ) -> Self {
        Self {
            id,
            targeting,
            home,
            scatter,
            speeds,
            mode: Mode::Dormant,
            kin: KinematicState::centered(home, Self::HOME_DIRECTION, speeds.base),
            next_direction: None,
            next_cell: None,
            exiting_home: false,
            stalled_ticks: 0,
            stall_reported: false,
        }
    }

    /// Back to the holding pen: dormant, centered on home, facing up.
    pub fn reset(&mut self) {
        self.mode = Mode::Dormant;
        self.kin = KinematicState::centered(self.home, Self::HOME_DIRECTION, self.speeds.base);
        self.next_direction = None;
        self.next_cell = None;
        self.exiting_home = false;
        self.stalled_ticks = 0;
        self.stall_reported = false;
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn personality(&self) -> Personality {
        self.targeting.personality()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn home(&self) -> Cell {
        self.home
    }

    pub fn scatter(&self) -> Cell {
        self.scatter
    }

    pub fn cell(&self) -> Cell {
        self.kin.cell()
    }

    pub fn position(&self) -> (f64, f64) {
        self.kin.position()
    }

    pub fn direction(&self) -> Direction {
        self.kin.direction
    }

    pub fn next_direction(&self) -> Option<Direction> {
        self.next_direction
    }

    pub fn next_cell(&self) -> Option<Cell> {
        self.next_cell
    }

    pub fn speed(&self) -> f64 {
        self.kin.speed
    }

    pub fn kinematics(&self) -> &KinematicState {
        &self.kin
    }

    pub fn view(&self) -> PursuerView {
        let (row_exact, col_exact) = self.kin.position();
        let cell = self.kin.cell();
        PursuerView {
            id: self.id,
            personality: self.personality(),
            row: cell.row,
            col: cell.col,
            row_exact,
            col_exact,
            dir: self.kin.direction,
            next_dir: self.next_direction,
            mode: self.mode,
            speed: self.kin.speed,
        }
    }

    /// Switches mode, rescales speed and forces a fresh direction decision.
    ///
    /// Switching between patrol and pursuit, or from either into flee, reverses
    /// the heading on the spot.
    pub fn set_mode(&mut self, mode: Mode, ctx: &mut MoveContext<'_>) {
        if mode == self.mode {
            return;
        }
        let from = self.mode;
        self.mode = mode;
        self.kin.speed = self.speeds.for_mode(mode);
        self.next_direction = None;
        self.next_cell = None;
        self.stalled_ticks = 0;
        self.stall_reported = false;
        ctx.events.push(RuntimeEvent::ModeChanged {
            id: self.id,
            from,
            to: mode,
        });

        match mode {
            Mode::Dormant => {
                self.kin = KinematicState::centered(self.home, Self::HOME_DIRECTION, self.kin.speed);
                self.exiting_home = false;
                return;
            }
            Mode::Retreating => self.exiting_home = false,
            _ if from == Mode::Dormant => self.exiting_home = true,
            _ => {}
        }

        if from.is_scheduled() && (mode.is_scheduled() || mode == Mode::Flee) {
            self.reverse();
        }
        if !self.kin.past_center {
            self.plan(ctx);
        }
    }

    pub fn update(&mut self, ctx: &mut MoveContext<'_>) {
        if self.mode == Mode::Dormant {
            return;
        }
        if self.next_direction.is_none() && !self.kin.past_center {
            self.plan(ctx);
        }

        let start = self.kin.position();
        let (count, step) = substeps(self.kin.speed);
        for _ in 0..count {
            if !self.step_once(step, ctx) {
                break;
            }
        }

        if self.kin.position() == start {
            self.stalled_ticks = self.stalled_ticks.saturating_add(1);
            if self.stalled_ticks >= MAX_STALLED_TICKS && !self.stall_reported {
                self.stall_reported = true;
                ctx.events.push(RuntimeEvent::PursuerStalled {
                    id: self.id,
                    cell: self.kin.cell(),
                    ticks: self.stalled_ticks,
                });
                debug_assert!(
                    false,
                    "pursuer {} boxed in at {:?} for {} ticks",
                    self.id,
                    self.kin.cell(),
                    self.stalled_ticks
                );
            }
        } else {
            self.stalled_ticks = 0;
            self.stall_reported = false;
        }

        if self.exiting_home && self.kin.cell().chebyshev(self.home) > HOME_NEIGHBORHOOD {
            self.exiting_home = false;
        }
        self.kin.resync();
    }

    fn step_once(&mut self, amount: f64, ctx: &mut MoveContext<'_>) -> bool {
        let mut remaining = amount;
        if !self.kin.past_center {
            let to_center = self.kin.distance_to_center().max(0.0);
            if to_center > remaining + CENTER_EPSILON {
                self.kin.advance(remaining, ctx.grid);
                return true;
            }
            self.kin.snap_to_center();
            remaining = (remaining - to_center).max(0.0);
            match self.commit(ctx) {
                Commit::Turned => return false,
                Commit::Blocked => {
                    self.plan(ctx);
                    return false;
                }
                Commit::Straight => self.kin.past_center = true,
            }
        }
        if remaining <= 0.0 {
            return true;
        }
        if self.kin.advance(remaining, ctx.grid) {
            self.kin.past_center = false;
            self.next_direction = None;
            self.next_cell = None;
            self.plan(ctx);
        }
        true
    }

    /// Runs at the cell center: adopts the planned heading when it is open.
    fn commit(&mut self, ctx: &mut MoveContext<'_>) -> Commit {
        let cell = self.kin.cell();
        let from = self.kin.direction;
        self.next_cell = None;
        if let Some(next) = self.next_direction.take() {
            if ctx.grid.is_open(cell, next) {
                if next == from {
                    return Commit::Straight;
                }
                self.kin.direction = next;
                self.kin.past_center = true;
                ctx.events.push(RuntimeEvent::DirectionCommitted {
                    id: self.id,
                    cell,
                    from,
                    to: next,
                });
                return Commit::Turned;
            }
        }
        if ctx.grid.is_open(cell, from) {
            Commit::Straight
        } else {
            Commit::Blocked
        }
    }

    fn reverse(&mut self) {
        let ahead = self.kin.distance_to_center();
        self.kin.direction = self.kin.direction.opposite();
        self.kin.past_center = ahead > CENTER_EPSILON;
    }

    fn plan(&mut self, ctx: &mut MoveContext<'_>) {
        let choice = self.decide(ctx);
        self.next_direction = choice;
        self.next_cell = choice.and_then(|dir| ctx.grid.neighbor(self.kin.cell(), dir));
    }

    fn decide(&self, ctx: &mut MoveContext<'_>) -> Option<Direction> {
        let grid = ctx.grid;
        let cell = self.kin.cell();
        let reverse = self.kin.direction.opposite();
        let legal: Vec<Direction> = Direction::ALL
            .into_iter()
            .filter(|dir| *dir != reverse && grid.is_open(cell, *dir))
            .collect();

        if legal.is_empty() {
            return if grid.is_open(cell, reverse) {
                Some(reverse)
            } else {
                None
            };
        }

        match self.mode {
            Mode::Dormant => None,
            Mode::Retreating => legal
                .iter()
                .copied()
                .find(|dir| points_toward(cell, self.home, *dir))
                .or_else(|| nearest_to(grid, cell, &legal, self.home)),
            Mode::Patrol | Mode::Pursuit | Mode::Flee => {
                let near_home = cell.chebyshev(self.home) <= HOME_NEIGHBORHOOD;
                if self.exiting_home && near_home && legal.contains(&Direction::Up) {
                    return Some(Direction::Up);
                }
                if self.mode == Mode::Flee {
                    let index = if legal.len() == 1 {
                        0
                    } else {
                        ctx.rng.pick_index(legal.len())
                    };
                    return legal.get(index).copied();
                }
                let own = OwnState {
                    cell,
                    home: self.home,
                    scatter: self.scatter,
                };
                let target = self
                    .targeting
                    .target_for(self.mode, ctx.descriptor, &own)
                    .unwrap_or(self.scatter);
                nearest_to(grid, cell, &legal, target)
            }
        }
    }
}

/// Greedy step: the candidate whose resulting cell is closest to `target`.
/// Ties keep the earlier entry of [`Direction::ALL`].
fn nearest_to(grid: &Grid, cell: Cell, candidates: &[Direction], target: Cell) -> Option<Direction> {
    let mut best: Option<(Direction, i64)> = None;
    for &dir in candidates {
        let Some(next) = grid.neighbor(cell, dir) else {
            continue;
        };
        let distance = next.distance_sq(target);
        match best {
            Some((_, best_distance)) if best_distance <= distance => {}
            _ => best = Some((dir, distance)),
        }
    }
    best.map(|(dir, _)| dir)
}

fn points_toward(cell: Cell, home: Cell, dir: Direction) -> bool {
    match dir {
        Direction::Up => home.row < cell.row,
        Direction::Down => home.row > cell.row,
        Direction::Left => home.col < cell.col,
        Direction::Right => home.col > cell.col,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::targeting::scatter_corner;
    use crate::rng::Rng;

    struct Scripted {
        picks: Vec<usize>,
        cursor: usize,
    }

    impl RandomSource for Scripted {
        fn next_f32(&mut self) -> f32 {
            0.0
        }

        fn reseed(&mut self, _seed: u32) {
            self.cursor = 0;
        }

        fn pick_index(&mut self, len: usize) -> usize {
            let pick = self.picks[self.cursor % self.picks.len()] % len;
            self.cursor += 1;
            pick
        }
    }

    fn open_room() -> Grid {
        Grid::from_rows(&[
            "###########",
            "#         #",
            "#         #",
            "#         #",
            "#         #",
            "#         #",
            "###########",
        ])
    }

    fn speeds(base: f64) -> SpeedProfile {
        SpeedProfile {
            base,
            flee_factor: 2.0 / 3.0,
            retreat_factor: 2.0,
        }
    }

    fn direct_at(grid: &Grid, home: Cell, base: f64) -> GhostMover {
        let (rows, cols) = grid.dimensions();
        GhostMover::new(
            0,
            Targeting::Direct,
            home,
            scatter_corner(Personality::Direct, rows, cols),
            speeds(base),
        )
    }

    fn descriptor(player: Cell) -> Descriptor {
        Descriptor {
            player_cell: player,
            player_direction: Direction::Left,
            primary_cell: None,
        }
    }

    macro_rules! ctx {
        ($grid:expr, $desc:expr, $rng:expr, $events:expr) => {
            MoveContext {
                grid: &$grid,
                descriptor: &$desc,
                rng: &mut $rng,
                events: &mut $events,
            }
        };
    }

    #[test]
    fn released_pursuer_leaves_home_upward() {
        let grid = open_room();
        let desc = descriptor(Cell::new(5, 5));
        let mut rng = Rng::new(1);
        let mut events = Vec::new();
        let mut ghost = direct_at(&grid, Cell::new(3, 4), 0.4);

        assert_eq!(ghost.mode(), Mode::Dormant);
        assert_eq!(ghost.position(), (3.5, 4.5));

        ghost.set_mode(Mode::Patrol, &mut ctx!(grid, desc, rng, events));
        assert_eq!(ghost.next_direction(), Some(Direction::Up));
        assert_eq!(ghost.next_cell(), Some(Cell::new(2, 4)));

        ghost.update(&mut ctx!(grid, desc, rng, events));
        let (row, col) = ghost.position();
        assert!((row - 3.1).abs() < 1e-9);
        assert_eq!(col, 4.5);
        assert_eq!(ghost.cell(), Cell::new(3, 4));
        assert!(matches!(
            events[0],
            RuntimeEvent::ModeChanged {
                from: Mode::Dormant,
                to: Mode::Patrol,
                ..
            }
        ));
    }

    #[test]
    fn dormant_pursuer_does_not_move() {
        let grid = open_room();
        let desc = descriptor(Cell::new(5, 5));
        let mut rng = Rng::new(1);
        let mut events = Vec::new();
        let mut ghost = direct_at(&grid, Cell::new(3, 4), 0.4);
        for _ in 0..10 {
            ghost.update(&mut ctx!(grid, desc, rng, events));
        }
        assert_eq!(ghost.position(), (3.5, 4.5));
        assert_eq!(ghost.next_direction(), None);
        assert!(events.is_empty());
    }

    #[test]
    fn stops_on_center_before_wall_and_reverses_at_dead_end() {
        let grid = Grid::from_rows(&["#######", "#     #", "#######"]);
        let desc = descriptor(Cell::new(1, 1));
        let mut rng = Rng::new(1);
        let mut events = Vec::new();
        let mut ghost = direct_at(&grid, Cell::new(1, 3), 0.4);
        ghost.set_mode(Mode::Patrol, &mut ctx!(grid, desc, rng, events));
        assert_eq!(ghost.next_direction(), Some(Direction::Right));

        let mut reached_end = false;
        for _ in 0..12 {
            ghost.update(&mut ctx!(grid, desc, rng, events));
            let (_, col) = ghost.position();
            assert!(col <= 5.5 + 1e-12, "overshot into wall: {col}");
            assert!(ghost.kinematics().is_consistent());
            if ghost.direction() == Direction::Left {
                assert_eq!(col, 5.5);
                assert_eq!(ghost.cell(), Cell::new(1, 5));
                reached_end = true;
                break;
            }
        }
        assert!(reached_end);
    }

    #[test]
    fn commit_point_turn_snaps_to_center() {
        let grid = open_room();
        let desc = descriptor(Cell::new(5, 9));
        let mut rng = Rng::new(1);
        let mut events = Vec::new();
        let mut ghost = direct_at(&grid, Cell::new(1, 1), 0.15);
        ghost.set_mode(Mode::Pursuit, &mut ctx!(grid, desc, rng, events));

        for _ in 0..200 {
            let before = ghost.direction();
            ghost.update(&mut ctx!(grid, desc, rng, events));
            if ghost.direction() != before {
                let cell = ghost.cell();
                let (row, col) = ghost.position();
                assert!((row - (cell.row as f64 + 0.5)).abs() < 1e-9);
                assert!((col - (cell.col as f64 + 0.5)).abs() < 1e-9);
            }
        }
        assert!(events
            .iter()
            .any(|e| matches!(e, RuntimeEvent::DirectionCommitted { .. })));
    }

    #[test]
    fn never_reverses_without_mode_change_in_open_room() {
        let grid = open_room();
        let mut rng = Rng::new(9);
        let mut events = Vec::new();
        let mut ghost = direct_at(&grid, Cell::new(3, 4), 0.2);
        let desc = descriptor(Cell::new(5, 1));
        ghost.set_mode(Mode::Pursuit, &mut ctx!(grid, desc, rng, events));
        for tick in 0..500 {
            let player = Cell::new(1 + (tick / 50) % 5, 1 + (tick / 25) % 9);
            let desc = descriptor(player);
            let before = ghost.direction();
            ghost.update(&mut ctx!(grid, desc, rng, events));
            assert_ne!(ghost.direction(), before.opposite(), "reversed at tick {tick}");
        }
    }

    #[test]
    fn mode_switch_reverses_heading() {
        let grid = open_room();
        let desc = descriptor(Cell::new(5, 5));
        let mut rng = Rng::new(1);
        let mut events = Vec::new();
        let mut ghost = direct_at(&grid, Cell::new(3, 4), 0.2);
        ghost.set_mode(Mode::Patrol, &mut ctx!(grid, desc, rng, events));
        ghost.update(&mut ctx!(grid, desc, rng, events));
        assert_eq!(ghost.direction(), Direction::Up);

        ghost.set_mode(Mode::Pursuit, &mut ctx!(grid, desc, rng, events));
        assert_eq!(ghost.direction(), Direction::Down);
        ghost.update(&mut ctx!(grid, desc, rng, events));
        assert!(ghost.position().0 > 3.3);
    }

    #[test]
    fn flee_speed_and_retreat_speed_scale_base() {
        let grid = open_room();
        let desc = descriptor(Cell::new(5, 5));
        let mut rng = Rng::new(1);
        let mut events = Vec::new();
        let mut ghost = direct_at(&grid, Cell::new(3, 4), 0.15);
        ghost.set_mode(Mode::Pursuit, &mut ctx!(grid, desc, rng, events));
        ghost.set_mode(Mode::Flee, &mut ctx!(grid, desc, rng, events));
        assert!((ghost.speed() - 0.1).abs() < 1e-12);
        ghost.set_mode(Mode::Retreating, &mut ctx!(grid, desc, rng, events));
        assert!((ghost.speed() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn flee_picks_among_legal_directions_with_injected_source() {
        let grid = open_room();
        let desc = descriptor(Cell::new(5, 5));
        let mut events = Vec::new();

        let mut pick_first = Scripted {
            picks: vec![0],
            cursor: 0,
        };
        let mut ghost = direct_at(&grid, Cell::new(3, 4), 0.2);
        ghost.set_mode(Mode::Pursuit, &mut ctx!(grid, desc, pick_first, events));
        ghost.set_mode(Mode::Flee, &mut ctx!(grid, desc, pick_first, events));
        // Reversed to face down at the center; legal = Down, Left, Right.
        assert_eq!(ghost.direction(), Direction::Down);
        assert_eq!(ghost.next_direction(), Some(Direction::Down));

        let mut pick_last = Scripted {
            picks: vec![2],
            cursor: 0,
        };
        let mut other = direct_at(&grid, Cell::new(3, 4), 0.2);
        other.set_mode(Mode::Pursuit, &mut ctx!(grid, desc, pick_last, events));
        other.set_mode(Mode::Flee, &mut ctx!(grid, desc, pick_last, events));
        assert_eq!(other.next_direction(), Some(Direction::Right));
    }

    #[test]
    fn flee_is_reproducible_for_a_seed() {
        let grid = open_room();
        let desc = descriptor(Cell::new(5, 5));
        let trace = |seed: u32| {
            let mut rng = Rng::new(seed);
            let mut events = Vec::new();
            let mut ghost = direct_at(&grid, Cell::new(3, 4), 0.2);
            ghost.set_mode(Mode::Patrol, &mut ctx!(grid, desc, rng, events));
            ghost.set_mode(Mode::Flee, &mut ctx!(grid, desc, rng, events));
            let mut out = Vec::new();
            for _ in 0..300 {
                ghost.update(&mut ctx!(grid, desc, rng, events));
                let (row, col) = ghost.position();
                out.push((row.to_bits(), col.to_bits()));
            }
            out
        };
        assert_eq!(trace(77), trace(77));
    }

    #[test]
    fn retreating_pursuer_reaches_home() {
        let grid = open_room();
        let desc = descriptor(Cell::new(5, 5));
        let mut rng = Rng::new(1);
        let mut events = Vec::new();
        let mut ghost = direct_at(&grid, Cell::new(3, 4), 0.2);
        ghost.set_mode(Mode::Pursuit, &mut ctx!(grid, desc, rng, events));
        for _ in 0..40 {
            ghost.update(&mut ctx!(grid, desc, rng, events));
        }
        assert_ne!(ghost.cell(), ghost.home());

        ghost.set_mode(Mode::Retreating, &mut ctx!(grid, desc, rng, events));
        let mut arrived = false;
        for _ in 0..400 {
            ghost.update(&mut ctx!(grid, desc, rng, events));
            if ghost.cell() == ghost.home() {
                arrived = true;
                break;
            }
        }
        assert!(arrived);

        ghost.set_mode(Mode::Dormant, &mut ctx!(grid, desc, rng, events));
        assert_eq!(ghost.position(), (3.5, 4.5));
        assert_eq!(ghost.direction(), Direction::Up);
    }

    #[test]
    fn tunnel_wraps_left_edge_to_right_edge() {
        let grid = Grid::from_rows(&["#####", "     ", "#####"]);
        let desc = descriptor(Cell::new(1, 2));
        let mut rng = Rng::new(1);
        let mut events = Vec::new();
        let mut ghost = GhostMover::new(
            1,
            Targeting::Ambusher { lead: 4 },
            Cell::new(1, 1),
            scatter_corner(Personality::Ambusher, 3, 5),
            speeds(0.4),
        );
        ghost.set_mode(Mode::Patrol, &mut ctx!(grid, desc, rng, events));
        assert_eq!(ghost.next_direction(), Some(Direction::Left));

        let mut wrapped = false;
        for _ in 0..10 {
            let before = ghost.cell();
            ghost.update(&mut ctx!(grid, desc, rng, events));
            if before.col == 0 && ghost.cell().col == 4 {
                let (row, col) = ghost.position();
                assert_eq!(row, 1.5);
                assert!(col > 4.0 && col < 5.0);
                wrapped = true;
                break;
            }
        }
        assert!(wrapped);
    }

    #[test]
    fn boxed_in_pursuer_has_no_plan() {
        let grid = Grid::from_rows(&["###", "# #", "###"]);
        let desc = descriptor(Cell::new(1, 1));
        let mut rng = Rng::new(1);
        let mut events = Vec::new();
        let mut ghost = direct_at(&grid, Cell::new(1, 1), 0.2);
        ghost.set_mode(Mode::Patrol, &mut ctx!(grid, desc, rng, events));
        assert_eq!(ghost.next_direction(), None);
        ghost.update(&mut ctx!(grid, desc, rng, events));
        assert_eq!(ghost.position(), (1.5, 1.5));
    }

    fn boxed_in_patrol() -> (Grid, GhostMover) {
        let grid = Grid::from_rows(&["###", "# #", "###"]);
        let ghost = direct_at(&grid, Cell::new(1, 1), 0.2);
        (grid, ghost)
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "boxed in")]
    fn boxed_in_pursuer_trips_stall_assert() {
        let (grid, mut ghost) = boxed_in_patrol();
        let desc = descriptor(Cell::new(1, 1));
        let mut rng = Rng::new(1);
        let mut events = Vec::new();
        ghost.set_mode(Mode::Patrol, &mut ctx!(grid, desc, rng, events));
        for _ in 0..MAX_STALLED_TICKS {
            ghost.update(&mut ctx!(grid, desc, rng, events));
        }
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn boxed_in_pursuer_reports_stall_once() {
        let (grid, mut ghost) = boxed_in_patrol();
        let desc = descriptor(Cell::new(1, 1));
        let mut rng = Rng::new(1);
        let mut events = Vec::new();
        ghost.set_mode(Mode::Patrol, &mut ctx!(grid, desc, rng, events));
        let stalls = |events: &[RuntimeEvent]| {
            events
                .iter()
                .filter(|e| matches!(e, RuntimeEvent::PursuerStalled { .. }))
                .count()
        };

        for _ in 1..MAX_STALLED_TICKS {
            ghost.update(&mut ctx!(grid, desc, rng, events));
        }
        assert_eq!(stalls(&events), 0);
        for _ in 0..MAX_STALLED_TICKS {
            ghost.update(&mut ctx!(grid, desc, rng, events));
        }
        assert_eq!(stalls(&events), 1);
        assert!(events.iter().any(|e| matches!(
            e,
            RuntimeEvent::PursuerStalled {
                id: 0,
                ticks: MAX_STALLED_TICKS,
                ..
            }
        )));
        assert_eq!(ghost.position(), (1.5, 1.5));
    }

    #[test]
    fn released_pursuer_exits_upward_even_when_target_is_below() {
        let grid = open_room();
        let desc = descriptor(Cell::new(5, 4));
        let mut rng = Rng::new(1);
        let mut events = Vec::new();
        let mut ghost = direct_at(&grid, Cell::new(3, 4), 0.2);
        ghost.set_mode(Mode::Pursuit, &mut ctx!(grid, desc, rng, events));
        // Greedy descent alone would pick Left here.
        assert_eq!(ghost.next_direction(), Some(Direction::Up));
    }

    #[test]
    fn upward_exit_stops_outside_home_neighborhood() {
        let grid = Grid::from_rows(&[
            "###########",
            "#         #",
            "#         #",
            "#         #",
            "#         #",
            "#         #",
            "#         #",
            "#         #",
            "#         #",
            "###########",
        ]);
        let desc = descriptor(Cell::new(8, 4));
        let mut rng = Rng::new(1);
        let mut events = Vec::new();
        let mut ghost = direct_at(&grid, Cell::new(6, 4), 0.4);
        ghost.set_mode(Mode::Pursuit, &mut ctx!(grid, desc, rng, events));
        assert_eq!(ghost.next_direction(), Some(Direction::Up));

        for _ in 0..20 {
            ghost.update(&mut ctx!(grid, desc, rng, events));
            if ghost.direction() != Direction::Up {
                break;
            }
        }
        assert_eq!(ghost.direction(), Direction::Left);
        assert_eq!(ghost.cell(), Cell::new(4, 4));
        assert_eq!(ghost.position(), (4.5, 4.5));
        let turns: Vec<&RuntimeEvent> = events
            .iter()
            .filter(|e| matches!(e, RuntimeEvent::DirectionCommitted { .. }))
            .collect();
        assert_eq!(turns.len(), 1);
        assert!(matches!(
            turns[0],
            RuntimeEvent::DirectionCommitted {
                cell: Cell { row: 4, col: 4 },
                from: Direction::Up,
                to: Direction::Left,
                ..
            }
        ));
    }

    #[test]
    fn fleeing_pursuer_turns_back_at_dead_end() {
        let grid = Grid::from_rows(&["#######", "#     #", "#######"]);
        let desc = descriptor(Cell::new(1, 1));
        let mut events = Vec::new();
        let mut rng = Scripted {
            picks: vec![1],
            cursor: 0,
        };
        let mut ghost = direct_at(&grid, Cell::new(1, 3), 0.3);
        ghost.set_mode(Mode::Flee, &mut ctx!(grid, desc, rng, events));
        assert_eq!(ghost.next_direction(), Some(Direction::Right));

        let mut turned_at = None;
        for tick in 0..30 {
            ghost.update(&mut ctx!(grid, desc, rng, events));
            assert!(ghost.position().1 <= 5.5);
            if ghost.direction() == Direction::Left {
                turned_at = Some(tick);
                break;
            }
        }
        assert!(turned_at.is_some());
        assert_eq!(ghost.position(), (1.5, 5.5));
        assert!(events.iter().any(|e| matches!(
            e,
            RuntimeEvent::DirectionCommitted {
                cell: Cell { row: 1, col: 5 },
                from: Direction::Right,
                to: Direction::Left,
                ..
            }
        )));

        for _ in 0..3 {
            ghost.update(&mut ctx!(grid, desc, rng, events));
        }
        assert_eq!(ghost.direction(), Direction::Left);
        assert!(ghost.position().1 < 5.5);
    }

    #[test]
    fn greedy_ties_follow_priority_order() {
        let grid = open_room();
        let cell = Cell::new(3, 5);
        let all = [
            Direction::Up,
            Direction::Down,
            Direction::Left,
            Direction::Right,
        ];
        // Target straight below-right diagonal: Down and Right tie.
        assert_eq!(
            nearest_to(&grid, cell, &all, Cell::new(5, 7)),
            Some(Direction::Down)
        );
        assert_eq!(
            nearest_to(&grid, cell, &[Direction::Left, Direction::Right], Cell::new(3, 5)),
            Some(Direction::Left)
        );
    }
}
