use crate::constants::CENTER_EPSILON;
use crate::types::{Cell, Direction, PlayerView};
use crate::world::Grid;

use super::kinematics::{substeps, KinematicState};

/// A perpendicular turn accepted before the player reached the turning cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PendingTurn {
    /// Heading the player keeps sliding along until the pivot center.
    pub carry: Direction,
    pub pivot: Cell,
    pub distance: f64,
}

#[derive(Clone, Debug)]
pub struct PlayerMover {
    start: Cell,
    base_speed: f64,
    kin: KinematicState,
    pending: Option<PendingTurn>,
}

impl PlayerMover {
    pub const START_DIRECTION: Direction = Direction::Left;

    pub fn new(start: Cell, speed: f64) -> Self {
        Self {
            start,
            base_speed: speed,
            kin: KinematicState::centered(start, Self::START_DIRECTION, speed),
            pending: None,
        }
    }

    pub fn reset(&mut self) {
        self.kin = KinematicState::centered(self.start, Self::START_DIRECTION, self.base_speed);
        self.pending = None;
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

    pub fn speed(&self) -> f64 {
        self.kin.speed
    }

    pub fn pending_turn(&self) -> Option<PendingTurn> {
        self.pending
    }

    pub fn kinematics(&self) -> &KinematicState {
        &self.kin
    }

    pub fn view(&self) -> PlayerView {
        let (row_exact, col_exact) = self.kin.position();
        let cell = self.kin.cell();
        PlayerView {
            row: cell.row,
            col: cell.col,
            row_exact,
            col_exact,
            dir: self.kin.direction,
            speed: self.kin.speed,
            turning: self.pending.is_some(),
        }
    }

    /// Asks for a new heading. Returns `false` when the turn is refused: the
    /// destination is a wall, or a buffered turn is still being completed.
    pub fn request_turn(&mut self, dir: Direction, grid: &Grid) -> bool {
        if self.pending.is_some() {
            return false;
        }
        let current = self.kin.direction;
        if dir == current {
            return true;
        }
        let cell = self.kin.cell();

        if dir == current.opposite() {
            let center_ahead = self.kin.distance_to_center_along(dir) > CENTER_EPSILON;
            if !center_ahead && !grid.is_open(cell, dir) {
                return false;
            }
            self.kin.direction = dir;
            return true;
        }

        let to_center = self.kin.distance_to_center();
        let (pivot, distance) = if to_center >= -CENTER_EPSILON {
            (cell, to_center.max(0.0))
        } else {
            match grid.neighbor(cell, current) {
                Some(next) if grid.is_open(cell, current) => (next, to_center + 1.0),
                _ => return false,
            }
        };
        if !grid.is_open(pivot, dir) {
            return false;
        }

        if distance <= CENTER_EPSILON {
            self.kin.place_at(pivot);
        } else {
            self.pending = Some(PendingTurn {
                carry: current,
                pivot,
                distance,
            });
        }
        self.kin.direction = dir;
        true
    }

    pub fn update(&mut self, grid: &Grid) {
        let (count, step) = substeps(self.kin.speed);
        for _ in 0..count {
            self.step_once(step, grid);
        }
        self.kin.resync();
    }

    fn step_once(&mut self, amount: f64, grid: &Grid) {
        let mut remaining = amount;
        if let Some(turn) = self.pending.as_mut() {
            if turn.distance > remaining + CENTER_EPSILON {
                turn.distance -= remaining;
                let carry = turn.carry;
                self.kin.advance_along(carry, remaining, grid);
                return;
            }
            remaining = (remaining - turn.distance).max(0.0);
            let pivot = turn.pivot;
            self.pending = None;
            self.kin.place_at(pivot);
        }
        if remaining <= 0.0 {
            return;
        }

        let cell = self.kin.cell();
        if grid.is_open(cell, self.kin.direction) {
            self.kin.advance(remaining, grid);
            return;
        }
        // Wall ahead: stop on the center line.
        if self.kin.distance_to_center() > remaining {
            self.kin.advance(remaining, grid);
        } else {
            self.kin.snap_to_center();
        }
    }
}
