use crate::constants::{CENTER_EPSILON, MAX_SUBSTEP, WRAP_EPSILON};
use crate::types::{Cell, Direction};
use crate::world::Grid;

/// Continuous position of one actor.
///
/// `cell` is always `floor` of the exact position; every mutation goes through
/// methods that re-derive it.
#[derive(Clone, Debug, PartialEq)]
pub struct KinematicState {
    row_exact: f64,
    col_exact: f64,
    cell: Cell,
    pub direction: Direction,
    pub speed: f64,
    /// Set once the actor has crossed (or committed at) the center of `cell`.
    pub past_center: bool,
}

impl KinematicState {
    pub fn centered(cell: Cell, direction: Direction, speed: f64) -> Self {
        let (row_exact, col_exact) = center_of(cell);
        Self {
            row_exact,
            col_exact,
            cell,
            direction,
            speed,
            past_center: false,
        }
    }

    pub fn position(&self) -> (f64, f64) {
        (self.row_exact, self.col_exact)
    }

    pub fn cell(&self) -> Cell {
        self.cell
    }

    /// Signed distance to the cell center along `dir`; negative once passed.
    pub fn distance_to_center_along(&self, dir: Direction) -> f64 {
        let (center_row, center_col) = center_of(self.cell);
        match dir {
            Direction::Up => self.row_exact - center_row,
            Direction::Down => center_row - self.row_exact,
            Direction::Left => self.col_exact - center_col,
            Direction::Right => center_col - self.col_exact,
        }
    }

    pub fn distance_to_center(&self) -> f64 {
        self.distance_to_center_along(self.direction)
    }

    pub fn at_center(&self) -> bool {
        let (center_row, center_col) = center_of(self.cell);
        (self.row_exact - center_row).abs() <= CENTER_EPSILON
            && (self.col_exact - center_col).abs() <= CENTER_EPSILON
    }

    pub fn snap_to_center(&mut self) {
        let (row, col) = center_of(self.cell);
        self.row_exact = row;
        self.col_exact = col;
    }

    pub fn place_at(&mut self, cell: Cell) {
        self.cell = cell;
        self.snap_to_center();
    }

    /// Moves along the current heading. Returns `true` when a new cell was entered.
    pub fn advance(&mut self, amount: f64, grid: &Grid) -> bool {
        self.advance_along(self.direction, amount, grid)
    }

    pub fn advance_along(&mut self, dir: Direction, amount: f64, grid: &Grid) -> bool {
        let (dr, dc) = dir.delta();
        self.row_exact += dr as f64 * amount;
        self.col_exact += dc as f64 * amount;
        if dir.is_horizontal() {
            let (_, cols) = grid.dimensions();
            self.col_exact = wrap_column(self.col_exact, cols as f64);
        }
        let next = self.derived_cell();
        let entered = next != self.cell;
        self.cell = next;
        entered
    }

    pub fn derived_cell(&self) -> Cell {
        Cell::new(self.row_exact.floor() as i32, self.col_exact.floor() as i32)
    }

    pub fn is_consistent(&self) -> bool {
        self.derived_cell() == self.cell
    }

    /// Re-derives `cell` from the exact position after an invariant check.
    pub fn resync(&mut self) {
        debug_assert!(
            self.is_consistent(),
            "cell {:?} disagrees with position ({}, {})",
            self.cell,
            self.row_exact,
            self.col_exact
        );
        self.cell = self.derived_cell();
    }
}

pub fn center_of(cell: Cell) -> (f64, f64) {
    (cell.row as f64 + 0.5, cell.col as f64 + 0.5)
}

/// Equal sub-steps no longer than [`MAX_SUBSTEP`], so no cell center is skipped.
pub fn substeps(speed: f64) -> (u32, f64) {
    if speed <= 0.0 {
        return (0, 0.0);
    }
    let count = (speed / MAX_SUBSTEP).ceil().max(1.0) as u32;
    (count, speed / count as f64)
}

fn wrap_column(col: f64, cols: f64) -> f64 {
    if col < 0.0 {
        (col + cols).min(cols - WRAP_EPSILON)
    } else if col >= cols {
        (col - cols).max(0.0)
    } else {
        col
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corridor() -> Grid {
        Grid::from_rows(&["#####", "     ", "#####"])
    }

    #[test]
    fn centered_state_sits_on_half_coordinates() {
        let state = KinematicState::centered(Cell::new(3, 4), Direction::Up, 0.4);
        assert_eq!(state.position(), (3.5, 4.5));
        assert!(state.at_center());
        assert!(state.is_consistent());
        assert_eq!(state.distance_to_center(), 0.0);
    }

    #[test]
    fn distance_sign_follows_heading() {
        let grid = corridor();
        let mut state = KinematicState::centered(Cell::new(1, 2), Direction::Right, 0.2);
        state.advance(0.2, &grid);
        assert!(state.distance_to_center() < 0.0);
        assert!(state.distance_to_center_along(Direction::Left) > 0.0);
    }

    #[test]
    fn leaving_column_zero_wraps_to_last_column() {
        let grid = corridor();
        let mut state = KinematicState::centered(Cell::new(1, 0), Direction::Left, 0.4);
        assert!(!state.advance(0.4, &grid));
        assert!(state.advance(0.4, &grid));
        let (row, col) = state.position();
        assert_eq!(row, 1.5);
        assert!(col > 4.0 && col < 5.0);
        assert_eq!(state.cell(), Cell::new(1, 4));
    }

    #[test]
    fn leaving_last_column_wraps_to_zero() {
        let grid = corridor();
        let mut state = KinematicState::centered(Cell::new(1, 4), Direction::Right, 0.3);
        state.advance(0.3, &grid);
        state.advance(0.3, &grid);
        assert_eq!(state.cell(), Cell::new(1, 0));
        assert!(state.is_consistent());
    }

    #[test]
    fn tiny_negative_column_stays_inside_grid() {
        assert!(wrap_column(-1e-18, 5.0) < 5.0);
        assert_eq!(wrap_column(5.0, 5.0), 0.0);
    }

    #[test]
    fn substeps_cap_at_half_a_cell() {
        assert_eq!(substeps(0.4), (1, 0.4));
        assert_eq!(substeps(0.8), (2, 0.4));
        assert_eq!(substeps(1.0), (2, 0.5));
        assert_eq!(substeps(0.0).0, 0);
    }
}
