use std::collections::{HashSet, VecDeque};

use crate::error::MazeError;
use crate::types::{Cell, CellKind, Direction, Personality};

/// Immutable wall lookup shared by every actor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    rows: i32,
    cols: i32,
    walls: Vec<bool>,
}

impl Grid {
    pub fn new(rows: usize, cols: usize, walls: Vec<bool>) -> Result<Self, MazeError> {
        if walls.len() != rows * cols {
            return Err(MazeError::WallMask {
                expected: rows * cols,
                found: walls.len(),
            });
        }
        Ok(Self {
            rows: rows as i32,
            cols: cols as i32,
            walls,
        })
    }

    /// Test grid from text rows where `#` is a wall and anything else is open.
    #[cfg(test)]
    pub(crate) fn from_rows(rows: &[&str]) -> Self {
        let cols = rows.first().map(|row| row.chars().count()).unwrap_or(0);
        let walls = rows
            .iter()
            .flat_map(|row| row.chars().map(|symbol| symbol == '#'))
            .collect();
        Self::new(rows.len(), cols, walls).expect("rectangular test grid")
    }

    pub fn dimensions(&self) -> (i32, i32) {
        (self.rows, self.cols)
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.row >= 0 && cell.col >= 0 && cell.row < self.rows && cell.col < self.cols
    }

    /// Out-of-bounds lookups are a caller bug; release builds report them as walls.
    pub fn is_wall(&self, row: i32, col: i32) -> bool {
        let cell = Cell::new(row, col);
        debug_assert!(self.contains(cell), "wall lookup outside grid: {cell:?}");
        if !self.contains(cell) {
            return true;
        }
        self.walls[(row * self.cols + col) as usize]
    }

    /// Adjacent cell, wrapping horizontally through the side tunnels.
    pub fn neighbor(&self, cell: Cell, dir: Direction) -> Option<Cell> {
        let next = cell.step(dir, 1);
        if next.row < 0 || next.row >= self.rows {
            return None;
        }
        Some(Cell::new(next.row, next.col.rem_euclid(self.cols)))
    }

    pub fn is_open(&self, cell: Cell, dir: Direction) -> bool {
        self.neighbor(cell, dir)
            .map(|next| !self.is_wall(next.row, next.col))
            .unwrap_or(false)
    }
}

/// Parsed maze: grid, collectibles and actor start cells.
#[derive(Clone, Debug)]
pub struct Maze {
    pub grid: Grid,
    pub kinds: Vec<CellKind>,
    pub player_start: Cell,
    /// Ordered by personality.
    pub pursuers: Vec<(Personality, Cell)>,
}

impl Maze {
    pub fn kind_at(&self, cell: Cell) -> CellKind {
        if !self.grid.contains(cell) {
            return CellKind::Wall;
        }
        let (_, cols) = self.grid.dimensions();
        self.kinds[(cell.row * cols + cell.col) as usize]
    }

    pub fn collectible_count(&self) -> usize {
        self.kinds
            .iter()
            .filter(|kind| matches!(kind, CellKind::Pellet | CellKind::Energizer))
            .count()
    }
}

pub fn parse_layout(layout: &str) -> Result<Maze, MazeError> {
    let lines: Vec<&str> = layout.lines().filter(|line| !line.is_empty()).collect();
    let Some(first) = lines.first() else {
        return Err(MazeError::Empty);
    };
    let cols = first.chars().count();

    let mut kinds = Vec::with_capacity(lines.len() * cols);
    let mut player_start = None;
    let mut pursuers: Vec<(Personality, Cell)> = Vec::new();

    for (row, line) in lines.iter().enumerate() {
        let found = line.chars().count();
        if found != cols {
            return Err(MazeError::Ragged {
                row,
                expected: cols,
                found,
            });
        }
        for (col, symbol) in line.chars().enumerate() {
            let cell = Cell::new(row as i32, col as i32);
            let kind = match symbol {
                '#' => CellKind::Wall,
                '.' => CellKind::Pellet,
                'o' => CellKind::Energizer,
                ' ' => CellKind::Empty,
                'P' => {
                    if player_start.is_some() {
                        return Err(MazeError::DuplicatePlayerStart { row, col });
                    }
                    player_start = Some(cell);
                    CellKind::Empty
                }
                other => {
                    let Some(personality) = Personality::from_symbol(other) else {
                        return Err(MazeError::UnknownSymbol {
                            row,
                            col,
                            symbol: other,
                        });
                    };
                    if pursuers.iter().any(|(p, _)| *p == personality) {
                        return Err(MazeError::DuplicatePursuer {
                            personality,
                            row,
                            col,
                        });
                    }
                    pursuers.push((personality, cell));
                    CellKind::Empty
                }
            };
            kinds.push(kind);
        }
    }

    let rows = lines.len();
    for col in 0..cols {
        for row in [0, rows - 1] {
            if kinds[row * cols + col] != CellKind::Wall {
                return Err(MazeError::OpenBorder { row, col });
            }
        }
    }

    let player_start = player_start.ok_or(MazeError::MissingPlayerStart)?;
    let walls = kinds.iter().map(|kind| *kind == CellKind::Wall).collect();
    let grid = Grid::new(rows, cols, walls)?;
    pursuers.sort_by_key(|(personality, _)| *personality);

    let reachable = build_reachable_cells(&grid, player_start);
    for (index, kind) in kinds.iter().enumerate() {
        if !matches!(kind, CellKind::Pellet | CellKind::Energizer) {
            continue;
        }
        let cell = Cell::new((index / cols) as i32, (index % cols) as i32);
        if !reachable.contains(&cell) {
            return Err(MazeError::Unreachable {
                row: cell.row as usize,
                col: cell.col as usize,
            });
        }
    }
    for (_, home) in &pursuers {
        if !reachable.contains(home) {
            return Err(MazeError::Unreachable {
                row: home.row as usize,
                col: home.col as usize,
            });
        }
    }

    Ok(Maze {
        grid,
        kinds,
        player_start,
        pursuers,
    })
}

fn build_reachable_cells(grid: &Grid, start: Cell) -> HashSet<Cell> {
    let mut out = HashSet::new();
    let mut queue = VecDeque::new();
    out.insert(start);
    queue.push_back(start);

    while let Some(cell) = queue.pop_front() {
        for dir in Direction::ALL {
            let Some(next) = grid.neighbor(cell, dir) else {
                continue;
            };
            if grid.is_wall(next.row, next.col) {
                continue;
            }
            if out.insert(next) {
                queue.push_back(next);
            }
        }
    }

    out
}
