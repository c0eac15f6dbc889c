use crate::config::GameConfig;
use crate::constants::SCATTER_MARGIN;
use crate::types::{Cell, Descriptor, Direction, Mode, Personality};

/// What a pursuer knows about itself when picking a target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OwnState {
    pub cell: Cell,
    pub home: Cell,
    pub scatter: Cell,
}

/// Per-personality target selection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Targeting {
    Direct,
    Ambusher { lead: i32 },
    Flanker { lead: i32 },
    Opportunist { radius: f64 },
}

impl Targeting {
    pub fn for_personality(personality: Personality, config: &GameConfig) -> Self {
        match personality {
            Personality::Direct => Self::Direct,
            Personality::Ambusher => Self::Ambusher {
                lead: config.ambusher_lead,
            },
            Personality::Flanker => Self::Flanker {
                lead: config.flanker_lead,
            },
            Personality::Opportunist => Self::Opportunist {
                radius: config.opportunist_radius,
            },
        }
    }

    pub fn personality(&self) -> Personality {
        match self {
            Self::Direct => Personality::Direct,
            Self::Ambusher { .. } => Personality::Ambusher,
            Self::Flanker { .. } => Personality::Flanker,
            Self::Opportunist { .. } => Personality::Opportunist,
        }
    }

    /// Target cell for `mode`, or `None` when the mode has no fixed target.
    pub fn target_for(&self, mode: Mode, descriptor: &Descriptor, own: &OwnState) -> Option<Cell> {
        match mode {
            Mode::Dormant => Some(own.cell),
            Mode::Retreating => Some(own.home),
            Mode::Flee => None,
            Mode::Patrol => Some(own.scatter),
            Mode::Pursuit => Some(self.pursuit_target(descriptor, own)),
        }
    }

    fn pursuit_target(&self, descriptor: &Descriptor, own: &OwnState) -> Cell {
        let player = descriptor.player_cell;
        match *self {
            Self::Direct => player,
            Self::Ambusher { lead } => lead_cell(player, descriptor.player_direction, lead),
            Self::Flanker { lead } => {
                let ahead = lead_cell(player, descriptor.player_direction, lead);
                let anchor = descriptor.primary_cell.unwrap_or(ahead);
                // Not clamped: the doubled vector may leave the maze.
                Cell::new(2 * ahead.row - anchor.row, 2 * ahead.col - anchor.col)
            }
            Self::Opportunist { radius } => {
                let distance = (own.cell.distance_sq(player) as f64).sqrt();
                if distance > radius {
                    player
                } else {
                    own.scatter
                }
            }
        }
    }
}

/// Cell `lead` steps ahead of the player. Facing up also shifts `lead` to the
/// left, reproducing the arcade overflow quirk.
pub fn lead_cell(player: Cell, facing: Direction, lead: i32) -> Cell {
    let ahead = player.step(facing, lead);
    if facing == Direction::Up {
        ahead.step(Direction::Left, lead)
    } else {
        ahead
    }
}

/// Fixed patrol corner outside the grid, distinct per personality.
pub fn scatter_corner(personality: Personality, rows: i32, cols: i32) -> Cell {
    let top = -SCATTER_MARGIN;
    let bottom = rows - 1 + SCATTER_MARGIN;
    let left = -SCATTER_MARGIN;
    let right = cols - 1 + SCATTER_MARGIN;
    match personality {
        Personality::Direct => Cell::new(top, right),
        Personality::Ambusher => Cell::new(top, left),
        Personality::Flanker => Cell::new(bottom, right),
        Personality::Opportunist => Cell::new(bottom, left),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn descriptor(player: Cell, facing: Direction, primary: Option<Cell>) -> Descriptor {
        Descriptor {
            player_cell: player,
            player_direction: facing,
            primary_cell: primary,
        }
    }

    fn own(cell: Cell) -> OwnState {
        OwnState {
            cell,
            home: Cell::new(10, 10),
            scatter: Cell::new(-2, 30),
        }
    }

    #[test]
    fn direct_chases_player_cell() {
        let d = descriptor(Cell::new(5, 6), Direction::Left, None);
        assert_eq!(
            Targeting::Direct.target_for(Mode::Pursuit, &d, &own(Cell::new(1, 1))),
            Some(Cell::new(5, 6))
        );
    }

    #[test]
    fn ambusher_leads_four_cells_with_up_quirk() {
        let targeting = Targeting::Ambusher { lead: 4 };
        let me = own(Cell::new(1, 1));
        let right = descriptor(Cell::new(10, 10), Direction::Right, None);
        assert_eq!(
            targeting.target_for(Mode::Pursuit, &right, &me),
            Some(Cell::new(10, 14))
        );
        let up = descriptor(Cell::new(10, 10), Direction::Up, None);
        assert_eq!(
            targeting.target_for(Mode::Pursuit, &up, &me),
            Some(Cell::new(6, 6))
        );
    }

    #[test]
    fn flanker_doubles_vector_from_primary_without_clamping() {
        let targeting = Targeting::Flanker { lead: 2 };
        let d = descriptor(Cell::new(5, 5), Direction::Down, Some(Cell::new(1, 1)));
        // ahead = (7, 5); target = 2 * (7, 5) - (1, 1)
        assert_eq!(
            targeting.target_for(Mode::Pursuit, &d, &own(Cell::new(0, 0))),
            Some(Cell::new(13, 9))
        );

        let far = descriptor(Cell::new(2, 2), Direction::Up, Some(Cell::new(20, 20)));
        // ahead = (0, 0); target = (-20, -20), well outside any grid
        assert_eq!(
            targeting.target_for(Mode::Pursuit, &far, &own(Cell::new(0, 0))),
            Some(Cell::new(-20, -20))
        );
    }

    #[test]
    fn flanker_without_primary_targets_lead_cell() {
        let targeting = Targeting::Flanker { lead: 2 };
        let d = descriptor(Cell::new(5, 5), Direction::Left, None);
        assert_eq!(
            targeting.target_for(Mode::Pursuit, &d, &own(Cell::new(0, 0))),
            Some(Cell::new(5, 3))
        );
    }

    #[test]
    fn opportunist_switches_at_radius() {
        let targeting = Targeting::Opportunist { radius: 8.0 };
        let d = descriptor(Cell::new(10, 10), Direction::Left, None);
        let far = own(Cell::new(10, 19));
        assert_eq!(
            targeting.target_for(Mode::Pursuit, &d, &far),
            Some(Cell::new(10, 10))
        );
        let exactly_eight = own(Cell::new(10, 18));
        assert_eq!(
            targeting.target_for(Mode::Pursuit, &d, &exactly_eight),
            Some(exactly_eight.scatter)
        );
    }

    #[test]
    fn non_pursuit_modes_use_fixed_targets() {
        let d = descriptor(Cell::new(4, 4), Direction::Left, None);
        let me = own(Cell::new(3, 3));
        for targeting in [
            Targeting::Direct,
            Targeting::Ambusher { lead: 4 },
            Targeting::Flanker { lead: 2 },
            Targeting::Opportunist { radius: 8.0 },
        ] {
            assert_eq!(targeting.target_for(Mode::Patrol, &d, &me), Some(me.scatter));
            assert_eq!(targeting.target_for(Mode::Flee, &d, &me), None);
            assert_eq!(targeting.target_for(Mode::Dormant, &d, &me), Some(me.cell));
            assert_eq!(targeting.target_for(Mode::Retreating, &d, &me), Some(me.home));
        }
    }

    #[test]
    fn scatter_corners_are_distinct_and_outside() {
        let corners: HashSet<Cell> = Personality::ALL
            .iter()
            .map(|p| scatter_corner(*p, 7, 11))
            .collect();
        assert_eq!(corners.len(), 4);
        let direct = scatter_corner(Personality::Direct, 7, 11);
        assert!(direct.row < 0 && direct.col >= 11);
    }
}
