//! Useful-move generation.
//!
//! Instead of proposing every reachable cell, the generator only stops where
//! stopping can matter: junctions and corners, the escape cell, and traps.
//! This keeps the number of branches per position proportional to the number
//! of junctions in view rather than the number of cells.

use smallvec::SmallVec;

use crate::branch::Step;
use crate::error::{MazeError, Result};
use crate::maze::{Coords, Direction, Grid};

pub type Moves = SmallVec<[Step; 16]>;

/// Useful moves from `pos`, which must be a path cell.
///
/// With `include_traps`, traps are walkable and a step onto one is returned
/// flagged as a trap step; exploration never continues past a trap.
pub fn useful_moves(grid: &Grid, pos: Coords, include_traps: bool) -> Moves {
    debug_assert!(
        grid.is_path(pos, include_traps),
        "move generation from non-path cell {}",
        pos
    );

    let mut moves = Moves::new();

    for direction in Direction::ALL {
        let mut distance = 1;
        loop {
            let cell = pos.offset(direction, distance);
            if !grid.is_path(cell, include_traps) {
                break;
            }

            if cell == grid.escape() {
                moves.push(Step::new(direction, distance));
                break;
            }

            if include_traps && grid.is_trap(cell) {
                moves.push(Step::trap(direction, distance));
                break;
            }

            // A side opening makes this a corner or junction
            let opens_sideways = direction
                .perpendicular()
                .iter()
                .any(|&side| grid.is_path(cell.neighbor(side), include_traps));
            if opens_sideways {
                moves.push(Step::new(direction, distance));
            }

            distance += 1;
        }
    }

    moves
}

/// Like [`useful_moves`], but reports a non-path origin as an error.
pub fn checked_useful_moves(grid: &Grid, pos: Coords, include_traps: bool) -> Result<Moves> {
    if !grid.is_path(pos, include_traps) {
        return Err(MazeError::InvalidStartPosition(pos));
    }
    Ok(useful_moves(grid, pos, include_traps))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maze::tests::{layout, straight_corridor};
    use crate::maze::Tile;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn t_junction() -> Grid {
        layout(&[
            "xxxxxxxxxxxxxxxxx",
            "xs      xxxxxxxxx",
            "xxxx xxxxxxxxxxxx",
            "xxxx xxxxxxxxxxxx",
            "xxxx h   e xxxxxx",
            "xxxxxxxxxxxxxxxxx",
            "xxxxxxxxxxxxxxxxx",
            "xxxxxxxxxxxxxxxxx",
            "xxxxxxxxxxxxxxxxx",
            "xxxxxxxxxxxxxxxxx",
            "xxxxxxxxxxxxxxxxx",
            "xxxxxxxxxxxxxxxxx",
            "xxxxxxxxxxxxxxxxx",
            "xxxxxxxxxxxxxxxxx",
            "xxxxxxxxxxxxxxxxx",
            "xxxxxxxxxxxxxxxxx",
            "xxxxxxxxxxxxxxxxx",
        ])
    }

    #[test]
    fn test_corridor_yields_single_move_to_escape() {
        let grid = straight_corridor();
        let moves = useful_moves(&grid, grid.start(), false);
        assert_eq!(moves.as_slice(), &[Step::new(Direction::Right, 14)]);
    }

    #[test]
    fn test_stops_at_junctions_only() {
        let grid = t_junction();
        let moves = useful_moves(&grid, grid.start(), false);
        // The junction at (4, 1) and nothing past it (dead end at (7, 1)).
        assert_eq!(moves.as_slice(), &[Step::new(Direction::Right, 3)]);

        // The start is not a junction, and the corner below only turns
        // towards a trap.
        let junction = Coords::new(4, 1);
        assert!(useful_moves(&grid, junction, false).is_empty());
        let moves = useful_moves(&grid, junction, true);
        assert_eq!(moves.as_slice(), &[Step::new(Direction::Down, 3)]);
    }

    #[test]
    fn test_trap_ends_exploration_in_its_direction() {
        let grid = t_junction();
        let corner = Coords::new(4, 4);

        let without = useful_moves(&grid, corner, false);
        assert_eq!(without.as_slice(), &[Step::new(Direction::Up, 3)]);

        let with = useful_moves(&grid, corner, true);
        assert_eq!(
            with.as_slice(),
            &[Step::trap(Direction::Right, 1), Step::new(Direction::Up, 3)]
        );
    }

    #[test]
    fn test_escape_is_recorded_and_ends_the_walk() {
        let grid = t_junction();
        let moves = useful_moves(&grid.without_traps(), Coords::new(4, 4), false);
        assert!(moves.contains(&Step::new(Direction::Right, 5)));
        assert!(moves.iter().all(|m| !(m.direction == Direction::Right && m.cells > 5)));
    }

    #[test]
    fn test_checked_rejects_wall_origin() {
        let grid = t_junction();
        assert!(matches!(
            checked_useful_moves(&grid, Coords::new(0, 0), true),
            Err(MazeError::InvalidStartPosition(_))
        ));
        assert!(checked_useful_moves(&grid, Coords::new(5, 4), false).is_err());
        assert!(checked_useful_moves(&grid, Coords::new(5, 4), true).is_ok());
    }

    #[test]
    fn test_destinations_are_never_walls_or_out_of_bounds() {
        for seed in 0..24 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut grid = Grid::open(Coords::new(2, 3), Coords::new(14, 12)).unwrap();
            for pos in grid.cells().collect::<Vec<_>>() {
                if grid.tile(pos) == Some(Tile::Open) {
                    match rng.gen_range(0..10) {
                        0..=2 => grid.set_tile(pos, Tile::Wall),
                        3 => grid.set_tile(pos, Tile::Trap),
                        _ => {}
                    }
                }
            }

            for include_traps in [false, true] {
                for pos in grid.cells().filter(|&p| grid.is_path(p, include_traps)) {
                    for step in useful_moves(&grid, pos, include_traps) {
                        let dest = grid.walk(pos, step).unwrap();
                        assert!(dest.in_bounds());
                        assert_ne!(grid.tile(dest), Some(Tile::Wall));
                        assert_eq!(step.trap, grid.is_trap(dest));
                        if !include_traps {
                            assert!(!step.trap);
                        }
                    }
                }
            }
        }
    }
}
