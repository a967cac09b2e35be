//! Quarter-turn rotation of a region's tiles.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::maze::{Coords, Grid, Tile};
use crate::regions::{RegionId, REGION_SIZE};

const SIZE: usize = REGION_SIZE as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationSense {
    Clockwise,
    CounterClockwise,
}

impl RotationSense {
    pub const ALL: [RotationSense; 2] = [RotationSense::Clockwise, RotationSense::CounterClockwise];

    pub fn reversed(self) -> RotationSense {
        match self {
            RotationSense::Clockwise => RotationSense::CounterClockwise,
            RotationSense::CounterClockwise => RotationSense::Clockwise,
        }
    }

    /// Script code used by the external executor.
    pub fn code(self) -> u8 {
        match self {
            RotationSense::Clockwise => 1,
            RotationSense::CounterClockwise => 2,
        }
    }
}

/// A region plus the sense to turn it in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rotation {
    pub region: RegionId,
    pub sense: RotationSense,
}

impl Rotation {
    pub fn new(region: RegionId, sense: RotationSense) -> Self {
        Self { region, sense }
    }

    /// The rotation that undoes this one.
    pub fn inverse(self) -> Rotation {
        Rotation::new(self.region, self.sense.reversed())
    }

    /// Where a cell inside the region ends up after the turn. Cells outside
    /// the region do not move.
    pub fn map(self, pos: Coords) -> Coords {
        if !self.region.contains(pos) {
            return pos;
        }
        let origin = self.region.origin();
        let (x, y) = (pos.x - origin.x, pos.y - origin.y);
        let last = REGION_SIZE - 1;
        let (nx, ny) = match self.sense {
            RotationSense::Clockwise => (last - y, x),
            RotationSense::CounterClockwise => (y, last - x),
        };
        Coords::new(origin.x + nx, origin.y + ny)
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sense = match self.sense {
            RotationSense::Clockwise => "clockwise",
            RotationSense::CounterClockwise => "counter-clockwise",
        };
        write!(f, "{} {}", self.region, sense)
    }
}

/// Rotate a region of `grid`, returning the rotated snapshot.
///
/// The start and escape coordinates follow their tiles.
pub fn rotate(grid: &Grid, rotation: Rotation) -> Grid {
    let origin = rotation.region.origin();
    let at = |x: usize, y: usize| Coords::new(origin.x + x as i32, origin.y + y as i32);

    let mut old = [[Tile::Wall; SIZE]; SIZE];
    for (y, row) in old.iter_mut().enumerate() {
        for (x, tile) in row.iter_mut().enumerate() {
            *tile = grid.tile(at(x, y)).unwrap_or(Tile::Wall);
        }
    }

    let mut rotated = grid.clone();
    for y in 0..SIZE {
        for x in 0..SIZE {
            let tile = match rotation.sense {
                RotationSense::Clockwise => old[SIZE - 1 - x][y],
                RotationSense::CounterClockwise => old[x][SIZE - 1 - y],
            };
            rotated.set_tile(at(x, y), tile);
        }
    }

    rotated.set_endpoints(rotation.map(grid.start()), rotation.map(grid.escape()));
    rotated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maze::tests::layout;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_grid(seed: u64) -> Grid {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut grid = Grid::open(Coords::new(1, 1), Coords::new(15, 15)).unwrap();
        for pos in grid.cells().collect::<Vec<_>>() {
            if grid.tile(pos) != Some(Tile::Open) {
                continue;
            }
            match rng.gen_range(0..10) {
                0..=2 => grid.set_tile(pos, Tile::Wall),
                3 => grid.set_tile(pos, Tile::Trap),
                _ => {}
            }
        }
        grid
    }

    #[test]
    fn test_four_quarter_turns_restore_the_grid() {
        for seed in 0..8 {
            let grid = random_grid(seed);
            for region in RegionId::ALL {
                for sense in RotationSense::ALL {
                    let rotation = Rotation::new(region, sense);
                    let mut turned = grid.clone();
                    for _ in 0..4 {
                        turned = rotate(&turned, rotation);
                    }
                    assert_eq!(turned, grid, "{} four times", rotation);
                }
            }
        }
    }

    #[test]
    fn test_clockwise_then_counter_clockwise_is_identity() {
        for seed in 0..8 {
            let grid = random_grid(seed);
            for region in RegionId::ALL {
                let rotation = Rotation::new(region, RotationSense::Clockwise);
                let back = rotate(&rotate(&grid, rotation), rotation.inverse());
                assert_eq!(back, grid);
            }
        }
    }

    #[test]
    fn test_vertical_bar_turns_horizontal() {
        let grid = layout(&[
            "xxxxxxxxxxxxxxxxx",
            "xxxxxxxx xxxxxxxx",
            "xxxxxxxx xxxxxxxx",
            "xs    xx xx    ex",
            "xxxxxxxx xxxxxxxx",
            "xxxxxxxx xxxxxxxx",
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
        ]);
        let region = RegionId::new(2).unwrap();
        let turned = rotate(&grid, Rotation::new(region, RotationSense::Clockwise));

        for x in 6..=10 {
            assert_eq!(turned.tile(Coords::new(x, 3)), Some(Tile::Open), "x = {}", x);
        }
        assert_eq!(turned.tile(Coords::new(8, 1)), Some(Tile::Wall));
        assert_eq!(turned.tile(Coords::new(8, 5)), Some(Tile::Wall));
        // Untouched outside the region.
        assert_eq!(turned.tile(Coords::new(5, 3)), Some(Tile::Open));
        assert_eq!(turned.tile(Coords::new(11, 3)), Some(Tile::Open));
    }

    #[test]
    fn test_start_and_escape_follow_their_tiles() {
        let grid = Grid::open(Coords::new(1, 1), Coords::new(15, 15)).unwrap();
        let cw = rotate(&grid, Rotation::new(RegionId::new(1).unwrap(), RotationSense::Clockwise));
        assert_eq!(cw.start(), Coords::new(5, 1));
        assert_eq!(cw.tile(Coords::new(5, 1)), Some(Tile::Start));
        assert_eq!(cw.tile(Coords::new(1, 1)), Some(Tile::Open));
        assert_eq!(cw.escape(), Coords::new(15, 15));

        let ccw = rotate(
            &grid,
            Rotation::new(RegionId::new(9).unwrap(), RotationSense::CounterClockwise),
        );
        assert_eq!(ccw.escape(), Coords::new(15, 11));
        assert_eq!(ccw.tile(Coords::new(15, 11)), Some(Tile::Escape));
    }
}
