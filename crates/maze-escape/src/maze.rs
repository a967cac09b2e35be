//! Grid model for the fixed-size escape maze.
//!
//! The grid is a 17x17 array of tiles whose outer ring is always wall
//! (except where the start or escape cell sits on it). Grids are cheap to
//! clone: tiles live behind a shared buffer that is only copied when a
//! snapshot is mutated.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::branch::Step;
use crate::error::{MazeError, Result};

/// Width and height of every maze.
pub const GRID_SIZE: i32 = 17;

const CELLS: usize = (GRID_SIZE * GRID_SIZE) as usize;

/// A cell address, column first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coords {
    pub x: i32,
    pub y: i32,
}

impl Coords {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The cell `cells` steps away in `direction`.
    pub fn offset(self, direction: Direction, cells: u32) -> Coords {
        let (dx, dy) = direction.delta();
        let n = cells as i32;
        Coords::new(self.x + dx * n, self.y + dy * n)
    }

    pub fn neighbor(self, direction: Direction) -> Coords {
        self.offset(direction, 1)
    }

    pub fn manhattan(self, other: Coords) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    pub fn in_bounds(self) -> bool {
        (0..GRID_SIZE).contains(&self.x) && (0..GRID_SIZE).contains(&self.y)
    }

    fn on_outer_ring(self) -> bool {
        self.x == 0 || self.y == 0 || self.x == GRID_SIZE - 1 || self.y == GRID_SIZE - 1
    }

    fn index(self) -> Option<usize> {
        if self.in_bounds() {
            Some((self.y * GRID_SIZE + self.x) as usize)
        } else {
            None
        }
    }
}

impl fmt::Display for Coords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Compass direction. Declaration order is the iteration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
    ];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
        }
    }

    /// The two directions at right angles to this one.
    pub fn perpendicular(self) -> [Direction; 2] {
        match self {
            Direction::Left | Direction::Right => [Direction::Up, Direction::Down],
            Direction::Up | Direction::Down => [Direction::Left, Direction::Right],
        }
    }

    /// Script code used by the external executor.
    pub fn code(self) -> u8 {
        match self {
            Direction::Left => 1,
            Direction::Right => 2,
            Direction::Up => 3,
            Direction::Down => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }
}

/// Tile kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tile {
    Open,
    Start,
    Escape,
    Wall,
    Trap,
}

impl Tile {
    pub fn is_path(self, include_traps: bool) -> bool {
        match self {
            Tile::Open | Tile::Start | Tile::Escape => true,
            Tile::Trap => include_traps,
            Tile::Wall => false,
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Tile::Open => ' ',
            Tile::Start => 's',
            Tile::Escape => 'e',
            Tile::Wall => 'x',
            Tile::Trap => 'h',
        }
    }

    pub fn from_char(c: char) -> Option<Tile> {
        match c {
            ' ' => Some(Tile::Open),
            's' => Some(Tile::Start),
            'e' => Some(Tile::Escape),
            'x' => Some(Tile::Wall),
            'h' => Some(Tile::Trap),
            _ => None,
        }
    }
}

/// A 1-based cell reference as found in maze descriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRef {
    pub row: i32,
    pub column: i32,
}

impl CellRef {
    fn to_coords(self) -> Result<Coords> {
        let pos = Coords::new(self.column - 1, self.row - 1);
        if pos.in_bounds() {
            Ok(pos)
        } else {
            Err(MazeError::malformed(format!(
                "cell row {} column {} is outside the {}x{} grid",
                self.row, self.column, GRID_SIZE, GRID_SIZE
            )))
        }
    }
}

/// Maze description as produced by the maze authoring tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MazeDescription {
    pub level: u8,
    pub start_point: CellRef,
    pub escape_point: CellRef,
    #[serde(default)]
    pub walls: Vec<CellRef>,
    #[serde(default)]
    pub traps: Vec<CellRef>,
}

/// The tile grid plus the current start and escape coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    tiles: Rc<[Tile; CELLS]>,
    start: Coords,
    escape: Coords,
}

impl Grid {
    /// An open interior surrounded by wall, with the given start and escape.
    pub fn open(start: Coords, escape: Coords) -> Result<Grid> {
        if !start.in_bounds() || !escape.in_bounds() {
            return Err(MazeError::malformed("start or escape is out of bounds"));
        }
        if start == escape {
            return Err(MazeError::malformed(format!(
                "start and escape share cell {}",
                start
            )));
        }

        let mut tiles = [Tile::Open; CELLS];
        for y in 0..GRID_SIZE {
            for x in 0..GRID_SIZE {
                let pos = Coords::new(x, y);
                if pos.on_outer_ring() {
                    tiles[(y * GRID_SIZE + x) as usize] = Tile::Wall;
                }
            }
        }

        let mut grid = Grid {
            tiles: Rc::new(tiles),
            start,
            escape,
        };
        grid.set_tile(start, Tile::Start);
        grid.set_tile(escape, Tile::Escape);
        Ok(grid)
    }

    /// Build a grid from a description, converting its 1-based cells.
    pub fn from_description(desc: &MazeDescription) -> Result<Grid> {
        let start = desc.start_point.to_coords()?;
        let escape = desc.escape_point.to_coords()?;
        let mut grid = Grid::open(start, escape)?;

        for (cells, tile) in [(&desc.walls, Tile::Wall), (&desc.traps, Tile::Trap)] {
            for cell in cells {
                let pos = cell.to_coords()?;
                if pos == start || pos == escape {
                    return Err(MazeError::malformed(format!(
                        "{:?} placed on start or escape cell {}",
                        tile, pos
                    )));
                }
                if !pos.on_outer_ring() {
                    grid.set_tile(pos, tile);
                }
            }
        }

        Ok(grid)
    }

    /// Parse a 17-row ASCII layout (`x` wall, `s` start, `e` escape,
    /// `h` trap, space open). Short rows are padded with open cells.
    pub fn from_layout(text: &str) -> Result<Grid> {
        let rows: Vec<&str> = text.lines().collect();
        if rows.len() != GRID_SIZE as usize {
            return Err(MazeError::malformed(format!(
                "layout has {} rows, expected {}",
                rows.len(),
                GRID_SIZE
            )));
        }

        let mut tiles = [Tile::Open; CELLS];
        let mut start = None;
        let mut escape = None;

        for (y, row) in rows.iter().enumerate() {
            if row.chars().count() > GRID_SIZE as usize {
                return Err(MazeError::malformed(format!("layout row {} is too wide", y)));
            }
            let padded = row.chars().chain(std::iter::repeat(' ')).take(GRID_SIZE as usize);
            for (x, c) in padded.enumerate() {
                let pos = Coords::new(x as i32, y as i32);
                let parsed = Tile::from_char(c).ok_or_else(|| {
                    MazeError::malformed(format!("unknown tile {:?} at {}", c, pos))
                })?;

                let tile = match parsed {
                    Tile::Start => {
                        if start.replace(pos).is_some() {
                            return Err(MazeError::malformed("layout has more than one start"));
                        }
                        parsed
                    }
                    Tile::Escape => {
                        if escape.replace(pos).is_some() {
                            return Err(MazeError::malformed("layout has more than one escape"));
                        }
                        parsed
                    }
                    Tile::Open | Tile::Trap if pos.on_outer_ring() => Tile::Wall,
                    other => other,
                };
                tiles[y * GRID_SIZE as usize + x] = tile;
            }
        }

        let start = start.ok_or_else(|| MazeError::malformed("layout has no start"))?;
        let escape = escape.ok_or_else(|| MazeError::malformed("layout has no escape"))?;

        Ok(Grid {
            tiles: Rc::new(tiles),
            start,
            escape,
        })
    }

    pub fn start(&self) -> Coords {
        self.start
    }

    pub fn escape(&self) -> Coords {
        self.escape
    }

    /// Tile at a position, `None` outside the grid.
    pub fn tile(&self, pos: Coords) -> Option<Tile> {
        pos.index().map(|i| self.tiles[i])
    }

    /// Whether the agent may stand on `pos`. Out-of-bounds cells never are.
    pub fn is_path(&self, pos: Coords, include_traps: bool) -> bool {
        self.tile(pos).map_or(false, |t| t.is_path(include_traps))
    }

    pub fn is_trap(&self, pos: Coords) -> bool {
        self.tile(pos) == Some(Tile::Trap)
    }

    pub fn has_traps(&self) -> bool {
        self.tiles.iter().any(|&t| t == Tile::Trap)
    }

    pub fn traps(&self) -> impl Iterator<Item = Coords> + '_ {
        self.cells().filter(move |&pos| self.is_trap(pos))
    }

    /// Every coordinate of the grid in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Coords> {
        (0..GRID_SIZE).flat_map(|y| (0..GRID_SIZE).map(move |x| Coords::new(x, y)))
    }

    /// Number of traversable neighbours of a path cell. Traps count as
    /// path, for the cell and its neighbours, only with `include_traps`.
    pub fn count_paths(&self, pos: Coords, include_traps: bool) -> Result<usize> {
        if !self.is_path(pos, include_traps) {
            return Err(MazeError::InvalidStartPosition(pos));
        }
        Ok(Direction::ALL
            .iter()
            .filter(|&&d| self.is_path(pos.neighbor(d), include_traps))
            .count())
    }

    /// Apply a step from `from`, checking every cell it passes through.
    ///
    /// Only the final cell of a trap-flagged step may be a trap.
    pub fn walk(&self, from: Coords, step: Step) -> Result<Coords> {
        for i in 1..=step.cells {
            let cell = from.offset(step.direction, i);
            let allow_trap = step.trap && i == step.cells;
            if !self.is_path(cell, allow_trap) {
                return Err(MazeError::BlockedMove {
                    from,
                    step,
                    blocked: cell,
                });
            }
        }
        Ok(from.offset(step.direction, step.cells))
    }

    /// Snapshot with the trap at `pos` turned into open floor.
    pub fn without_trap(&self, pos: Coords) -> Grid {
        let mut grid = self.clone();
        if grid.is_trap(pos) {
            grid.set_tile(pos, Tile::Open);
        }
        grid
    }

    /// Snapshot with every trap turned into open floor.
    pub fn without_traps(&self) -> Grid {
        let mut grid = self.clone();
        let traps: Vec<Coords> = self.traps().collect();
        for pos in traps {
            grid.set_tile(pos, Tile::Open);
        }
        grid
    }

    pub(crate) fn set_tile(&mut self, pos: Coords, tile: Tile) {
        if let Some(i) = pos.index() {
            Rc::make_mut(&mut self.tiles)[i] = tile;
        }
    }

    pub(crate) fn set_endpoints(&mut self, start: Coords, escape: Coords) {
        self.start = start;
        self.escape = escape;
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..GRID_SIZE {
            let row: Vec<String> = (0..GRID_SIZE)
                .map(|x| self.tiles[(y * GRID_SIZE + x) as usize].to_char().to_string())
                .collect();
            writeln!(f, "{}", row.join(" "))?;
        }
        Ok(())
    }
}
