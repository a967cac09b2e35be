//! Maze difficulty levels and classification.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::MazeError;
use crate::maze::Grid;
use crate::solver::solve_without_traps;

/// Declared or classified difficulty; also selects the solver tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Difficulty {
    /// Solvable without touching a trap
    Level1,
    /// Has traps, solvable once they are cleared
    Level2,
    /// Needs rotations, or is blocked outright
    Level3,
}

impl Difficulty {
    pub fn number(self) -> u8 {
        match self {
            Difficulty::Level1 => 1,
            Difficulty::Level2 => 2,
            Difficulty::Level3 => 3,
        }
    }

    /// The next stronger tier.
    pub fn next(self) -> Option<Difficulty> {
        match self {
            Difficulty::Level1 => Some(Difficulty::Level2),
            Difficulty::Level2 => Some(Difficulty::Level3),
            Difficulty::Level3 => None,
        }
    }
}

impl TryFrom<u8> for Difficulty {
    type Error = MazeError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        match level {
            1 => Ok(Difficulty::Level1),
            2 => Ok(Difficulty::Level2),
            3 => Ok(Difficulty::Level3),
            other => Err(MazeError::malformed(format!(
                "difficulty level {} is not 1, 2 or 3",
                other
            ))),
        }
    }
}

impl From<Difficulty> for u8 {
    fn from(level: Difficulty) -> u8 {
        level.number()
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "level {}", self.number())
    }
}

/// Classify a maze by trying to escape a trap-cleared copy of it.
pub fn classify(grid: &Grid) -> Difficulty {
    if solve_without_traps(&grid.without_traps(), None).is_none() {
        Difficulty::Level3
    } else if grid.has_traps() {
        Difficulty::Level2
    } else {
        Difficulty::Level1
    }
}
