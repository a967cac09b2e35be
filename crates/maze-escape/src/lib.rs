//! Escape planner for fixed-size mazes with one-shot traps and rotating
//! regions.
//!
//! This crate computes a cheap sequence of moves and region rotations that
//! takes an agent from the start cell to the escape cell, using a
//! branch-and-bound search in three tiers of increasing strength.

pub mod branch;
pub mod difficulty;
pub mod error;
pub mod executor;
pub mod maze;
pub mod moves;
pub mod regions;
pub mod rotation;
pub mod solver;

// Re-export main types
pub use branch::{Action, Branch, Step, ROTATION_COST};
pub use difficulty::{classify, Difficulty};
pub use error::{MazeError, Result};
pub use executor::{execute, verify_solution, ExecutionMetrics, ExecutionResult, ExecutionStatus};
pub use maze::{CellRef, Coords, Direction, Grid, MazeDescription, Tile, GRID_SIZE};
pub use moves::{checked_useful_moves, useful_moves};
pub use regions::{between, region_of, RegionId};
pub use rotation::{rotate, Rotation, RotationSense};
pub use solver::{
    solve, solve_escalating, solve_without_traps, SearchStats, SolveOutcome, SolverConfig,
};
