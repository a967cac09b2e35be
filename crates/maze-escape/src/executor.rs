//! Literal script execution with metrics tracking.
//!
//! Runs an action sequence exactly as an external executor would: cell by
//! cell, firing traps, turning regions. Used to check that a solver plan
//! really escapes and costs what the solver claims.

use crate::branch::{Action, Branch, ROTATION_COST};
use crate::maze::{Coords, Grid, Tile};
use crate::rotation::rotate;

/// Result status of script execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStatus {
    /// Agent reached the escape cell
    Escaped,
    /// Script ended without reaching the escape
    Stranded,
    /// A move ran into a wall or off the grid
    Blocked { at: Coords },
    /// A rotation turned the region the agent stands in
    InvalidRotation,
}

/// Metrics collected during execution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionMetrics {
    pub cost: u32,
    pub moves: usize,
    pub rotations: usize,
    pub traps_fired: usize,
    pub cells_walked: u32,
}

/// Result of running a script
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub status: ExecutionStatus,
    pub metrics: ExecutionMetrics,
    pub position: Coords,
    pub escaped: bool,
}

/// Execute a script on a private copy of `grid`.
pub fn execute(grid: &Grid, actions: &[Action]) -> ExecutionResult {
    let mut grid = grid.clone();
    let mut position = grid.start();
    let mut metrics = ExecutionMetrics::default();

    let finish = |status: ExecutionStatus, metrics: ExecutionMetrics, position: Coords| ExecutionResult {
        status,
        metrics,
        position,
        escaped: status == ExecutionStatus::Escaped,
    };

    for action in actions {
        match action {
            Action::Move(step) => {
                metrics.moves += 1;
                for _ in 0..step.cells {
                    let next = position.neighbor(step.direction);
                    if !grid.is_path(next, true) {
                        return finish(ExecutionStatus::Blocked { at: next }, metrics, position);
                    }

                    position = next;
                    metrics.cells_walked += 1;
                    metrics.cost += 1;

                    if position == grid.escape() {
                        return finish(ExecutionStatus::Escaped, metrics, position);
                    }

                    if grid.is_trap(position) {
                        // One-shot: the trap is spent and the agent restarts.
                        grid.set_tile(position, Tile::Open);
                        position = grid.start();
                        metrics.traps_fired += 1;
                        break;
                    }
                }
            }

            Action::Rotate(rotation) => {
                if rotation.region.contains(position) {
                    return finish(ExecutionStatus::InvalidRotation, metrics, position);
                }
                grid = rotate(&grid, *rotation);
                metrics.rotations += 1;
                metrics.cost += ROTATION_COST;
            }
        }
    }

    finish(ExecutionStatus::Stranded, metrics, position)
}

/// Does the branch's plan escape `grid` at exactly the branch's cost?
pub fn verify_solution(grid: &Grid, branch: &Branch) -> bool {
    let result = execute(grid, branch.actions());
    result.escaped && result.metrics.cost == branch.cost()
}
