//! Error taxonomy for the maze engine.
//!
//! Search failures are not errors: an unsolvable maze is reported as a
//! missing branch, and an exhausted time budget as a flag on the outcome.
//! The variants here cover precondition violations and malformed input.

use thiserror::Error;

use crate::maze::Coords;
use crate::branch::Step;

#[derive(Error, Debug)]
pub enum MazeError {
    #[error("cannot generate moves from non-path cell {0}")]
    InvalidStartPosition(Coords),

    #[error("move {step} from {from} runs into blocked cell {blocked}")]
    BlockedMove {
        from: Coords,
        step: Step,
        blocked: Coords,
    },

    #[error("malformed maze: {reason}")]
    MalformedMaze { reason: String },

    #[error("invalid maze JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read maze: {0}")]
    Io(#[from] std::io::Error),
}

impl MazeError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        MazeError::MalformedMaze {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MazeError>;
