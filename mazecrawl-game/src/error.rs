//! Errors that abort session construction.
use thiserror::Error;

/// Fatal failures raised while building a maze or a session around it.
///
/// Walking into a wall is not an error; see `MoveOutcome::blocked`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MazeError {
    #[error("maze dimensions {width}x{height} invalid: both must be odd and at least {min}")]
    InvalidDimensions {
        width: usize,
        height: usize,
        min: usize,
    },
    #[error(
        "cannot place {requested} collectibles: only {available} open cells besides start and goal"
    )]
    PlacementExhausted { requested: usize, available: usize },
    #[error("difficulty preset table invalid: {reason}")]
    InvalidPreset { reason: String },
}
