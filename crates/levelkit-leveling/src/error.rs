//! Error types for leveling operations.

use levelkit_settings::ConfigError;
use thiserror::Error;

/// Reasons the height mesh cannot produce a correction
///
/// Both are recoverable: the rewriter keeps the uncorrected Z and counts the
/// point as a fallback.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshError {
    /// Fewer than three usable, non-collinear points
    #[error("Insufficient mesh: {points} points, need three that are not collinear")]
    InsufficientMesh { points: usize },

    /// The fitted plane is vertical
    #[error("Degenerate plane: normal has no Z component")]
    DegeneratePlane,
}

/// Errors surfaced by the autolevel workflow
#[derive(Error, Debug)]
pub enum LevelingError {
    #[error("No program loaded")]
    NoProgramLoaded,

    #[error("Loaded program has no X/Y motion")]
    NoMotionFound,

    #[error("A probing run is already active")]
    RunActive,

    #[error("Machine is not connected")]
    NotConnected,

    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Machine(#[from] levelkit_core::Error),
}

/// Result type alias for leveling operations.
pub type LevelingResult<T> = Result<T, LevelingError>;
