//! Error handling for LevelKit
//!
//! Provides error types for the layers shared across crates:
//! - Controller errors (machine collaborator related)
//! - G-Code errors (program content)

use thiserror::Error;

/// Controller error type
///
/// Represents failures reported by, or while talking to, the machine collaborator.
#[derive(Error, Debug, Clone)]
pub enum ControllerError {
    /// Command was rejected by controller
    #[error("Command rejected: {reason}")]
    CommandRejected {
        /// The reason the command was rejected.
        reason: String,
    },

    /// The outbound command channel is gone
    #[error("Command channel closed")]
    ChannelClosed,
}

/// G-Code error type
#[derive(Error, Debug, Clone)]
pub enum GcodeError {
    /// Program contains no motion that touches the XY plane
    #[error("No motion commands with X/Y coordinates found")]
    NoMotion,
}

/// Main error type for LevelKit
#[derive(Error, Debug)]
pub enum Error {
    /// Controller error
    #[error(transparent)]
    Controller(#[from] ControllerError),

    /// G-Code error
    #[error(transparent)]
    Gcode(#[from] GcodeError),
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
