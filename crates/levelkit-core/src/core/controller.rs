//! Controller capability trait
//!
//! Defines the narrow command surface the leveling workflow needs from a
//! machine controller: transmit G-code and load a named program.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;

/// Commands sent to the machine collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MachineCommand {
    /// Transmit a single line of G-code
    Gcode(String),
    /// Load a complete program under a name, replacing the current one
    LoadProgram {
        /// Program name shown by the host
        name: String,
        /// Program text, newline separated
        gcode: String,
    },
}

impl MachineCommand {
    /// Short command kind, as used on the host's command channel
    pub fn kind(&self) -> &'static str {
        match self {
            MachineCommand::Gcode(_) => "gcode",
            MachineCommand::LoadProgram { .. } => "gcode:load",
        }
    }
}

impl fmt::Display for MachineCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MachineCommand::Gcode(line) => write!(f, "gcode: {}", line),
            MachineCommand::LoadProgram { name, gcode } => {
                write!(f, "gcode:load {} ({} lines)", name, gcode.lines().count())
            }
        }
    }
}

/// Capability handle for the machine controller
///
/// Implementations must not block: the call hands the command to the
/// transport and returns.
#[async_trait]
pub trait MachineController: Send + Sync {
    /// Send a command to the controller
    async fn send_command(&self, command: MachineCommand) -> Result<()>;
}

/// Controller that accepts and discards every command
#[derive(Debug, Default, Clone)]
pub struct NoOpController;

impl NoOpController {
    /// Create a new no-op controller
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MachineController for NoOpController {
    async fn send_command(&self, command: MachineCommand) -> Result<()> {
        tracing::trace!("Discarding {}", command);
        Ok(())
    }
}
