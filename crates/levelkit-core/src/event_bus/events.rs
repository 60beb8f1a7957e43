//! Event type definitions for the event bus.
//!
//! Inbound events describe what the machine collaborator observed; outbound
//! events describe leveling progress. Both are plain cloneable values so
//! they can cross channels and be logged or replayed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::data::{BoundingBox, MachineState, Point3};

/// Root event enum for all application events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AppEvent {
    /// Events emitted by the machine collaborator
    Machine(MachineEvent),
    /// Leveling progress notifications
    Leveling(LevelingEvent),
}

impl AppEvent {
    /// Get a short description of this event for logging
    pub fn description(&self) -> String {
        match self {
            AppEvent::Machine(e) => e.description(),
            AppEvent::Leveling(e) => e.description(),
        }
    }
}

/// Events delivered by the machine collaborator
///
/// This is the complete set of inbound notifications the leveling workflow
/// reacts to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MachineEvent {
    /// A program was loaded into the host.
    ProgramLoaded {
        /// Program name.
        name: String,
        /// Program text.
        gcode: String,
    },
    /// The loaded program was unloaded.
    ProgramUnloaded,
    /// A port was opened.
    PortOpened {
        /// Serial port path.
        port: String,
    },
    /// The port was closed.
    PortClosed {
        /// Serial port path.
        port: String,
    },
    /// Controller state changed (modal units, positions).
    StateChanged {
        /// Controller type, e.g. "Grbl".
        controller: String,
        /// Reported state; absent fields are unchanged.
        state: MachineState,
    },
    /// Controller settings changed.
    SettingsChanged {
        /// Controller type, e.g. "Grbl".
        controller: String,
        /// Settings keyed by name, e.g. "$13".
        settings: BTreeMap<String, String>,
    },
    /// A raw line was received from the controller.
    LineReceived {
        /// The received line, without line terminator.
        line: String,
    },
}

impl MachineEvent {
    fn description(&self) -> String {
        match self {
            MachineEvent::ProgramLoaded { name, gcode } => {
                format!("Program loaded: {} ({} lines)", name, gcode.lines().count())
            }
            MachineEvent::ProgramUnloaded => "Program unloaded".to_string(),
            MachineEvent::PortOpened { port } => format!("Port opened: {}", port),
            MachineEvent::PortClosed { port } => format!("Port closed: {}", port),
            MachineEvent::StateChanged { controller, .. } => {
                format!("{} state changed", controller)
            }
            MachineEvent::SettingsChanged {
                controller,
                settings,
            } => format!("{} settings changed ({} values)", controller, settings.len()),
            MachineEvent::LineReceived { line } => format!("Received: {}", line),
        }
    }
}

/// Leveling progress notifications
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LevelingEvent {
    /// A program's XY extent was measured.
    BoundsMeasured {
        /// Program name.
        program: String,
        /// Extent in millimeters, or `None` when no motion was found.
        bounds: Option<BoundingBox>,
    },
    /// A probing run started.
    ProbingStarted {
        /// Number of probe points planned.
        planned: usize,
    },
    /// A probe point was recorded.
    PointProbed {
        /// Zero-based index of the point.
        index: usize,
        /// Number of probe points planned.
        planned: usize,
        /// Recorded point (mm): X/Y in work coordinates, Z above the first point.
        point: Point3,
    },
    /// All planned points were recorded.
    MeshCompleted {
        /// Number of points in the mesh.
        points: usize,
    },
    /// The rewritten program was handed back to the controller.
    ProgramCompensated {
        /// Name of the rewritten program.
        name: String,
        /// Number of motion lines emitted with corrected Z.
        compensated: usize,
        /// Number of points left uncorrected because the mesh could not interpolate.
        fallbacks: usize,
        /// Number of incremental-mode lines passed through uncorrected.
        incremental_lines: usize,
    },
    /// The probing session was abandoned.
    SessionCancelled {
        /// Why the session was cancelled.
        reason: String,
    },
}

impl LevelingEvent {
    fn description(&self) -> String {
        match self {
            LevelingEvent::BoundsMeasured { program, bounds } => match bounds {
                Some(b) => format!("Bounds of {}: {}", program, b),
                None => format!("No motion found in {}", program),
            },
            LevelingEvent::ProbingStarted { planned } => {
                format!("Probing started ({} points)", planned)
            }
            LevelingEvent::PointProbed {
                index,
                planned,
                point,
            } => format!("Probed point {}/{}: {}", index + 1, planned, point),
            LevelingEvent::MeshCompleted { points } => {
                format!("Mesh completed with {} points", points)
            }
            LevelingEvent::ProgramCompensated {
                name,
                compensated,
                fallbacks,
                ..
            } => format!(
                "Compensated {} ({} moves, {} uncorrected)",
                name, compensated, fallbacks
            ),
            LevelingEvent::SessionCancelled { reason } => {
                format!("Probing cancelled: {}", reason)
            }
        }
    }
}
