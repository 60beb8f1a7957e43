//! Firmware implementations
//!
//! Only GRBL-family controllers report probe results in the
//! `[PRB:x,y,z:status]` form the leveling workflow consumes.

pub mod grbl;

/// Supported CNC controller types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControllerType {
    /// GRBL (default, most common)
    #[default]
    Grbl,
    /// grblHAL (enhanced GRBL with additional features)
    GrblHal,
}

impl std::fmt::Display for ControllerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Grbl => write!(f, "Grbl"),
            Self::GrblHal => write!(f, "grblHAL"),
        }
    }
}
