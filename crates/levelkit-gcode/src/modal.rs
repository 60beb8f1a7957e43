//! Modal state tracking
//!
//! Only the two modal groups that matter for Z compensation are tracked:
//! distance mode (G90/G91) and units (G20/G21).

use levelkit_core::Units;
use serde::{Deserialize, Serialize};

use crate::parser::Block;

/// Interpreter context carried from line to line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModalState {
    /// Absolute (G90) when true, incremental (G91) when false
    pub absolute: bool,
    /// Active units (G20/G21)
    pub units: Units,
}

impl Default for ModalState {
    fn default() -> Self {
        Self {
            absolute: true,
            units: Units::MM,
        }
    }
}

impl ModalState {
    /// Create a new modal state (G90, G21)
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the modal codes of a line
    ///
    /// When a line carries conflicting codes of one group, the last one wins,
    /// as it would on the controller.
    pub fn apply(&mut self, block: &Block) {
        for code in block.codes() {
            if code.is_g(90) {
                self.absolute = true;
            } else if code.is_g(91) {
                self.absolute = false;
            } else if code.letter == 'G' && code.minor.is_none() {
                if let Some(units) = Units::from_gcode(code.major) {
                    self.units = units;
                }
            }
        }
    }
}
