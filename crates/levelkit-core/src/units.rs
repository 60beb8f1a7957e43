//! Unit conversion utilities
//!
//! Handles conversion between Metric (mm) and Imperial (inch) systems.
//! Coordinates never carry their unit; the active system is tracked by
//! whoever holds the value (modal state, report settings).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Millimeters per inch
pub const MM_PER_INCH: f64 = 25.4;

/// Machine coordinate units (millimeters or inches)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    /// Millimeters (G21)
    #[default]
    MM,
    /// Inches (G20)
    INCH,
}

impl Units {
    /// Convert a value from one unit to another
    pub fn convert(value: f64, from: Units, to: Units) -> f64 {
        match (from, to) {
            (Units::MM, Units::INCH) => value / MM_PER_INCH,
            (Units::INCH, Units::MM) => value * MM_PER_INCH,
            _ => value,
        }
    }

    /// Convert a value expressed in these units to millimeters
    pub fn to_mm(self, value: f64) -> f64 {
        Self::convert(value, self, Units::MM)
    }

    /// Convert a millimeter value into these units
    pub fn from_mm(self, value_mm: f64) -> f64 {
        Self::convert(value_mm, Units::MM, self)
    }

    /// Units selected by a G20/G21 modal code, if it is one
    pub fn from_gcode(code: u32) -> Option<Self> {
        match code {
            20 => Some(Units::INCH),
            21 => Some(Units::MM),
            _ => None,
        }
    }

    /// The G-code word selecting these units
    pub fn gcode(self) -> &'static str {
        match self {
            Units::MM => "G21",
            Units::INCH => "G20",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Units::MM => write!(f, "mm"),
            Units::INCH => write!(f, "in"),
        }
    }
}

impl FromStr for Units {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mm" | "metric" | "g21" => Ok(Self::MM),
            "in" | "inch" | "imperial" | "g20" => Ok(Self::INCH),
            _ => Err(format!("Unknown units: {}", s)),
        }
    }
}

/// Format a length for G-code output with three decimals
pub fn format_length(value: f64) -> String {
    // anything that rounds to zero would otherwise print as "-0.000"
    let value = if value.abs() < 0.0005 { 0.0 } else { value };
    format!("{:.3}", value)
}
