//! Probe grid planning
//!
//! Expands a program's extent by the configured margin, lays an evenly
//! spaced raster over it and produces the probe program that visits the
//! points in the same order. Responses are matched to points purely by
//! arrival order, so [`ProbeGrid::waypoints`] and the emitted program must
//! never disagree.

use levelkit_core::units::format_length;
use levelkit_core::{BoundingBox, Point2};
use levelkit_settings::AutolevelSettings;
use serde::{Deserialize, Serialize};

/// Smallest probe spacing laid out, millimeters
const MIN_DELTA: f64 = 1.0;

/// Number of intervals along one axis
///
/// Zero only when the span itself is zero; otherwise at least one, so the
/// spacing always divides the span evenly.
fn axis_steps(span: f64, delta: f64) -> usize {
    if !span.is_finite() || span <= 0.0 {
        0
    } else {
        ((span / delta.max(MIN_DELTA)).floor() as usize).max(1)
    }
}

fn axis_position(min: f64, max: f64, spacing: f64, index: usize, steps: usize) -> f64 {
    if index == steps {
        max
    } else {
        min + index as f64 * spacing
    }
}

/// An evenly spaced raster of probe points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeGrid {
    /// The probed area (program extent plus margin)
    pub area: BoundingBox,
    /// Intervals along X
    pub steps_x: usize,
    /// Intervals along Y
    pub steps_y: usize,
    /// Distance between columns
    pub spacing_x: f64,
    /// Distance between rows
    pub spacing_y: f64,
    /// Points in probing order; the first is the Z reference
    pub waypoints: Vec<Point2>,
}

impl ProbeGrid {
    /// Number of probe reports a run over this grid expects
    pub fn planned_count(&self) -> usize {
        self.waypoints.len()
    }

    /// The reference point probed first
    pub fn origin(&self) -> Point2 {
        self.area.min
    }
}

/// Turns a program extent into a probe grid and probe program
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeGridPlanner {
    margin: f64,
    z_safe: f64,
    delta: f64,
    feedrate: f64,
}

impl Default for ProbeGridPlanner {
    fn default() -> Self {
        Self::new(&AutolevelSettings::default())
    }
}

impl ProbeGridPlanner {
    /// Create a planner from the probing parameters
    ///
    /// A spacing below 1 mm and a negative margin are clamped.
    pub fn new(settings: &AutolevelSettings) -> Self {
        if settings.delta.is_nan() || settings.delta < MIN_DELTA {
            tracing::warn!(
                "Probe spacing {} is below {} mm; using {} mm",
                settings.delta,
                MIN_DELTA,
                MIN_DELTA
            );
        }
        let margin = if settings.margin.is_finite() {
            settings.margin.max(0.0)
        } else {
            0.0
        };
        Self {
            margin,
            z_safe: settings.z_safe,
            delta: settings.delta.max(MIN_DELTA),
            feedrate: settings.feedrate,
        }
    }

    /// Lay the grid over `bounds` (millimeters)
    ///
    /// Rows run from `ymin` to `ymax`, each scanned from `xmin` to `xmax`.
    /// The `(xmin, ymin)` corner comes first and appears exactly once.
    pub fn plan(&self, bounds: &BoundingBox) -> ProbeGrid {
        let area = bounds.expand(self.margin);
        let steps_x = axis_steps(area.width(), self.delta);
        let steps_y = axis_steps(area.height(), self.delta);
        let spacing_x = if steps_x == 0 { 0.0 } else { area.width() / steps_x as f64 };
        let spacing_y = if steps_y == 0 { 0.0 } else { area.height() / steps_y as f64 };

        let mut waypoints = Vec::with_capacity((steps_x + 1) * (steps_y + 1));
        for row in 0..=steps_y {
            let y = axis_position(area.min.y, area.max.y, spacing_y, row, steps_y);
            for col in 0..=steps_x {
                let x = axis_position(area.min.x, area.max.x, spacing_x, col, steps_x);
                waypoints.push(Point2::new(x, y));
            }
        }

        tracing::debug!(
            "Planned {} probe points ({} x {} intervals, spacing {:.3} x {:.3})",
            waypoints.len(),
            steps_x,
            steps_y,
            spacing_x,
            spacing_y
        );

        ProbeGrid {
            area,
            steps_x,
            steps_y,
            spacing_x,
            spacing_y,
            waypoints,
        }
    }

    /// The probe program for `grid`, one G-code line per entry
    ///
    /// The first point is probed at half feed and becomes work Z zero.
    pub fn probe_program(&self, grid: &ProbeGrid) -> Vec<String> {
        let z_safe = self.z_safe;
        let plunge = z_safe + 1.0;
        let mut code = Vec::with_capacity(8 + grid.waypoints.len().saturating_sub(1) * 3);

        let Some((origin, rest)) = grid.waypoints.split_first() else {
            return code;
        };

        code.push("(AL: probing initial point)".to_string());
        code.push("G21".to_string());
        code.push("G90".to_string());
        code.push(format!("G0 Z{}", z_safe));
        code.push(format!(
            "G0 X{} Y{} Z{}",
            format_length(origin.x),
            format_length(origin.y),
            z_safe
        ));
        code.push(format!("G38.2 Z-{} F{}", plunge, self.feedrate / 2.0));
        code.push("G10 L20 P1 Z0".to_string());
        code.push(format!("G0 Z{}", z_safe));

        for point in rest {
            code.push(format!(
                "G90 G0 X{} Y{} Z{}",
                format_length(point.x),
                format_length(point.y),
                z_safe
            ));
            code.push(format!("G38.2 Z-{} F{}", plunge, self.feedrate));
            code.push(format!("G0 Z{}", z_safe));
        }

        code
    }
}
