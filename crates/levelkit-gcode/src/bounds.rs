//! Program extent measurement
//!
//! Scans motion and probe lines (G0, G1, G2, G3, G38.x) and tracks the
//! running minimum and maximum of their X and Y operands. Values are
//! converted to millimeters using the program's own G20/G21 state.

use levelkit_core::{BoundingBox, Point2, Units};

use crate::modal::ModalState;
use crate::parser::Block;

const MOTION_CODES: [u32; 5] = [0, 1, 2, 3, 38];

/// Running min/max of one axis; `None` until a value is seen
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct AxisRange(Option<(f64, f64)>);

impl AxisRange {
    fn include(&mut self, value: f64) {
        self.0 = Some(match self.0 {
            Some((min, max)) => (min.min(value), max.max(value)),
            None => (value, value),
        });
    }
}

/// Incremental XY extent accumulator
#[derive(Debug, Clone, Default)]
pub struct BoundsExtractor {
    x: AxisRange,
    y: AxisRange,
    modal: ModalState,
    lines_used: usize,
}

impl BoundsExtractor {
    /// Create an empty extractor
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line of G-code
    pub fn feed_line(&mut self, line: &str) {
        let block = Block::parse(line);
        self.modal.apply(&block);

        let qualifies = block
            .command()
            .is_some_and(|c| c.letter == 'G' && MOTION_CODES.contains(&c.major));
        if !qualifies {
            return;
        }

        let units = self.modal.units;
        let mut used = false;
        for word in block.words() {
            match word.letter {
                'X' => {
                    self.x.include(units.to_mm(word.value));
                    used = true;
                }
                'Y' => {
                    self.y.include(units.to_mm(word.value));
                    used = true;
                }
                _ => {}
            }
        }
        if used {
            self.lines_used += 1;
        }
    }

    /// Number of lines that contributed a coordinate
    pub fn lines_used(&self) -> usize {
        self.lines_used
    }

    /// The measured box in millimeters
    ///
    /// `None` unless both an X and a Y coordinate were seen.
    pub fn finish(&self) -> Option<BoundingBox> {
        let (xmin, xmax) = self.x.0?;
        let (ymin, ymax) = self.y.0?;
        Some(BoundingBox::new(
            Point2::new(xmin, ymin),
            Point2::new(xmax, ymax),
        ))
    }
}

/// Measure the XY extent of a whole program, in millimeters
pub fn extract_bounds(gcode: &str) -> Option<BoundingBox> {
    let mut extractor = BoundsExtractor::new();
    for line in gcode.lines() {
        extractor.feed_line(line);
    }

    let bounds = extractor.finish();
    match &bounds {
        Some(b) => tracing::info!(
            "New bounds: xmin {:.3} xmax {:.3} ymin {:.3} ymax {:.3} ({} lines)",
            b.min.x,
            b.max.x,
            b.min.y,
            b.max.y,
            extractor.lines_used()
        ),
        None => tracing::warn!("No X/Y motion found; program extent is undefined"),
    }
    bounds
}

/// Convert a box measured in millimeters into another unit system
pub fn bounds_in(bounds: &BoundingBox, units: Units) -> BoundingBox {
    BoundingBox::new(
        Point2::new(units.from_mm(bounds.min.x), units.from_mm(bounds.min.y)),
        Point2::new(units.from_mm(bounds.max.x), units.from_mm(bounds.max.y)),
    )
}
