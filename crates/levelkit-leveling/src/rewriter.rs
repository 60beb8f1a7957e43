//! G-code compensation rewriter
//!
//! Re-emits a program with every absolute move's Z shifted by the height
//! mesh. Long linear moves are split so the correction follows the surface
//! between probe points. Lines that probe, dwell or touch coordinate
//! systems, lines without coordinates, and anything in incremental mode are
//! copied unchanged.

use levelkit_core::units::format_length;
use levelkit_core::{Point3, Units};
use levelkit_gcode::{Block, ModalState};
use serde::{Deserialize, Serialize};

use crate::error::MeshError;
use crate::mesh::HeightMesh;

/// Codes whose lines are never altered (G38.x, G5.x, G10, G4, G92, G92.1)
const PASSTHROUGH_CODES: [u32; 5] = [38, 5, 10, 4, 92];

const COORDINATE_LETTERS: [char; 3] = ['X', 'Y', 'Z'];

/// Split the segment `from -> to` into pieces no longer than `max_length`
///
/// Both endpoints are included. A zero-length move yields just `to`.
pub fn subdivide(from: Point3, to: Point3, max_length: f64) -> Vec<Point3> {
    let delta = to.sub(&from);
    let distance = delta.length();
    if distance <= f64::EPSILON {
        return vec![to];
    }
    if max_length <= 0.0 || distance <= max_length {
        return vec![from, to];
    }

    let direction = delta.scale(1.0 / distance);
    let mut points = vec![from];
    let mut travelled = max_length;
    while travelled < distance - 1e-9 {
        points.push(from.add(&direction.scale(travelled)));
        travelled += max_length;
    }
    points.push(to);
    points
}

/// Counters describing one rewrite pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteReport {
    /// Source lines whose coordinates were rewritten
    pub compensated: usize,
    /// Motion lines emitted for them
    pub emitted: usize,
    /// Emitted points left at their original Z because the mesh could not answer
    pub fallbacks: usize,
    /// Coordinate lines copied unchanged because of G91
    pub incremental_lines: usize,
}

/// A rewritten program and what happened while producing it
#[derive(Debug, Clone, PartialEq)]
pub struct RewriteOutput {
    pub gcode: String,
    pub report: RewriteReport,
}

/// Arcs keep their center words and are only corrected at the endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MotionMode {
    Linear,
    Arc,
}

/// Per-pass interpreter state
struct Pass {
    modal: ModalState,
    motion: MotionMode,
    current: Point3,
    previous: Option<Point3>,
    report: RewriteReport,
    first_error: Option<MeshError>,
}

/// Rewrites programs against a height mesh
#[derive(Debug, Clone)]
pub struct CompensationRewriter<'a> {
    mesh: &'a HeightMesh,
    delta: f64,
    annotate: bool,
}

impl<'a> CompensationRewriter<'a> {
    /// Create a rewriter for `mesh` with probe spacing `delta` (millimeters)
    ///
    /// Linear moves are split into pieces of at most `delta / 2`.
    pub fn new(mesh: &'a HeightMesh, delta: f64) -> Self {
        Self {
            mesh,
            delta,
            annotate: true,
        }
    }

    /// Whether to append `; Z<original>` to rewritten moves
    pub fn with_annotation(mut self, annotate: bool) -> Self {
        self.annotate = annotate;
        self
    }

    /// Rewrite a whole program
    pub fn rewrite(&self, gcode: &str) -> RewriteOutput {
        let mut pass = Pass {
            modal: ModalState::new(),
            motion: MotionMode::Linear,
            current: Point3::default(),
            previous: None,
            report: RewriteReport::default(),
            first_error: None,
        };

        let mut out: Vec<String> = Vec::with_capacity(gcode.lines().count());
        for line in gcode.lines() {
            self.rewrite_line(&mut pass, line, &mut out);
        }

        let report = pass.report;
        if report.incremental_lines > 0 {
            tracing::warn!(
                "{} incremental (G91) lines were not compensated",
                report.incremental_lines
            );
        }
        if let Some(err) = pass.first_error {
            tracing::warn!(
                "{} points kept their original Z: {}",
                report.fallbacks,
                err
            );
        }
        tracing::info!(
            "Compensated {} lines into {} moves",
            report.compensated,
            report.emitted
        );

        let mut gcode_out = out.join("\n");
        if gcode.ends_with('\n') {
            gcode_out.push('\n');
        }
        RewriteOutput {
            gcode: gcode_out,
            report,
        }
    }

    fn rewrite_line(&self, pass: &mut Pass, line: &str, out: &mut Vec<String>) {
        let block = Block::parse(line);

        if PASSTHROUGH_CODES.iter().any(|&code| block.has_g_family(code)) {
            out.push(line.to_string());
            return;
        }

        let units_before = pass.modal.units;
        pass.modal.apply(&block);
        if pass.modal.units != units_before {
            pass.current = pass.current.convert(units_before, pass.modal.units);
            pass.previous = pass
                .previous
                .map(|p| p.convert(units_before, pass.modal.units));
        }
        for code in block.codes() {
            if code.is_g(0) || code.is_g(1) {
                pass.motion = MotionMode::Linear;
            } else if code.is_g(2) || code.is_g(3) {
                pass.motion = MotionMode::Arc;
            }
        }

        if !block.has_any(&COORDINATE_LETTERS) {
            out.push(line.to_string());
            return;
        }

        if !pass.modal.absolute {
            tracing::debug!("Incremental move left uncompensated: {}", line.trim());
            pass.report.incremental_lines += 1;
            pass.previous = None;
            out.push(line.to_string());
            return;
        }

        let target = Point3::new(
            block.operand('X').unwrap_or(pass.current.x),
            block.operand('Y').unwrap_or(pass.current.y),
            block.operand('Z').unwrap_or(pass.current.z),
        );
        pass.current = target;
        let rest = block.without_words(&COORDINATE_LETTERS);

        let points = match (pass.previous, pass.motion) {
            (Some(previous), MotionMode::Linear) => {
                let max_length = pass.modal.units.from_mm(self.delta / 2.0);
                subdivide(previous, target, max_length)
            }
            _ => vec![target],
        };

        for point in points {
            out.push(self.emit(pass, &rest, point));
        }
        pass.report.compensated += 1;
        pass.previous = Some(target);
    }

    fn emit(&self, pass: &mut Pass, rest: &str, point: Point3) -> String {
        let corrected = match self.mesh.compensate(point, pass.modal.units) {
            Ok(corrected) => corrected,
            Err(err) => {
                pass.report.fallbacks += 1;
                pass.first_error.get_or_insert(err);
                point
            }
        };
        pass.report.emitted += 1;

        let mut line = format!(
            "{} X{} Y{} Z{}",
            rest,
            format_length(corrected.x),
            format_length(corrected.y),
            format_length(corrected.z)
        );
        if self.annotate {
            line.push_str(&format!(" ; Z{}", format_length(point.z)));
        }
        line.trim().to_string()
    }
}

/// Rewrite `gcode` against `mesh` with probe spacing `delta` (millimeters)
pub fn compensate_program(mesh: &HeightMesh, delta: f64, gcode: &str) -> RewriteOutput {
    CompensationRewriter::new(mesh, delta).rewrite(gcode)
}

/// Units in effect at the end of a program
pub fn final_units(gcode: &str) -> Units {
    let mut modal = ModalState::new();
    for line in gcode.lines() {
        modal.apply(&Block::parse(line));
    }
    modal.units
}
