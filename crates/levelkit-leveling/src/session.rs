//! Probe session state machine
//!
//! A session collects one probed point per planned waypoint, in arrival
//! order. Probe reports share the line stream with ordinary controller
//! chatter, so anything that does not parse as a probe report is ignored.
//!
//! Heights are kept relative to the first collected point. Reports carry
//! machine Z, and the probe program re-zeroes work Z after the first point,
//! so the work offset cannot be trusted for Z across a run; X and Y go
//! through the work offset as reported.
//!
//! ```text
//! Idle --start--> Active --last report--> Complete
//!                   |
//!                   +--cancel--> Idle
//! ```

use levelkit_communication::{GrblResponseParser, ProbeReport};
use levelkit_core::{Point3, Units};
use serde::{Deserialize, Serialize};

/// Lifecycle of a probing run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionState {
    /// No run in progress
    #[default]
    Idle,
    /// Waiting for probe reports
    Active,
    /// All planned points were collected
    Complete,
}

/// What a received line did to the session
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    /// Not a probe report, or the session was not collecting
    Ignored,
    /// A point was recorded and more are expected
    Recorded {
        /// Zero-based position of the point in the run
        index: usize,
        /// The point, millimeters, Z relative to the first point
        point: Point3,
    },
    /// The last planned point arrived; the whole mesh is handed off
    Completed(Vec<Point3>),
}

/// Accumulates probed points for one run
#[derive(Debug, Clone, Default)]
pub struct ProbeSession {
    state: SessionState,
    planned: usize,
    collected: Vec<Point3>,
    report_units: Units,
    /// Machine Z of the first collected point, report units
    reference_z: Option<f64>,
}

impl ProbeSession {
    /// Create an idle session
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a run expecting `planned` reports in `report_units`
    ///
    /// Any points from a previous run are discarded.
    pub fn start(&mut self, planned: usize, report_units: Units) {
        if planned == 0 {
            tracing::warn!("Probe session started with nothing planned");
        }
        self.state = SessionState::Active;
        self.planned = planned;
        self.collected = Vec::with_capacity(planned);
        self.report_units = report_units;
        self.reference_z = None;
    }

    /// Feed one line from the controller
    ///
    /// `work_offset` is subtracted from the reported X and Y and must be in
    /// the same units as the report.
    pub fn on_probe_response(&mut self, line: &str, work_offset: Point3) -> ProbeOutcome {
        if self.state != SessionState::Active {
            return ProbeOutcome::Ignored;
        }
        match GrblResponseParser::parse_probe(line) {
            Some(report) => self.record(report, work_offset),
            None => ProbeOutcome::Ignored,
        }
    }

    /// Record an already parsed probe report
    pub fn record(&mut self, report: ProbeReport, work_offset: Point3) -> ProbeOutcome {
        if self.state != SessionState::Active || self.collected.len() >= self.planned {
            tracing::debug!("Dropping probe report outside an active run");
            return ProbeOutcome::Ignored;
        }
        if !report.success {
            tracing::warn!(
                "Probe did not make contact near {}; point not recorded",
                report.position
            );
            return ProbeOutcome::Ignored;
        }

        let position = report.position;
        let reference_z = *self.reference_z.get_or_insert(position.z);
        let point = Point3::new(
            position.x - work_offset.x,
            position.y - work_offset.y,
            position.z - reference_z,
        )
        .convert(self.report_units, Units::MM);
        let index = self.collected.len();
        self.collected.push(point);
        tracing::info!("Probed point {}/{}: {}", index + 1, self.planned, point);

        if self.collected.len() == self.planned {
            self.state = SessionState::Complete;
            self.planned = 0;
            return ProbeOutcome::Completed(std::mem::take(&mut self.collected));
        }

        ProbeOutcome::Recorded { index, point }
    }

    /// Abandon the run, returning how many points were discarded
    pub fn cancel(&mut self) -> usize {
        let discarded = self.collected.len();
        if self.state == SessionState::Active {
            tracing::warn!(
                "Probe session cancelled after {}/{} points",
                discarded,
                self.planned
            );
        }
        self.state = SessionState::Idle;
        self.planned = 0;
        self.collected.clear();
        self.reference_z = None;
        discarded
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether the session is collecting
    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    /// Reports expected by the current run
    pub fn planned(&self) -> usize {
        self.planned
    }

    /// Points collected so far, millimeters, Z relative to the first point
    pub fn collected(&self) -> &[Point3] {
        &self.collected
    }
}

/// Collect every successful probe report from a saved controller log
///
/// Returns the points in millimeters, X and Y in work coordinates and Z
/// relative to the first report.
pub fn replay_probe_log(log: &str, work_offset: Point3, report_units: Units) -> Vec<Point3> {
    let expected = log
        .lines()
        .filter_map(GrblResponseParser::parse_probe)
        .filter(|report| report.success)
        .count();

    let mut session = ProbeSession::new();
    session.start(expected, report_units);
    for line in log.lines() {
        if let ProbeOutcome::Completed(points) = session.on_probe_response(line, work_offset) {
            return points;
        }
    }
    Vec::new()
}
