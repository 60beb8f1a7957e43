//! Autolevel workflow
//!
//! Owns everything a leveling run needs: the loaded program and its extent,
//! the machine's reported position, the probe session and the settings. All
//! input arrives as [`WorkflowMessage`]s handled one at a time, and every
//! command goes out through the injected [`MachineController`].

use std::sync::Arc;
use std::time::Duration;

use levelkit_core::{
    AppEvent, BoundingBox, EventBus, LevelingEvent, MachineCommand, MachineController,
    MachineEvent, MachineState, Point3, Units,
};
use levelkit_gcode::extract_bounds;
use levelkit_settings::{AutolevelSettings, Config};
use tokio::sync::mpsc;

use crate::error::{LevelingError, LevelingResult};
use crate::mesh::HeightMesh;
use crate::planner::ProbeGridPlanner;
use crate::rewriter::{CompensationRewriter, RewriteReport};
use crate::session::{ProbeOutcome, ProbeSession};

/// GRBL setting selecting inch reports
const REPORT_INCHES_SETTING: &str = "$13";

/// Inbound work for the workflow
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowMessage {
    /// Something the machine collaborator observed
    Machine(MachineEvent),
    /// Operator asked for a probing run over the loaded program
    StartProbing,
    /// Operator changed the probing parameters
    UpdateSettings(AutolevelSettings),
}

/// A program as received from the collaborator
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedProgram {
    pub name: String,
    pub gcode: String,
}

/// The result of the last completed run
#[derive(Debug, Clone, PartialEq)]
pub struct CompensatedProgram {
    /// Name it was loaded under
    pub name: String,
    pub gcode: String,
    pub report: RewriteReport,
}

/// Positional state reported by the controller, in report units
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Positions {
    machine: Option<Point3>,
    work: Option<Point3>,
    offset: Option<Point3>,
}

impl Positions {
    fn update(&mut self, state: &MachineState) {
        if state.machine_position.is_some() {
            self.machine = state.machine_position;
        }
        if state.work_position.is_some() {
            self.work = state.work_position;
        }
        if state.work_offset.is_some() {
            self.offset = state.work_offset;
        }
    }

    /// WCO when reported, otherwise machine minus work position
    fn work_offset(&self) -> Point3 {
        if let Some(offset) = self.offset {
            return offset;
        }
        match (self.machine, self.work) {
            (Some(machine), Some(work)) => machine.sub(&work),
            _ => Point3::default(),
        }
    }
}

/// Drives bounds measurement, probing and compensation
pub struct AutolevelWorkflow<C: MachineController> {
    controller: Arc<C>,
    config: Config,
    events: Option<Arc<EventBus>>,
    session: ProbeSession,
    program: Option<LoadedProgram>,
    bounds: Option<BoundingBox>,
    port: Option<String>,
    units: Units,
    report_units: Units,
    positions: Positions,
    mesh: Option<HeightMesh>,
    output: Option<CompensatedProgram>,
}

impl<C: MachineController> AutolevelWorkflow<C> {
    /// Create a workflow sending commands through `controller`
    ///
    /// Fails when `config` does not validate.
    pub fn new(controller: Arc<C>, config: Config) -> LevelingResult<Self> {
        config.validate()?;
        Ok(Self {
            controller,
            config,
            events: None,
            session: ProbeSession::new(),
            program: None,
            bounds: None,
            port: None,
            units: Units::MM,
            report_units: Units::MM,
            positions: Positions::default(),
            mesh: None,
            output: None,
        })
    }

    /// Publish progress on `bus`
    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.events = Some(bus);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn settings(&self) -> &AutolevelSettings {
        &self.config.autolevel
    }

    pub fn session(&self) -> &ProbeSession {
        &self.session
    }

    pub fn program(&self) -> Option<&LoadedProgram> {
        self.program.as_ref()
    }

    /// Extent of the loaded program, millimeters
    pub fn bounds(&self) -> Option<BoundingBox> {
        self.bounds
    }

    pub fn is_connected(&self) -> bool {
        self.port.is_some()
    }

    /// Modal units last reported by the controller
    pub fn units(&self) -> Units {
        self.units
    }

    /// Units probe reports arrive in
    pub fn report_units(&self) -> Units {
        self.report_units
    }

    /// Offset subtracted from probe reports, in report units
    pub fn work_offset(&self) -> Point3 {
        self.positions.work_offset()
    }

    /// Mesh from the last completed run
    pub fn mesh(&self) -> Option<&HeightMesh> {
        self.mesh.as_ref()
    }

    /// Program produced by the last completed run
    pub fn output(&self) -> Option<&CompensatedProgram> {
        self.output.as_ref()
    }

    /// Replace the probing parameters
    ///
    /// Rejected while a run is active; invalid values leave the current
    /// settings in place.
    pub fn update_settings(&mut self, settings: AutolevelSettings) -> LevelingResult<()> {
        if self.session.is_active() {
            tracing::warn!("Ignoring settings change during an active probing run");
            return Err(LevelingError::RunActive);
        }
        settings.validate()?;
        self.config.autolevel = settings;
        tracing::debug!("Autolevel settings updated: {:?}", settings);
        Ok(())
    }

    /// Handle one message
    pub async fn handle(&mut self, message: WorkflowMessage) -> LevelingResult<()> {
        match message {
            WorkflowMessage::Machine(event) => self.handle_machine_event(event).await,
            WorkflowMessage::StartProbing => self.start_probing().await.map(|_| ()),
            WorkflowMessage::UpdateSettings(settings) => self.update_settings(settings),
        }
    }

    async fn handle_machine_event(&mut self, event: MachineEvent) -> LevelingResult<()> {
        match event {
            MachineEvent::ProgramLoaded { name, gcode } => {
                self.load_program(name, gcode);
                Ok(())
            }
            MachineEvent::ProgramUnloaded => {
                tracing::debug!("Program unloaded");
                self.program = None;
                self.bounds = None;
                Ok(())
            }
            MachineEvent::PortOpened { port } => {
                tracing::info!("Port opened: {}", port);
                self.port = Some(port);
                Ok(())
            }
            MachineEvent::PortClosed { port } => {
                tracing::info!("Port closed: {}", port);
                self.cancel("port closed");
                self.port = None;
                self.positions = Positions::default();
                self.units = Units::MM;
                self.report_units = Units::MM;
                Ok(())
            }
            MachineEvent::StateChanged { state, .. } => {
                if let Some(units) = state.units {
                    self.units = units;
                }
                self.positions.update(&state);
                Ok(())
            }
            MachineEvent::SettingsChanged { settings, .. } => {
                if let Some(value) = settings.get(REPORT_INCHES_SETTING) {
                    self.report_units = if value.trim() == "1" {
                        Units::INCH
                    } else {
                        Units::MM
                    };
                    tracing::debug!("Probe reports are in {}", self.report_units);
                }
                Ok(())
            }
            MachineEvent::LineReceived { line } => self.on_line(&line).await,
        }
    }

    fn load_program(&mut self, name: String, gcode: String) {
        if name.starts_with(&self.config.output.program_prefix) {
            tracing::debug!("Compensated program {} loaded", name);
            return;
        }

        let bounds = extract_bounds(&gcode);
        self.publish(LevelingEvent::BoundsMeasured {
            program: name.clone(),
            bounds,
        });
        self.bounds = bounds;
        self.program = Some(LoadedProgram { name, gcode });
    }

    /// Plan the grid over the loaded program and send the probe program
    ///
    /// Returns the number of points expected.
    pub async fn start_probing(&mut self) -> LevelingResult<usize> {
        if self.program.is_none() {
            return Err(LevelingError::NoProgramLoaded);
        }
        let bounds = self.bounds.ok_or(LevelingError::NoMotionFound)?;
        if self.session.is_active() {
            return Err(LevelingError::RunActive);
        }
        if !self.is_connected() {
            return Err(LevelingError::NotConnected);
        }

        tracing::info!("Starting autoleveling over {}", bounds);
        tracing::info!("Work offset: {}", self.work_offset());

        let planner = ProbeGridPlanner::new(&self.config.autolevel);
        let grid = planner.plan(&bounds);
        let planned = grid.planned_count();
        self.session.start(planned, self.report_units);
        self.publish(LevelingEvent::ProbingStarted { planned });

        for line in planner.probe_program(&grid) {
            if let Err(err) = self
                .controller
                .send_command(MachineCommand::Gcode(line))
                .await
            {
                self.cancel("probe program could not be sent");
                return Err(err.into());
            }
        }

        Ok(planned)
    }

    async fn on_line(&mut self, line: &str) -> LevelingResult<()> {
        let planned = self.session.planned();
        match self.session.on_probe_response(line, self.work_offset()) {
            ProbeOutcome::Ignored => Ok(()),
            ProbeOutcome::Recorded { index, point } => {
                self.publish(LevelingEvent::PointProbed {
                    index,
                    planned,
                    point,
                });
                Ok(())
            }
            ProbeOutcome::Completed(points) => {
                if let Some(&point) = points.last() {
                    self.publish(LevelingEvent::PointProbed {
                        index: points.len() - 1,
                        planned,
                        point,
                    });
                }
                self.finish(points).await
            }
        }
    }

    async fn finish(&mut self, points: Vec<Point3>) -> LevelingResult<()> {
        tracing::info!("Probing complete with {} points", points.len());
        self.publish(LevelingEvent::MeshCompleted {
            points: points.len(),
        });
        let mesh = HeightMesh::new(points);

        let Some(program) = self.program.as_ref() else {
            tracing::warn!("Probing finished but no program is loaded to compensate");
            self.mesh = Some(mesh);
            return Ok(());
        };

        let output = CompensationRewriter::new(&mesh, self.config.autolevel.delta)
            .with_annotation(self.config.output.annotate_original_z)
            .rewrite(&program.gcode);
        let name = format!("{}{}", self.config.output.program_prefix, program.name);
        let report = output.report;
        self.mesh = Some(mesh);

        self.controller
            .send_command(MachineCommand::LoadProgram {
                name: name.clone(),
                gcode: output.gcode.clone(),
            })
            .await?;

        tracing::info!("Loaded compensated program {}", name);
        self.publish(LevelingEvent::ProgramCompensated {
            name: name.clone(),
            compensated: report.compensated,
            fallbacks: report.fallbacks,
            incremental_lines: report.incremental_lines,
        });
        self.output = Some(CompensatedProgram {
            name,
            gcode: output.gcode,
            report,
        });
        Ok(())
    }

    /// Abandon an active run
    pub fn cancel(&mut self, reason: &str) {
        if !self.session.is_active() {
            return;
        }
        self.session.cancel();
        tracing::warn!("Probing cancelled: {}", reason);
        self.publish(LevelingEvent::SessionCancelled {
            reason: reason.to_string(),
        });
    }

    /// Process messages until the channel closes
    ///
    /// With `probe_timeout_secs` set, an active run is cancelled when no
    /// message arrives for that long.
    pub async fn run(mut self, mut receiver: mpsc::Receiver<WorkflowMessage>) -> Self {
        loop {
            let timeout = self
                .config
                .autolevel
                .probe_timeout_secs
                .filter(|_| self.session.is_active());

            let message = match timeout {
                Some(secs) => {
                    match tokio::time::timeout(Duration::from_secs(secs), receiver.recv()).await {
                        Ok(message) => message,
                        Err(_) => {
                            self.cancel(&format!("no response for {} s", secs));
                            continue;
                        }
                    }
                }
                None => receiver.recv().await,
            };

            let Some(message) = message else {
                break;
            };
            if let Err(err) = self.handle(message).await {
                tracing::warn!("Autolevel: {}", err);
            }
        }
        tracing::debug!("Autolevel workflow stopped");
        self
    }

    fn publish(&self, event: LevelingEvent) {
        if let Some(bus) = &self.events {
            bus.publish(AppEvent::Leveling(event));
        }
    }
}
