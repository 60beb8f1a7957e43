use std::sync::Arc;

use async_trait::async_trait;
use levelkit_core::{
    AppEvent, ControllerError, EventBus, LevelingEvent, MachineCommand,
    MachineController, MachineEvent, MachineState, Point3,
};
use levelkit_leveling::{AutolevelWorkflow, WorkflowMessage};
use levelkit_settings::{AutolevelSettings, Config};
use parking_lot::Mutex;

pub const PROGRAM: &str = "G21\nG90\nG0 X0 Y0 Z1\nG1 X10 Y10 Z-1 F300\nM5\n";

/// Records every command; optionally rejects them all
#[derive(Default)]
pub struct RecordingController {
    commands: Mutex<Vec<MachineCommand>>,
    reject: bool,
}

impl RecordingController {
    pub fn rejecting() -> Self {
        Self {
            commands: Mutex::new(Vec::new()),
            reject: true,
        }
    }

    pub fn commands(&self) -> Vec<MachineCommand> {
        self.commands.lock().clone()
    }

    pub fn gcode_lines(&self) -> Vec<String> {
        self.commands()
            .into_iter()
            .filter_map(|c| match c {
                MachineCommand::Gcode(line) => Some(line),
                MachineCommand::LoadProgram { .. } => None,
            })
            .collect()
    }

    pub fn loaded_programs(&self) -> Vec<(String, String)> {
        self.commands()
            .into_iter()
            .filter_map(|c| match c {
                MachineCommand::LoadProgram { name, gcode } => Some((name, gcode)),
                MachineCommand::Gcode(_) => None,
            })
            .collect()
    }
}

#[async_trait]
impl MachineController for RecordingController {
    async fn send_command(&self, command: MachineCommand) -> levelkit_core::Result<()> {
        if self.reject {
            return Err(ControllerError::CommandRejected {
                reason: "offline".to_string(),
            }
            .into());
        }
        self.commands.lock().push(command);
        Ok(())
    }
}

/// Settings giving a 2 x 2 grid over `PROGRAM`
pub fn test_settings() -> AutolevelSettings {
    AutolevelSettings {
        margin: 0.0,
        delta: 10.0,
        ..AutolevelSettings::default()
    }
}

pub fn history_bus() -> Arc<EventBus> {
    Arc::new(EventBus::with_history(1000))
}

pub fn workflow(
    controller: Arc<RecordingController>,
    bus: Arc<EventBus>,
) -> AutolevelWorkflow<RecordingController> {
    let config = Config {
        autolevel: test_settings(),
        ..Config::default()
    };
    AutolevelWorkflow::new(controller, config)
        .unwrap()
        .with_event_bus(bus)
}

pub fn machine(event: MachineEvent) -> WorkflowMessage {
    WorkflowMessage::Machine(event)
}

pub fn port_opened() -> WorkflowMessage {
    machine(MachineEvent::PortOpened {
        port: "/dev/ttyUSB0".to_string(),
    })
}

pub fn program_loaded(name: &str, gcode: &str) -> WorkflowMessage {
    machine(MachineEvent::ProgramLoaded {
        name: name.to_string(),
        gcode: gcode.to_string(),
    })
}

pub fn line(text: &str) -> WorkflowMessage {
    machine(MachineEvent::LineReceived {
        line: text.to_string(),
    })
}

pub fn positions(machine_pos: Point3, work_pos: Point3) -> WorkflowMessage {
    machine(MachineEvent::StateChanged {
        controller: "Grbl".to_string(),
        state: MachineState {
            units: None,
            machine_position: Some(machine_pos),
            work_position: Some(work_pos),
            work_offset: None,
        },
    })
}

pub fn work_coordinate_offset(offset: Point3) -> WorkflowMessage {
    machine(MachineEvent::StateChanged {
        controller: "Grbl".to_string(),
        state: MachineState {
            units: None,
            machine_position: None,
            work_position: None,
            work_offset: Some(offset),
        },
    })
}

pub fn leveling_events(bus: &EventBus) -> Vec<LevelingEvent> {
    bus.history()
        .into_iter()
        .filter_map(|e| match e {
            AppEvent::Leveling(event) => Some(event),
            AppEvent::Machine(_) => None,
        })
        .collect()
}
