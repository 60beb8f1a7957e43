//! GRBL line to machine event translation
//!
//! Turns raw serial lines into the [`MachineEvent`]s the leveling workflow
//! consumes. Every line is forwarded verbatim as `LineReceived`; status
//! reports, parser state and `$` settings additionally produce state or
//! settings events.

use std::collections::BTreeMap;

use levelkit_core::{MachineEvent, MachineState};

use super::response_parser::{GrblResponse, GrblResponseParser};
use crate::firmware::ControllerType;

/// Stateless translator from GRBL responses to machine events
#[derive(Debug, Default, Clone)]
pub struct GrblEventTranslator {
    parser: GrblResponseParser,
    controller: ControllerType,
}

impl GrblEventTranslator {
    /// Create a translator for plain GRBL
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a translator that labels events with another controller flavor
    pub fn with_controller(controller: ControllerType) -> Self {
        Self {
            parser: GrblResponseParser::new(),
            controller,
        }
    }

    /// The controller flavor events are labeled with
    pub fn controller(&self) -> ControllerType {
        self.controller
    }

    /// Translate one received line
    ///
    /// Blank lines produce nothing.
    pub fn translate(&self, line: &str) -> Vec<MachineEvent> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }

        let mut events = vec![MachineEvent::LineReceived {
            line: trimmed.to_string(),
        }];

        let Some(response) = self.parser.parse(trimmed) else {
            return events;
        };

        match response {
            GrblResponse::Status(status) => {
                events.push(self.state_changed(MachineState {
                    units: None,
                    machine_position: status.machine_pos,
                    work_position: status.work_pos,
                    work_offset: status.work_coord_offset,
                }));
            }
            GrblResponse::ParserState(parser_state) => {
                if parser_state.units.is_some() {
                    events.push(self.state_changed(MachineState {
                        units: parser_state.units,
                        ..MachineState::default()
                    }));
                }
            }
            GrblResponse::Setting { number, value } => {
                let mut settings = BTreeMap::new();
                settings.insert(format!("${}", number), value);
                events.push(MachineEvent::SettingsChanged {
                    controller: self.controller.to_string(),
                    settings,
                });
            }
            GrblResponse::Error(code) => {
                tracing::warn!(
                    "{} error {}: {}",
                    self.controller,
                    code,
                    GrblResponseParser::error_description(code)
                );
            }
            GrblResponse::Alarm(code) => {
                tracing::warn!(
                    "{} alarm {}: {}",
                    self.controller,
                    code,
                    GrblResponseParser::alarm_description(code)
                );
            }
            GrblResponse::Version(version) => {
                tracing::info!("Controller identified: {}", version);
            }
            GrblResponse::Ok
            | GrblResponse::Probe(_)
            | GrblResponse::Feedback(_)
            | GrblResponse::Message(_) => {}
        }

        events
    }

    fn state_changed(&self, state: MachineState) -> MachineEvent {
        MachineEvent::StateChanged {
            controller: self.controller.to_string(),
            state,
        }
    }
}
