//! # LevelKit Communication
//!
//! Controller-facing plumbing for LevelKit: parsing GRBL response lines,
//! translating them into [`MachineEvent`](levelkit_core::MachineEvent)s, and
//! [`MachineController`](levelkit_core::MachineController) implementations
//! that hand commands to a transport.

pub mod communication;
pub mod firmware;

pub use communication::ChannelController;
pub use firmware::grbl::{
    GrblEventTranslator, GrblResponse, GrblResponseParser, ParserState, ProbeReport,
    StatusReport,
};
pub use firmware::ControllerType;
