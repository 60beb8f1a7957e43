//! Machine collaborator interface
//!
//! The leveling workflow never talks to a serial port directly. It holds a
//! handle implementing [`MachineController`] and sends it [`MachineCommand`]s.

pub mod controller;

pub use controller::{MachineCommand, MachineController, NoOpController};
