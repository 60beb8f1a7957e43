//! # LevelKit Core
//!
//! Core types, traits, and utilities for LevelKit.
//! Provides the fundamental abstractions shared by the G-code, communication
//! and leveling crates: coordinates and bounding boxes, unit conversion,
//! machine events and commands, and the notification bus.

pub mod core;
pub mod data;
pub mod error;
pub mod event_bus;
pub mod units;

pub use core::{MachineCommand, MachineController, NoOpController};

pub use data::{BoundingBox, MachineState, Point2, Point3};

pub use error::{ControllerError, Error, GcodeError, Result};

pub use event_bus::{AppEvent, EventBus, LevelingEvent, MachineEvent};

pub use units::{Units, MM_PER_INCH};
