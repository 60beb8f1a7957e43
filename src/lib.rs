//! # LevelKit
//!
//! Surface probing and Z compensation ("autoleveling") for G-code programs
//! on GRBL-family machines:
//! - Measure the XY extent a program touches
//! - Plan a probe grid over it and drive the probing run
//! - Collect probe reports into a height mesh
//! - Rewrite the program so Z follows the probed surface
//!
//! ## Architecture
//!
//! LevelKit is organized as a workspace with multiple crates:
//!
//! 1. **levelkit-core** - Shared data model, errors, events, controller trait
//! 2. **levelkit-gcode** - Tokenizer, modal state, bounds extraction
//! 3. **levelkit-communication** - GRBL response parsing and command transports
//! 4. **levelkit-leveling** - Planner, probe session, mesh, rewriter, workflow
//! 5. **levelkit-settings** - Probing parameters and configuration files
//! 6. **levelkit** - This crate: re-exports, logging setup and the CLI

pub mod cli;

pub use levelkit_core::{
    AppEvent, BoundingBox, ControllerError, Error, EventBus, GcodeError, LevelingEvent,
    MachineCommand, MachineController, MachineEvent, MachineState, Point2, Point3, Result, Units,
};

pub use levelkit_gcode::{extract_bounds, Block, BoundsExtractor, ModalState};

pub use levelkit_communication::{
    ChannelController, ControllerType, GrblEventTranslator, GrblResponse, GrblResponseParser,
};

pub use levelkit_leveling::{
    compensate_program, replay_probe_log, AutolevelWorkflow, CompensationRewriter, HeightMesh,
    LevelingError, MeshError, ProbeGrid, ProbeGridPlanner, ProbeSession, RewriteReport,
    WorkflowMessage,
};

pub use levelkit_settings::{AutolevelSettings, Config, OutputSettings};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging
///
/// Sets up structured logging with:
/// - RUST_LOG environment variable support, INFO by default
/// - Target, level and line numbers on every event
/// - JSON lines instead of text when `json` is set
///
/// Logs go to stderr so command output on stdout stays clean.
pub fn init_logging(json: bool) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    if json {
        let fmt_layer = fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    } else {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    }

    Ok(())
}
