//! LevelKit Settings Crate
//!
//! Holds the autoleveling parameters (margin, safe height, grid spacing,
//! probe feed) and the configuration file they are persisted in.

pub mod config;
pub mod error;

pub use config::{AutolevelSettings, Config, OutputSettings, DEFAULT_PROGRAM_PREFIX};
pub use error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
