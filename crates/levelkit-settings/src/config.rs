//! Configuration for LevelKit
//!
//! Provides the autoleveling parameters, output preferences and the
//! configuration file they live in. Supports JSON and TOML file formats
//! stored in the platform configuration directory.
//!
//! Configuration is organized into two sections:
//! - Autolevel parameters (margin, safe height, grid spacing, probe feed)
//! - Output preferences (rewritten program name prefix, Z annotations)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ConfigResult, SettingsError, SettingsResult};

/// Name prefix of programs produced by the compensation rewriter
pub const DEFAULT_PROGRAM_PREFIX: &str = "#AL:";

/// Probing parameters
///
/// Lengths are millimeters, feed rate is mm/min.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutolevelSettings {
    /// Distance the probed area extends past the program extent
    pub margin: f64,
    /// Height the probe travels at between points
    pub z_safe: f64,
    /// Target spacing between probe points
    pub delta: f64,
    /// Probe plunge feed rate
    pub feedrate: f64,
    /// Cancel an active probing run after this many idle seconds
    pub probe_timeout_secs: Option<u64>,
}

impl Default for AutolevelSettings {
    fn default() -> Self {
        Self {
            margin: 2.5,
            z_safe: 3.0,
            delta: 10.0,
            feedrate: 25.0,
            probe_timeout_secs: None,
        }
    }
}

impl AutolevelSettings {
    /// Check every value against its lower bound
    pub fn validate(&self) -> ConfigResult<()> {
        check_minimum("autolevel.margin", self.margin, 0.0)?;
        check_minimum("autolevel.z_safe", self.z_safe, 0.5)?;
        check_minimum("autolevel.delta", self.delta, 1.0)?;
        check_minimum("autolevel.feedrate", self.feedrate, 1.0)?;

        if self.probe_timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "autolevel.probe_timeout_secs".to_string(),
                reason: "must be at least one second when set".to_string(),
            });
        }

        Ok(())
    }
}

fn check_minimum(key: &str, value: f64, minimum: f64) -> ConfigResult<()> {
    if !value.is_finite() || value < minimum {
        return Err(ConfigError::ValueOutOfRange {
            key: key.to_string(),
            value: value.to_string(),
            minimum: minimum.to_string(),
        });
    }
    Ok(())
}

/// How compensated programs are named and annotated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Prepended to the source program name
    pub program_prefix: String,
    /// Append `; Z<original>` to every rewritten move
    pub annotate_original_z: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            program_prefix: DEFAULT_PROGRAM_PREFIX.to_string(),
            annotate_original_z: true,
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Probing parameters
    pub autolevel: AutolevelSettings,
    /// Output preferences
    pub output: OutputSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Toml,
}

impl Format {
    fn of(path: &Path) -> ConfigResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Format::Json),
            Some("toml") => Ok(Format::Toml),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// `<config dir>/levelkit/config.toml`
    pub fn default_path() -> SettingsResult<PathBuf> {
        let base = dirs::config_dir().ok_or_else(|| {
            SettingsError::ConfigDirectory("no configuration directory on this platform".into())
        })?;
        Ok(base.join("levelkit").join("config.toml"))
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = Format::of(path)?;
        let content = std::fs::read_to_string(path)
            .map_err(|e| SettingsError::LoadError(format!("{}: {}", path.display(), e)))?;

        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load the file at `path` if it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::debug!("No configuration at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save config to file (JSON or TOML)
    ///
    /// Missing parent directories are created.
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match Format::of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| SettingsError::ConfigDirectory(format!("{}: {}", parent.display(), e)))?;
        }

        std::fs::write(path, content)
            .map_err(|e| SettingsError::SaveError(format!("{}: {}", path.display(), e)))?;

        tracing::info!("Saved configuration to {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        self.autolevel.validate()?;

        if self.output.program_prefix.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "output.program_prefix".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        Ok(())
    }
}
