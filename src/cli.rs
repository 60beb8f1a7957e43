//! Command-line operations
//!
//! Each subcommand of the `levelkit` binary is a plain function here so it
//! can be exercised without a terminal.

use std::path::Path;

use anyhow::Context;
use clap::Args;
use levelkit_core::{BoundingBox, GcodeError, Point3, Units};
use levelkit_gcode::extract_bounds;
use levelkit_leveling::{
    replay_probe_log, CompensationRewriter, HeightMesh, ProbeGrid, ProbeGridPlanner,
    RewriteOutput,
};
use levelkit_settings::{AutolevelSettings, Config};

/// Probing parameters given on the command line
#[derive(Debug, Clone, Copy, Default, Args)]
pub struct ProbeOverrides {
    /// Distance probed past the program extent (mm)
    #[arg(long)]
    pub margin: Option<f64>,

    /// Safe travel height (mm)
    #[arg(long)]
    pub z_safe: Option<f64>,

    /// Target probe spacing (mm)
    #[arg(long)]
    pub delta: Option<f64>,

    /// Probe feed rate (mm/min)
    #[arg(long)]
    pub feedrate: Option<f64>,
}

impl ProbeOverrides {
    /// `settings` with every given value replaced, validated
    pub fn apply(&self, settings: AutolevelSettings) -> anyhow::Result<AutolevelSettings> {
        let merged = AutolevelSettings {
            margin: self.margin.unwrap_or(settings.margin),
            z_safe: self.z_safe.unwrap_or(settings.z_safe),
            delta: self.delta.unwrap_or(settings.delta),
            feedrate: self.feedrate.unwrap_or(settings.feedrate),
            probe_timeout_secs: settings.probe_timeout_secs,
        };
        merged.validate()?;
        Ok(merged)
    }
}

/// Parse `x,y,z` into a point
pub fn parse_offset(value: &str) -> Result<Point3, String> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    let [x, y, z] = parts.as_slice() else {
        return Err(format!("expected x,y,z but got '{}'", value));
    };
    let axis = |s: &str| {
        s.parse::<f64>()
            .map_err(|e| format!("invalid coordinate '{}': {}", s, e))
    };
    Ok(Point3::new(axis(x)?, axis(y)?, axis(z)?))
}

/// Read a program file
pub fn read_program(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Extent of a program, millimeters
pub fn program_bounds(gcode: &str) -> anyhow::Result<BoundingBox> {
    Ok(extract_bounds(gcode).ok_or(GcodeError::NoMotion)?)
}

/// Probe grid and probe program for a program
pub fn plan_probing(
    gcode: &str,
    settings: &AutolevelSettings,
) -> anyhow::Result<(ProbeGrid, Vec<String>)> {
    let bounds = program_bounds(gcode)?;
    let planner = ProbeGridPlanner::new(settings);
    let grid = planner.plan(&bounds);
    let program = planner.probe_program(&grid);
    tracing::info!(
        "{} probe points over {}",
        grid.planned_count(),
        grid.area
    );
    Ok((grid, program))
}

/// Rewrite a program against the probe reports in a saved controller log
pub fn compensate_with_log(
    gcode: &str,
    probe_log: &str,
    work_offset: Point3,
    report_units: Units,
    config: &Config,
) -> anyhow::Result<RewriteOutput> {
    let points = replay_probe_log(probe_log, work_offset, report_units);
    if points.is_empty() {
        anyhow::bail!("No successful probe reports found in the log");
    }
    tracing::info!("Building mesh from {} probe reports", points.len());

    let mesh = HeightMesh::new(points);
    let output = CompensationRewriter::new(&mesh, config.autolevel.delta)
        .with_annotation(config.output.annotate_original_z)
        .rewrite(gcode);
    if output.report.fallbacks > 0 {
        tracing::warn!(
            "{} points could not be corrected and keep their original Z",
            output.report.fallbacks
        );
    }
    Ok(output)
}

/// Name of the compensated program for a source file
pub fn compensated_name(source: &Path, prefix: &str) -> String {
    let file = source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{}{}", prefix, file)
}
