use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use levelkit::cli::{self, ProbeOverrides};
use levelkit::{init_logging, Config, Point3, Units};

/// Surface probing and Z compensation for G-code programs
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json: bool,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the XY extent of a program in millimeters
    Bbox {
        /// G-code program
        file: PathBuf,
    },
    /// Print the probe program for a program's extent
    Plan {
        /// G-code program
        file: PathBuf,

        #[command(flatten)]
        overrides: ProbeOverrides,
    },
    /// Rewrite a program against probe reports saved from the controller
    Compensate {
        /// G-code program
        file: PathBuf,

        /// Controller log containing [PRB:...] reports
        #[arg(long)]
        probes: PathBuf,

        /// Work coordinate offset (x,y,z); X and Y are subtracted from the reports
        #[arg(long, value_parser = cli::parse_offset, allow_hyphen_values = true)]
        offset: Option<Point3>,

        /// Probe reports are in inches ($13=1)
        #[arg(long)]
        inches: bool,

        /// Write the result here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,

        #[command(flatten)]
        overrides: ProbeOverrides,
    },
    /// Show the effective configuration
    Config {
        /// Save it to the configuration file
        #[arg(long)]
        write: bool,
    },
}

fn config_path(explicit: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path),
        None => Ok(Config::default_path()?),
    }
}

fn write_output(path: Option<&Path>, content: &str) -> anyhow::Result<()> {
    match path {
        Some(path) => std::fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            println!("{}", content.trim_end());
            Ok(())
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(args.json)?;
    tracing::debug!("levelkit {} ({})", levelkit::VERSION, levelkit::BUILD_DATE);

    let path = config_path(args.config)?;
    let mut config = Config::load_or_default(&path)
        .with_context(|| format!("Failed to load configuration {}", path.display()))?;

    match args.command {
        Command::Bbox { file } => {
            let gcode = cli::read_program(&file)?;
            let bounds = cli::program_bounds(&gcode)?;
            println!("{}", serde_json::to_string_pretty(&bounds)?);
        }
        Command::Plan { file, overrides } => {
            let settings = overrides.apply(config.autolevel)?;
            let gcode = cli::read_program(&file)?;
            let (_, program) = cli::plan_probing(&gcode, &settings)?;
            write_output(None, &program.join("\n"))?;
        }
        Command::Compensate {
            file,
            probes,
            offset,
            inches,
            output,
            overrides,
        } => {
            config.autolevel = overrides.apply(config.autolevel)?;
            let gcode = cli::read_program(&file)?;
            let log = std::fs::read_to_string(&probes)
                .with_context(|| format!("Failed to read {}", probes.display()))?;
            let units = if inches { Units::INCH } else { Units::MM };

            let result = cli::compensate_with_log(
                &gcode,
                &log,
                offset.unwrap_or_default(),
                units,
                &config,
            )?;
            tracing::info!(
                "{}: {} lines compensated, {} uncorrected points, {} incremental lines",
                cli::compensated_name(&file, &config.output.program_prefix),
                result.report.compensated,
                result.report.fallbacks,
                result.report.incremental_lines
            );
            write_output(output.as_deref(), &result.gcode)?;
        }
        Command::Config { write } => {
            if write {
                config.save_to_file(&path)?;
            }
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
