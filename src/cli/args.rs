//! CLI argument parsing.
//!
//! Parsed with `clap` derive. Every subcommand shares the same parameter
//! source: an optional YAML file, then per-field overrides on top of it.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::PendulumConfig;
use crate::error::SimResult;

/// CLI arguments container.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(
    name = "pendulum2d",
    author,
    version,
    about = "Small-angle and exact trajectories of a planar pendulum",
    long_about = None
)]
pub struct Args {
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Log at debug level (overridden by `RUST_LOG`).
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available CLI commands.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Simulate and write the trajectories
    Run {
        /// Parameter source.
        #[command(flatten)]
        params: ParamArgs,
        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Summary)]
        format: OutputFormat,
        /// Write to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Rerun several times and confirm bitwise identical output
    Verify {
        /// Parameter source.
        #[command(flatten)]
        params: ParamArgs,
        /// Number of runs.
        #[arg(long, default_value_t = 3)]
        runs: usize,
    },
    /// Run the guards and print their report
    Check {
        /// Parameter source.
        #[command(flatten)]
        params: ParamArgs,
    },
}

/// Output format of `run`.
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable overview.
    #[default]
    Summary,
    /// Full run as JSON.
    Json,
    /// One row per method and sample.
    Csv,
}

/// Simulation parameters from a config file plus overrides.
#[derive(clap::Args, Debug, Clone, Default, PartialEq)]
pub struct ParamArgs {
    /// YAML parameter file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Pendulum length (m).
    #[arg(long)]
    pub length: Option<f64>,
    /// Gravitational acceleration (m/s²).
    #[arg(long)]
    pub g: Option<f64>,
    /// Initial angle (rad).
    #[arg(long = "phi0", allow_negative_numbers = true)]
    pub phi_0: Option<f64>,
    /// Initial angular velocity (rad/s).
    #[arg(long = "phi-dot0", allow_negative_numbers = true)]
    pub phi_dot_0: Option<f64>,
    /// Frame rate (Hz).
    #[arg(long)]
    pub fps: Option<u32>,
    /// Duration (s).
    #[arg(long = "t-max")]
    pub t_max: Option<f64>,
}

impl ParamArgs {
    /// Build the run configuration: file or defaults, then overrides.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be loaded or the result is invalid.
    pub fn resolve(&self) -> SimResult<PendulumConfig> {
        let mut config = match &self.config {
            Some(path) => PendulumConfig::load(path)?,
            None => PendulumConfig::default(),
        };

        if let Some(length) = self.length {
            config.length = length;
        }
        if let Some(g) = self.g {
            config.g = g;
        }
        if let Some(phi_0) = self.phi_0 {
            config.phi_0 = phi_0;
        }
        if let Some(phi_dot_0) = self.phi_dot_0 {
            config.phi_dot_0 = phi_dot_0;
        }
        if let Some(fps) = self.fps {
            config.fps = fps;
        }
        if let Some(t_max) = self.t_max {
            config.t_max = t_max;
        }

        config.validate_all()?;
        Ok(config)
    }
}
