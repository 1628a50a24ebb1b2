//! CLI module for pendulum2d.
//!
//! All CLI logic lives here rather than in main.rs so it can be tested.
//! The entry point `run_cli` is called from main.rs with parsed arguments.

mod args;
mod commands;
mod output;

pub use args::{Args, Command, OutputFormat, ParamArgs};
pub use commands::{check_guards, run_cli, run_simulation, verify_determinism};
pub use output::{
    version_line, write_csv, write_json, write_report, write_summary, write_verify_result,
    CSV_HEADER,
};

#[cfg(test)]
mod tests;
