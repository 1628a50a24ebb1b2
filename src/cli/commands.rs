//! CLI command handlers.
//!
//! Each handler returns the process exit code; errors are printed to
//! stderr and mapped to exit code 1.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::process::ExitCode;

use tracing::info;

use crate::engine::jidoka::JidokaGuard;
use crate::error::{SimError, SimResult};
use crate::simulation::{simulate, simulate_method, Method};

use super::args::{OutputFormat, ParamArgs};
use super::output::{
    version_line, write_csv, write_json, write_report, write_summary, write_verify_result,
};
use super::{Args, Command};

/// Main CLI entry point.
///
/// Dispatches to the appropriate command handler based on parsed arguments.
#[must_use]
pub fn run_cli(args: Args) -> ExitCode {
    let result = match args.command {
        Command::Run {
            params,
            format,
            output,
        } => run_simulation(&params, format, output.as_deref()),
        Command::Verify { params, runs } => verify_determinism(&params, runs),
        Command::Check { params } => check_guards(&params),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

/// Simulate and write the run in `format` to `output` or stdout.
///
/// # Errors
///
/// Returns error if the parameters are invalid, the run fails a guard, or
/// the output cannot be written.
pub fn run_simulation(
    params: &ParamArgs,
    format: OutputFormat,
    output: Option<&Path>,
) -> SimResult<ExitCode> {
    let config = params.resolve()?;
    let data = simulate(&config)?;

    let mut out: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    };

    match format {
        OutputFormat::Summary => write_summary(&mut out, &config, &data)?,
        OutputFormat::Json => write_json(&mut out, &data)?,
        OutputFormat::Csv => write_csv(&mut out, &data)?,
    }
    out.flush()?;

    if let Some(path) = output {
        info!(path = %path.display(), ?format, "wrote simulation output");
    }
    Ok(ExitCode::SUCCESS)
}

/// Run the same parameters `runs` times and compare output fingerprints.
///
/// # Errors
///
/// Returns error if `runs` is zero or any run fails.
pub fn verify_determinism(params: &ParamArgs, runs: usize) -> SimResult<ExitCode> {
    if runs == 0 {
        return Err(SimError::config("Verification needs at least one run"));
    }
    let config = params.resolve()?;

    let hashes = (0..runs)
        .map(|_| simulate(&config).map(|data| data.fingerprint()))
        .collect::<SimResult<Vec<_>>>()?;
    let reference = hashes.first().cloned().unwrap_or_default();
    let identical = hashes.iter().all(|h| *h == reference);

    let mut out = io::stdout().lock();
    writeln!(out, "{}", version_line())?;
    write_verify_result(&mut out, &reference, &hashes)?;

    Ok(if identical {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

/// Run each method and print its guard report.
///
/// Unlike `run`, a guard violation is reported per method instead of
/// aborting at the first one.
///
/// # Errors
///
/// Returns error if the parameters are invalid or a solver fails.
pub fn check_guards(params: &ParamArgs) -> SimResult<ExitCode> {
    let config = params.resolve()?;
    let guard = JidokaGuard::from_config(&config);

    let mut out = io::stdout().lock();
    writeln!(out, "{}", version_line())?;

    let mut passed = true;
    for method in Method::ALL {
        let trajectory = simulate_method(&config, method)?;
        match guard.check(&config, &trajectory) {
            Ok(report) => write_report(&mut out, &report)?,
            Err(e) if e.is_jidoka_violation() => {
                passed = false;
                writeln!(out, "✗ Jidoka [{method}]: {e}")?;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(if passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}
