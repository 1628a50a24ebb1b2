//! CLI output formatting.
//!
//! Every writer takes an `io::Write` so the text can be checked in tests
//! without touching stdout.

use std::io::{self, Write};

use crate::config::PendulumConfig;
use crate::engine::jidoka::{JidokaReport, JidokaWarning, ViolationSeverity};
use crate::error::SimResult;
use crate::simulation::{Method, SimulationData};

/// Header row of the CSV export.
pub const CSV_HEADER: &str = "method,t,phi,phi_dot,phi_double_dot,x,y,vx,vy,ax,ay";

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Version line including the commit the binary was built from.
#[must_use]
pub fn version_line() -> String {
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => {
            format!("pendulum2d {} ({hash})", env!("CARGO_PKG_VERSION"))
        }
        _ => format!("pendulum2d {}", env!("CARGO_PKG_VERSION")),
    }
}

/// Write a human-readable overview of a run.
///
/// # Errors
///
/// Returns error if writing fails.
pub fn write_summary<W: Write>(
    out: &mut W,
    config: &PendulumConfig,
    data: &SimulationData,
) -> io::Result<()> {
    writeln!(out, "{}", version_line())?;
    writeln!(out, "{RULE}")?;
    writeln!(
        out,
        "L = {} m   g = {} m/s²   phi_0 = {} rad   phi_dot_0 = {} rad/s",
        config.length, config.g, config.phi_0, config.phi_dot_0
    )?;
    writeln!(
        out,
        "omega = {:.6} rad/s   small-angle period = {:.6} s",
        config.omega(),
        config.small_angle_period()
    )?;
    let t_last = data.grid.last();
    writeln!(
        out,
        "samples = {}   dt = {:.6} s   t = [0, {t_last:.6}]",
        data.len(),
        data.grid.dt()
    )?;
    writeln!(out, "{RULE}\n")?;

    for (method, traj) in &data.trajectories {
        let energy = traj.energy(config);
        let e0 = energy.first().copied().unwrap_or(0.0);
        let e_last = energy.last().copied().unwrap_or(0.0);
        let phi_max = traj.phi.iter().fold(0.0_f64, |m, p| m.max(p.abs()));
        writeln!(out, "{method} ({})", method.label())?;
        writeln!(out, "  max |phi|:     {phi_max:.6} rad")?;
        if let (Some(phi), Some(r)) = (traj.phi.last(), traj.r.last()) {
            writeln!(out, "  final phi:     {phi:.6} rad")?;
            writeln!(out, "  final r:       ({:.6}, {:.6}) m", r.x, r.y)?;
        }
        writeln!(out, "  energy:        {e0:.9} -> {e_last:.9} J")?;
    }

    if let (Some(approx), Some(exact)) = (
        data.trajectory(Method::Approx),
        data.trajectory(Method::Exact),
    ) {
        let divergence = approx
            .phi
            .iter()
            .zip(&exact.phi)
            .map(|(a, e)| (a - e).abs())
            .fold(0.0, f64::max);
        writeln!(out, "\nmax |phi_approx - phi_exact|: {divergence:.6e} rad")?;
    }

    let stats = &data.solver_stats;
    writeln!(
        out,
        "solver: {} accepted, {} rejected, {} rhs evaluations",
        stats.accepted_steps, stats.rejected_steps, stats.rhs_evaluations
    )?;

    if !data.reports.is_empty() {
        writeln!(out)?;
        for report in data.reports.values() {
            write_report(out, report)?;
        }
    }
    Ok(())
}

/// Write one guard report.
///
/// # Errors
///
/// Returns error if writing fails.
pub fn write_report<W: Write>(out: &mut W, report: &JidokaReport) -> io::Result<()> {
    let sym = match report.severity {
        ViolationSeverity::Acceptable => "✓",
        ViolationSeverity::Warning => "!",
        ViolationSeverity::Critical | ViolationSeverity::Fatal => "✗",
    };
    writeln!(out, "{sym} Jidoka [{}]: {:?}", report.method, report.severity)?;
    writeln!(
        out,
        "    arm length deviation: {:.3e}",
        report.max_constraint_violation
    )?;
    match report.max_energy_drift {
        Some(drift) => writeln!(out, "    energy drift:         {drift:.3e}")?,
        None => writeln!(out, "    energy drift:         not checked")?,
    }
    for warning in &report.warnings {
        match warning {
            JidokaWarning::EnergyDriftApproaching { drift, tolerance } => {
                writeln!(out, "    ! energy drift {drift:.3e} near tolerance {tolerance:.3e}")?;
            }
            JidokaWarning::ConstraintApproaching {
                name,
                violation,
                tolerance,
            } => {
                writeln!(
                    out,
                    "    ! constraint '{name}' at {violation:.3e} near tolerance {tolerance:.3e}"
                )?;
            }
        }
    }
    Ok(())
}

/// Write the run as pretty-printed JSON.
///
/// # Errors
///
/// Returns error if serialization or writing fails.
pub fn write_json<W: Write>(out: &mut W, data: &SimulationData) -> SimResult<()> {
    serde_json::to_writer_pretty(&mut *out, data)?;
    writeln!(out)?;
    Ok(())
}

/// Write the run as CSV, methods in order, samples in time order.
///
/// # Errors
///
/// Returns error if writing fails.
pub fn write_csv<W: Write>(out: &mut W, data: &SimulationData) -> io::Result<()> {
    writeln!(out, "{CSV_HEADER}")?;
    for (method, traj) in &data.trajectories {
        for (i, &t) in data.grid.times().iter().enumerate() {
            let Some(s) = traj.sample(i) else {
                continue;
            };
            writeln!(
                out,
                "{method},{t},{},{},{},{},{},{},{},{},{}",
                s.phi,
                s.phi_dot,
                s.phi_double_dot,
                s.r.x,
                s.r.y,
                s.r_dot.x,
                s.r_dot.y,
                s.r_double_dot.x,
                s.r_double_dot.y
            )?;
        }
    }
    Ok(())
}

/// Write the outcome of a determinism check.
///
/// # Errors
///
/// Returns error if writing fails.
pub fn write_verify_result<W: Write>(
    out: &mut W,
    reference: &str,
    hashes: &[String],
) -> io::Result<()> {
    let identical = hashes.iter().all(|h| h == reference);
    let (status, sym) = if identical {
        ("PASSED", "✓")
    } else {
        ("FAILED", "✗")
    };

    writeln!(out, "{RULE}")?;
    writeln!(out, "Determinism Check")?;
    writeln!(out, "{RULE}\n")?;
    writeln!(out, "  Runs:      {}", hashes.len())?;
    writeln!(out, "  Identical: {identical}")?;
    writeln!(out, "\n  Reference Hash: {reference}")?;
    if !identical {
        writeln!(out, "\n  Run Hashes:")?;
        for (i, hash) in hashes.iter().enumerate() {
            let mark = if hash == reference { "✓" } else { "✗" };
            writeln!(out, "    {mark} Run {}: {hash}", i + 1)?;
        }
    }
    writeln!(out, "\n{RULE}")?;
    writeln!(out, "{sym} Result: {status}")?;
    writeln!(out, "{RULE}")?;
    Ok(())
}
