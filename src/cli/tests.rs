//! CLI module tests.

#![allow(clippy::unwrap_used, clippy::panic)]

use super::args::{Args, Command, OutputFormat, ParamArgs};
use super::commands::{check_guards, run_simulation, verify_determinism};
use super::output::{write_csv, write_json, write_report, write_summary, write_verify_result};
use super::CSV_HEADER;
use crate::config::PendulumConfig;
use crate::simulation::{simulate, Method, SimulationData};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

fn short_run() -> (PendulumConfig, SimulationData) {
    let config = PendulumConfig::builder().t_max(0.5).build();
    let data = simulate(&config).unwrap();
    (config, data)
}

fn render<F: FnOnce(&mut Vec<u8>)>(f: F) -> String {
    let mut buf = Vec::new();
    f(&mut buf);
    String::from_utf8(buf).unwrap()
}

// ============================================================================
// Args parsing tests
// ============================================================================

#[test]
fn test_parse_run_defaults() {
    let args = Args::try_parse_from(["pendulum2d", "run"]).unwrap();
    assert!(!args.verbose);
    match args.command {
        Command::Run {
            params,
            format,
            output,
        } => {
            assert_eq!(params, ParamArgs::default());
            assert_eq!(format, OutputFormat::Summary);
            assert!(output.is_none());
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_parse_run_with_overrides() {
    let args = Args::try_parse_from([
        "pendulum2d",
        "run",
        "--length",
        "2.5",
        "--g",
        "1.62",
        "--phi0",
        "-0.3",
        "--phi-dot0",
        "-1.5",
        "--fps",
        "30",
        "--t-max",
        "4",
        "--format",
        "csv",
        "-o",
        "out.csv",
        "-v",
    ])
    .unwrap();
    assert!(args.verbose);
    let Command::Run {
        params,
        format,
        output,
    } = args.command
    else {
        panic!("expected run");
    };
    assert_eq!(params.length, Some(2.5));
    assert_eq!(params.g, Some(1.62));
    assert_eq!(params.phi_0, Some(-0.3));
    assert_eq!(params.phi_dot_0, Some(-1.5));
    assert_eq!(params.fps, Some(30));
    assert_eq!(params.t_max, Some(4.0));
    assert_eq!(format, OutputFormat::Csv);
    assert_eq!(output, Some(PathBuf::from("out.csv")));
}

#[test]
fn test_parse_verify_runs() {
    let args = Args::try_parse_from(["pendulum2d", "verify", "--runs", "5"]).unwrap();
    assert!(matches!(args.command, Command::Verify { runs: 5, .. }));

    let args = Args::try_parse_from(["pendulum2d", "verify"]).unwrap();
    assert!(matches!(args.command, Command::Verify { runs: 3, .. }));
}

#[test]
fn test_parse_check_with_config() {
    let args = Args::try_parse_from(["pendulum2d", "check", "--config", "p.yaml"]).unwrap();
    let Command::Check { params } = args.command else {
        panic!("expected check");
    };
    assert_eq!(params.config, Some(PathBuf::from("p.yaml")));
}

#[test]
fn test_parse_rejects_bad_input() {
    assert!(Args::try_parse_from(["pendulum2d"]).is_err());
    assert!(Args::try_parse_from(["pendulum2d", "unknown"]).is_err());
    assert!(Args::try_parse_from(["pendulum2d", "run", "--fps", "fast"]).is_err());
    assert!(Args::try_parse_from(["pendulum2d", "run", "--format", "xml"]).is_err());
}

// ============================================================================
// Parameter resolution tests
// ============================================================================

#[test]
fn test_resolve_defaults() {
    let config = ParamArgs::default().resolve().unwrap();
    assert_eq!(config, PendulumConfig::default());
}

#[test]
fn test_resolve_overrides_file() {
    let path = std::env::temp_dir().join("pendulum2d_cli_resolve.yaml");
    std::fs::write(&path, "length: 3.0\nphi_0: 0.2\nfps: 25\n").unwrap();

    let params = ParamArgs {
        config: Some(path.clone()),
        phi_0: Some(0.4),
        ..Default::default()
    };
    let config = params.resolve().unwrap();
    assert!((config.length - 3.0).abs() < f64::EPSILON);
    assert!((config.phi_0 - 0.4).abs() < f64::EPSILON);
    assert_eq!(config.fps, 25);

    std::fs::remove_file(&path).ok();
}

#[test]
fn test_resolve_rejects_invalid_override() {
    let params = ParamArgs {
        length: Some(-1.0),
        ..Default::default()
    };
    assert!(params.resolve().is_err());
}

// ============================================================================
// Output tests
// ============================================================================

#[test]
fn test_csv_layout() {
    let (_, data) = short_run();
    let text = render(|buf| write_csv(buf, &data).unwrap());
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some(CSV_HEADER));

    let rows: Vec<&str> = lines.collect();
    assert_eq!(rows.len(), 2 * data.len());
    assert!(rows[0].starts_with("approx,0,0.8,0,"));
    assert!(rows[data.len()].starts_with("exact,0,0.8,0,"));
    assert!(rows.iter().all(|r| r.split(',').count() == 11));
}

#[test]
fn test_json_output_parses() {
    let (_, data) = short_run();
    let text = render(|buf| write_json(buf, &data).unwrap());
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    let phi = value["trajectories"]["exact"]["phi"].as_array().unwrap();
    assert_eq!(phi.len(), data.len());
}

#[test]
fn test_summary_mentions_both_methods() {
    let (config, data) = short_run();
    let text = render(|buf| write_summary(buf, &config, &data).unwrap());
    assert!(text.starts_with("pendulum2d "));
    assert!(text.contains("approx (small angle approximation)"));
    assert!(text.contains("exact (numerical ode integration)"));
    assert!(text.contains("samples = 30"));
    assert!(text.contains("Jidoka [exact]"));
}

#[test]
fn test_report_output() {
    let (_, data) = short_run();
    let report = &data.reports[&Method::Approx];
    let text = render(|buf| write_report(buf, report).unwrap());
    assert!(text.starts_with("✓ Jidoka [approx]: Acceptable"));
    assert!(text.contains("energy drift:         not checked"));
}

#[test]
fn test_verify_output() {
    let hashes = vec!["aa".to_string(), "aa".to_string()];
    let text = render(|buf| write_verify_result(buf, "aa", &hashes).unwrap());
    assert!(text.contains("Result: PASSED"));

    let hashes = vec!["aa".to_string(), "bb".to_string()];
    let text = render(|buf| write_verify_result(buf, "aa", &hashes).unwrap());
    assert!(text.contains("Result: FAILED"));
    assert!(text.contains("✗ Run 2: bb"));
}

// ============================================================================
// Command tests
// ============================================================================

#[test]
fn test_run_writes_output_file() {
    let path = std::env::temp_dir().join("pendulum2d_cli_run.csv");
    let params = ParamArgs {
        t_max: Some(0.25),
        ..Default::default()
    };
    let code = run_simulation(&params, OutputFormat::Csv, Some(&path)).unwrap();
    assert_eq!(code, ExitCode::SUCCESS);

    let text = std::fs::read_to_string(&path).unwrap();
    // 60 fps * 0.25 s = 15 samples per method
    assert_eq!(text.lines().count(), 1 + 2 * 15);
    std::fs::remove_file(&path).ok();
}

#[test]
fn test_run_invalid_params_fails() {
    let params = ParamArgs {
        fps: Some(0),
        ..Default::default()
    };
    assert!(run_simulation(&params, OutputFormat::Summary, None).is_err());
}

#[test]
fn test_verify_passes() {
    let params = ParamArgs {
        t_max: Some(0.5),
        ..Default::default()
    };
    assert_eq!(verify_determinism(&params, 2).unwrap(), ExitCode::SUCCESS);
    assert!(verify_determinism(&params, 0).is_err());
}

#[test]
fn test_check_passes() {
    let params = ParamArgs {
        t_max: Some(0.5),
        ..Default::default()
    };
    assert_eq!(check_guards(&params).unwrap(), ExitCode::SUCCESS);
}

#[test]
fn test_check_reports_energy_drift() {
    // Coarse fixed-step RK4 at a large amplitude drifts far past 1e-6
    let path = std::env::temp_dir().join("pendulum2d_cli_drift.yaml");
    std::fs::write(
        &path,
        "phi_0: 2.5\nfps: 5\nsolver:\n  method: rk4\n  substeps: 1\n",
    )
    .unwrap();

    let args = Args::try_parse_from([
        "pendulum2d",
        "check",
        "--config",
        path.to_str().unwrap(),
    ])
    .unwrap();
    let Command::Check { params } = args.command else {
        panic!("expected check");
    };
    assert_eq!(check_guards(&params).unwrap(), ExitCode::from(1));

    let err = run_simulation(&params, OutputFormat::Summary, None).unwrap_err();
    assert!(err.is_jidoka_violation(), "{err}");

    std::fs::remove_file(&path).ok();
}
