//! Jidoka (自働化) - stop on anomaly.
//!
//! A finished trajectory is inspected before it is handed to the caller,
//! so a corrupted run produces an error instead of a misleading animation.
//!
//! # Anomaly Types
//!
//! 1. **Non-finite values**: NaN or Inf in any series
//! 2. **Constraint violations**: bob off the circle of radius L
//! 3. **Energy drift**: exact-method energy deviates from its initial value
//!
//! # Severity Levels
//!
//! - **Acceptable**: within tolerance, continue
//! - **Warning**: past `warning_fraction` of the tolerance, log and continue
//! - **Critical**: tolerance exceeded, stop
//! - **Fatal**: non-finite measure, stop

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::PendulumConfig;
use crate::domains::kinematics::PendulumArm;
use crate::error::{SimError, SimResult};
use crate::simulation::{Method, Trajectory};

/// Severity levels for Jidoka violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ViolationSeverity {
    /// Acceptable variance within tolerance (continue).
    Acceptable,
    /// Warning: approaching tolerance boundary (log, continue).
    Warning,
    /// Critical: tolerance exceeded (stop the line).
    Critical,
    /// Fatal: unrecoverable state (halt immediately).
    Fatal,
}

/// Warning from Jidoka check (non-critical issue).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JidokaWarning {
    /// Energy drift approaching tolerance.
    EnergyDriftApproaching {
        /// Current drift value.
        drift: f64,
        /// Tolerance threshold.
        tolerance: f64,
    },
    /// Constraint approaching violation.
    ConstraintApproaching {
        /// Constraint name.
        name: String,
        /// Current violation amount.
        violation: f64,
        /// Tolerance threshold.
        tolerance: f64,
    },
}

/// Classifier for graduated Jidoka responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityClassifier {
    /// Warning threshold as fraction of tolerance (e.g., 0.8 = warn at 80%).
    pub warning_fraction: f64,
}

impl Default for SeverityClassifier {
    fn default() -> Self {
        Self {
            warning_fraction: 0.8,
        }
    }
}

impl SeverityClassifier {
    /// Create a new severity classifier.
    #[must_use]
    pub const fn new(warning_fraction: f64) -> Self {
        Self { warning_fraction }
    }

    /// Classify a non-negative measure against its tolerance.
    #[must_use]
    pub fn classify(&self, measure: f64, tolerance: f64) -> ViolationSeverity {
        let measure = measure.abs();
        if !measure.is_finite() {
            ViolationSeverity::Fatal
        } else if measure > tolerance {
            ViolationSeverity::Critical
        } else if measure > tolerance * self.warning_fraction {
            ViolationSeverity::Warning
        } else {
            ViolationSeverity::Acceptable
        }
    }
}

/// Jidoka guard configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JidokaConfig {
    /// Run the guards after every simulation.
    pub enabled: bool,
    /// Maximum allowed relative energy drift of the exact method.
    pub energy_tolerance: f64,
    /// NaN/Inf detection enabled.
    pub check_finite: bool,
    /// Maximum allowed deviation of `|r - attachment|` from L, relative to
    /// `max(L, |attachment|, 1)`.
    pub constraint_tolerance: f64,
    /// Enable energy conservation check.
    pub check_energy: bool,
    /// Severity classifier for graduated responses.
    pub severity_classifier: SeverityClassifier,
}

impl Default for JidokaConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            energy_tolerance: 1e-6,
            check_finite: true,
            constraint_tolerance: 1e-8,
            check_energy: true,
            severity_classifier: SeverityClassifier::default(),
        }
    }
}

impl JidokaConfig {
    pub(crate) fn validate_semantic(&self) -> SimResult<()> {
        if !(self.energy_tolerance.is_finite() && self.energy_tolerance > 0.0) {
            return Err(SimError::config("Jidoka energy_tolerance must be positive"));
        }
        if !(self.constraint_tolerance.is_finite() && self.constraint_tolerance > 0.0) {
            return Err(SimError::config("Jidoka constraint_tolerance must be positive"));
        }
        let fraction = self.severity_classifier.warning_fraction;
        if !(0.0..=1.0).contains(&fraction) {
            return Err(SimError::config(format!(
                "Jidoka warning_fraction must lie in [0, 1], got {fraction}"
            )));
        }
        Ok(())
    }
}

/// Outcome of a passed inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JidokaReport {
    /// Inspected method.
    pub method: Method,
    /// Largest scaled arm-length deviation, see
    /// [`JidokaGuard::max_arm_deviation`].
    pub max_constraint_violation: f64,
    /// Largest relative energy drift, when the energy check ran.
    pub max_energy_drift: Option<f64>,
    /// Worst severity seen.
    pub severity: ViolationSeverity,
    /// Non-fatal findings.
    pub warnings: Vec<JidokaWarning>,
}

/// Jidoka guard for trajectories.
///
/// # Example
///
/// ```rust
/// use pendulum2d::config::PendulumConfig;
/// use pendulum2d::engine::jidoka::JidokaGuard;
/// use pendulum2d::simulation::{simulate_method, Method};
///
/// let config = PendulumConfig::default();
/// let trajectory = simulate_method(&config, Method::Exact).unwrap();
/// let guard = JidokaGuard::from_config(&config);
/// assert!(guard.check(&config, &trajectory).is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct JidokaGuard {
    config: JidokaConfig,
}

impl JidokaGuard {
    /// Create a new Jidoka guard with given configuration.
    #[must_use]
    pub const fn new(config: JidokaConfig) -> Self {
        Self { config }
    }

    /// Create from run configuration.
    #[must_use]
    pub fn from_config(config: &PendulumConfig) -> Self {
        Self::new(config.jidoka.clone())
    }

    /// Get current configuration.
    #[must_use]
    pub const fn config(&self) -> &JidokaConfig {
        &self.config
    }

    /// Inspect a trajectory produced with `params`.
    ///
    /// Energy is only checked for [`Method::Exact`]; the small-angle
    /// solution conserves the linearized energy, not the true one.
    ///
    /// # Errors
    ///
    /// Returns `SimError` if any anomaly is detected:
    /// - `NonFiniteValue`: NaN or Inf found
    /// - `ConstraintViolation`: bob off the circle
    /// - `EnergyDrift`: energy conservation violated
    pub fn check(&self, params: &PendulumConfig, trajectory: &Trajectory) -> SimResult<JidokaReport> {
        if self.config.check_finite {
            Self::check_finite(trajectory)?;
        }

        let mut warnings = Vec::new();
        let mut severity = ViolationSeverity::Acceptable;

        let arm = PendulumArm::new(params.attachment, params.length);
        let max_constraint_violation = Self::max_arm_deviation(&arm, trajectory);
        let tolerance = self.config.constraint_tolerance;
        match self
            .config
            .severity_classifier
            .classify(max_constraint_violation, tolerance)
        {
            ViolationSeverity::Acceptable => {}
            ViolationSeverity::Warning => {
                warn!(
                    method = %trajectory.method,
                    violation = max_constraint_violation,
                    tolerance,
                    "arm length constraint approaching tolerance"
                );
                severity = severity.max(ViolationSeverity::Warning);
                warnings.push(JidokaWarning::ConstraintApproaching {
                    name: "arm_length".to_string(),
                    violation: max_constraint_violation,
                    tolerance,
                });
            }
            ViolationSeverity::Critical | ViolationSeverity::Fatal => {
                return Err(SimError::ConstraintViolation {
                    name: "arm_length".to_string(),
                    violation: max_constraint_violation,
                    tolerance,
                });
            }
        }

        let mut max_energy_drift = None;
        if self.config.check_energy && trajectory.method == Method::Exact {
            let drift = Self::max_energy_drift(params, trajectory);
            let tolerance = self.config.energy_tolerance;
            match self.config.severity_classifier.classify(drift, tolerance) {
                ViolationSeverity::Acceptable => {}
                ViolationSeverity::Warning => {
                    warn!(drift, tolerance, "energy drift approaching tolerance");
                    severity = severity.max(ViolationSeverity::Warning);
                    warnings.push(JidokaWarning::EnergyDriftApproaching { drift, tolerance });
                }
                ViolationSeverity::Critical | ViolationSeverity::Fatal => {
                    return Err(SimError::EnergyDrift { drift, tolerance });
                }
            }
            max_energy_drift = Some(drift);
        }

        Ok(JidokaReport {
            method: trajectory.method,
            max_constraint_violation,
            max_energy_drift,
            severity,
            warnings,
        })
    }

    fn check_finite(trajectory: &Trajectory) -> SimResult<()> {
        let method = trajectory.method;
        let scalars = [
            ("phi", &trajectory.phi),
            ("phi_dot", &trajectory.phi_dot),
            ("phi_double_dot", &trajectory.phi_double_dot),
        ];
        for (name, series) in scalars {
            if let Some(i) = series.iter().position(|v| !v.is_finite()) {
                return Err(SimError::NonFiniteValue {
                    location: format!("{method}.{name}[{i}]"),
                });
            }
        }

        let vectors = [
            ("r", &trajectory.r),
            ("r_dot", &trajectory.r_dot),
            ("r_double_dot", &trajectory.r_double_dot),
        ];
        for (name, series) in vectors {
            if let Some(i) = series.iter().position(|v| !v.is_finite()) {
                return Err(SimError::NonFiniteValue {
                    location: format!("{method}.{name}[{i}]"),
                });
            }
        }

        Ok(())
    }

    /// Largest `| |r - attachment| - L |` divided by
    /// `max(L, |attachment|, 1)`.
    ///
    /// Rounding in `attachment + L ê_r` grows with the magnitudes involved,
    /// so the deviation is measured against the largest of them.
    #[must_use]
    pub fn max_arm_deviation(arm: &PendulumArm, trajectory: &Trajectory) -> f64 {
        let scale = arm.length.max(arm.attachment.length()).max(1.0);
        trajectory
            .r
            .iter()
            .map(|&r| ((r - arm.attachment).length() - arm.length).abs() / scale)
            .fold(0.0, f64::max)
    }

    /// Largest `|E_i - E_0|` relative to `max(|E_0|, m g L)`.
    ///
    /// The `m g L` floor keeps the measure meaningful for runs that start
    /// at rest, where `E_0 = 0`.
    #[must_use]
    pub fn max_energy_drift(params: &PendulumConfig, trajectory: &Trajectory) -> f64 {
        let energy = trajectory.energy(params);
        let Some(&initial) = energy.first() else {
            return 0.0;
        };
        let scale = initial.abs().max(params.mass * params.g * params.length);
        energy
            .iter()
            .map(|e| (e - initial).abs() / scale)
            .fold(0.0, f64::max)
    }
}
