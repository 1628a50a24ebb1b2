//! Configuration system with YAML schema and validation.
//!
//! A [`PendulumConfig`] holds every constant a run depends on: the physical
//! parameters, the timing of the sample grid, the ODE solver settings and
//! the post-run guard thresholds. It is checked twice before any
//! computation starts:
//! - schema ranges via `validator`
//! - semantic constraints that span several fields

use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

use crate::engine::jidoka::JidokaConfig;
use crate::error::{SimError, SimResult};

/// Upper bound on the number of grid samples a single run may request.
pub const MAX_SAMPLES: usize = 10_000_000;

/// Relative slack used when turning `fps * t_max` into a sample count, so
/// that products like `60 * 10.000000000000002` do not gain a sample.
const SAMPLE_COUNT_SLACK: f64 = 1e-12;

/// Parameters of a pendulum run.
///
/// Loaded from YAML files with full schema validation, or built in code
/// with [`PendulumConfig::builder`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct PendulumConfig {
    /// Schema version for forward compatibility.
    #[validate(length(min = 1))]
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Pendulum length L (m).
    #[validate(range(exclusive_min = 0.0))]
    #[serde(default = "default_length")]
    pub length: f64,

    /// Gravitational acceleration g (m/s²).
    #[validate(range(exclusive_min = 0.0))]
    #[serde(default = "default_g")]
    pub g: f64,

    /// Initial angle from the downward vertical (rad).
    #[serde(default = "default_phi_0")]
    pub phi_0: f64,

    /// Initial angular velocity (rad/s).
    #[serde(default)]
    pub phi_dot_0: f64,

    /// Frame rate of the sample grid (Hz).
    #[validate(range(min = 1))]
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// End time of the simulation (s), exclusive.
    #[validate(range(exclusive_min = 0.0))]
    #[serde(default = "default_t_max")]
    pub t_max: f64,

    /// Fixed point the pendulum hangs from (m).
    #[serde(default)]
    pub attachment: DVec2,

    /// Mass of the bob (kg). Only affects reported energies.
    #[validate(range(exclusive_min = 0.0))]
    #[serde(default = "default_mass")]
    pub mass: f64,

    /// ODE solver settings for the exact method.
    #[validate(nested)]
    #[serde(default)]
    pub solver: SolverConfig,

    /// Post-run guard configuration.
    #[serde(default)]
    pub jidoka: JidokaConfig,
}

fn default_schema_version() -> String {
    "1.0".to_string()
}

const fn default_length() -> f64 {
    1.0
}

const fn default_g() -> f64 {
    9.81
}

const fn default_phi_0() -> f64 {
    0.8
}

const fn default_fps() -> u32 {
    60
}

const fn default_t_max() -> f64 {
    10.0
}

const fn default_mass() -> f64 {
    1.0
}

impl Default for PendulumConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            length: default_length(),
            g: default_g(),
            phi_0: default_phi_0(),
            phi_dot_0: 0.0,
            fps: default_fps(),
            t_max: default_t_max(),
            attachment: DVec2::ZERO,
            mass: default_mass(),
            solver: SolverConfig::default(),
            jidoka: JidokaConfig::default(),
        }
    }
}

impl PendulumConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - YAML parsing fails
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> SimResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string.
    ///
    /// # Errors
    ///
    /// Returns error if parsing or validation fails.
    pub fn from_yaml(yaml: &str) -> SimResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Serialize to YAML.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_yaml(&self) -> SimResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Create a builder for configuration.
    #[must_use]
    pub fn builder() -> PendulumConfigBuilder {
        PendulumConfigBuilder::default()
    }

    /// Small initial deflection, where both methods agree closely.
    #[must_use]
    pub fn small_angle() -> Self {
        Self {
            phi_0: 0.05,
            ..Default::default()
        }
    }

    /// Horizontal release, well outside the linear regime.
    #[must_use]
    pub fn large_angle() -> Self {
        Self {
            phi_0: std::f64::consts::FRAC_PI_2,
            ..Default::default()
        }
    }

    /// Pendulum hanging still at its lowest point.
    #[must_use]
    pub fn at_rest() -> Self {
        Self {
            phi_0: 0.0,
            phi_dot_0: 0.0,
            ..Default::default()
        }
    }

    /// Run schema and semantic validation.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate_all(&self) -> SimResult<()> {
        self.validate_semantic()?;
        self.validate()?;
        Ok(())
    }

    /// Validate constraints beyond the schema ranges.
    fn validate_semantic(&self) -> SimResult<()> {
        let scalars = [
            ("length", self.length),
            ("g", self.g),
            ("phi_0", self.phi_0),
            ("phi_dot_0", self.phi_dot_0),
            ("t_max", self.t_max),
            ("mass", self.mass),
            ("attachment.x", self.attachment.x),
            ("attachment.y", self.attachment.y),
        ];
        for (name, value) in scalars {
            if !value.is_finite() {
                return Err(SimError::config(format!("{name} must be finite, got {value}")));
            }
        }

        if self.length <= 0.0 {
            return Err(SimError::config(format!(
                "Pendulum length must be positive, got {}",
                self.length
            )));
        }
        if self.g <= 0.0 {
            return Err(SimError::config(format!(
                "Gravitational acceleration must be positive, got {}",
                self.g
            )));
        }
        if self.mass <= 0.0 {
            return Err(SimError::config(format!("Mass must be positive, got {}", self.mass)));
        }
        if self.fps == 0 {
            return Err(SimError::config("Frame rate must be at least 1 Hz"));
        }
        if self.t_max <= 0.0 {
            return Err(SimError::config(format!(
                "Duration must be positive, got {}",
                self.t_max
            )));
        }

        let samples = self.raw_sample_count();
        if samples < 1.0 {
            return Err(SimError::config("Time grid would be empty"));
        }
        if samples > MAX_SAMPLES as f64 {
            return Err(SimError::config(format!(
                "Time grid of {samples} samples exceeds the limit of {MAX_SAMPLES}"
            )));
        }

        self.solver.validate_semantic(self.dt())?;
        self.jidoka.validate_semantic()?;

        Ok(())
    }

    /// Natural angular frequency of small oscillations, `sqrt(g/L)`.
    #[must_use]
    pub fn omega(&self) -> f64 {
        (self.g / self.length).sqrt()
    }

    /// Frame interval `1/fps` in seconds.
    #[must_use]
    pub fn dt(&self) -> f64 {
        1.0 / f64::from(self.fps)
    }

    /// Period of small oscillations, `2π sqrt(L/g)`.
    #[must_use]
    pub fn small_angle_period(&self) -> f64 {
        2.0 * std::f64::consts::PI / self.omega()
    }

    /// Number of grid samples `t_i = i*dt` with `t_i < t_max`.
    #[must_use]
    pub fn sample_count(&self) -> usize {
        let raw = self.raw_sample_count();
        if raw.is_finite() && raw > 0.0 {
            raw as usize
        } else {
            0
        }
    }

    fn raw_sample_count(&self) -> f64 {
        let product = f64::from(self.fps) * self.t_max;
        (product - product.abs() * SAMPLE_COUNT_SLACK).ceil()
    }
}

/// Configuration builder for programmatic construction.
#[derive(Debug, Default)]
pub struct PendulumConfigBuilder {
    length: Option<f64>,
    g: Option<f64>,
    phi_0: Option<f64>,
    phi_dot_0: Option<f64>,
    fps: Option<u32>,
    t_max: Option<f64>,
    attachment: Option<DVec2>,
    mass: Option<f64>,
    solver: Option<SolverConfig>,
    jidoka: Option<JidokaConfig>,
}

impl PendulumConfigBuilder {
    /// Set the pendulum length in meters.
    #[must_use]
    pub const fn length(mut self, length: f64) -> Self {
        self.length = Some(length);
        self
    }

    /// Set the gravitational acceleration in m/s².
    #[must_use]
    pub const fn g(mut self, g: f64) -> Self {
        self.g = Some(g);
        self
    }

    /// Set the initial angle in radians.
    #[must_use]
    pub const fn phi_0(mut self, phi_0: f64) -> Self {
        self.phi_0 = Some(phi_0);
        self
    }

    /// Set the initial angular velocity in rad/s.
    #[must_use]
    pub const fn phi_dot_0(mut self, phi_dot_0: f64) -> Self {
        self.phi_dot_0 = Some(phi_dot_0);
        self
    }

    /// Set the frame rate in Hz.
    #[must_use]
    pub const fn fps(mut self, fps: u32) -> Self {
        self.fps = Some(fps);
        self
    }

    /// Set the end time in seconds.
    #[must_use]
    pub const fn t_max(mut self, t_max: f64) -> Self {
        self.t_max = Some(t_max);
        self
    }

    /// Set the attachment point.
    #[must_use]
    pub const fn attachment(mut self, attachment: DVec2) -> Self {
        self.attachment = Some(attachment);
        self
    }

    /// Set the bob mass in kilograms.
    #[must_use]
    pub const fn mass(mut self, mass: f64) -> Self {
        self.mass = Some(mass);
        self
    }

    /// Set the solver configuration.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn solver(mut self, solver: SolverConfig) -> Self {
        self.solver = Some(solver);
        self
    }

    /// Set Jidoka configuration.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn jidoka(mut self, config: JidokaConfig) -> Self {
        self.jidoka = Some(config);
        self
    }

    /// Build the configuration.
    ///
    /// Values are not checked here; [`crate::simulation::simulate`] rejects
    /// invalid parameters before it does any work.
    #[must_use]
    pub fn build(self) -> PendulumConfig {
        let defaults = PendulumConfig::default();
        PendulumConfig {
            length: self.length.unwrap_or(defaults.length),
            g: self.g.unwrap_or(defaults.g),
            phi_0: self.phi_0.unwrap_or(defaults.phi_0),
            phi_dot_0: self.phi_dot_0.unwrap_or(defaults.phi_dot_0),
            fps: self.fps.unwrap_or(defaults.fps),
            t_max: self.t_max.unwrap_or(defaults.t_max),
            attachment: self.attachment.unwrap_or(defaults.attachment),
            mass: self.mass.unwrap_or(defaults.mass),
            solver: self.solver.unwrap_or(defaults.solver),
            jidoka: self.jidoka.unwrap_or(defaults.jidoka),
            schema_version: defaults.schema_version,
        }
    }
}

/// ODE solver used for the exact method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SolverMethod {
    /// Adaptive Dormand-Prince 5(4).
    #[default]
    DormandPrince,
    /// Classical Runge-Kutta 4th order with fixed sub-steps.
    Rk4,
}

/// Solver configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SolverConfig {
    /// Which solver to run.
    #[serde(default)]
    pub method: SolverMethod,
    /// Relative local error tolerance (adaptive only).
    #[validate(range(exclusive_min = 0.0))]
    #[serde(default = "default_rtol")]
    pub rtol: f64,
    /// Absolute local error tolerance (adaptive only).
    #[validate(range(exclusive_min = 0.0))]
    #[serde(default = "default_atol")]
    pub atol: f64,
    /// Smallest step the adaptive solver may take before giving up (s).
    #[validate(range(exclusive_min = 0.0))]
    #[serde(default = "default_min_step")]
    pub min_step: f64,
    /// Step budget for the whole run.
    #[validate(range(min = 1))]
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    /// Fixed sub-steps per grid interval (RK4 only).
    #[validate(range(min = 1))]
    #[serde(default = "default_substeps")]
    pub substeps: u32,
}

const fn default_rtol() -> f64 {
    1e-10
}

const fn default_atol() -> f64 {
    1e-12
}

const fn default_min_step() -> f64 {
    1e-12
}

const fn default_max_steps() -> usize {
    10_000_000
}

const fn default_substeps() -> u32 {
    10
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            method: SolverMethod::default(),
            rtol: default_rtol(),
            atol: default_atol(),
            min_step: default_min_step(),
            max_steps: default_max_steps(),
            substeps: default_substeps(),
        }
    }
}

impl SolverConfig {
    /// Fixed-step RK4 with the given number of sub-steps per frame.
    #[must_use]
    pub fn rk4(substeps: u32) -> Self {
        Self {
            method: SolverMethod::Rk4,
            substeps,
            ..Default::default()
        }
    }

    fn validate_semantic(&self, dt: f64) -> SimResult<()> {
        if !(self.rtol.is_finite() && self.rtol > 0.0) {
            return Err(SimError::config("Solver rtol must be positive and finite"));
        }
        if !(self.atol.is_finite() && self.atol > 0.0) {
            return Err(SimError::config("Solver atol must be positive and finite"));
        }
        if !(self.min_step.is_finite() && self.min_step > 0.0) {
            return Err(SimError::config("Solver min_step must be positive and finite"));
        }
        if self.min_step >= dt {
            return Err(SimError::config(format!(
                "Solver min_step {} must be smaller than the frame interval {dt}",
                self.min_step
            )));
        }
        if self.substeps == 0 {
            return Err(SimError::config("Solver substeps must be at least 1"));
        }
        if self.max_steps == 0 {
            return Err(SimError::config("Solver max_steps must be at least 1"));
        }
        Ok(())
    }
}
