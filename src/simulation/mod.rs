//! Pendulum run: parameters in, aligned trajectories out.
//!
//! [`simulate`] is the single entry point the rendering layer needs. It
//! validates the parameters, builds the time grid, evaluates the
//! small-angle solution and integrates the exact ODE on that grid, maps
//! both angle series to Cartesian kinematics and finally runs the Jidoka
//! guards over the result.

mod bounds;

pub use bounds::{Extent, PlotBounds};

use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

use crate::config::PendulumConfig;
use crate::domains::kinematics::PendulumArm;
use crate::domains::ode::{solver_for, SolverStats};
use crate::engine::grid::TimeGrid;
use crate::engine::jidoka::{JidokaGuard, JidokaReport};
use crate::error::{SimError, SimResult};
use crate::scenarios::pendulum::{mechanical_energy, PendulumOde, SmallAngleSolution};

/// Scale applied to velocity arrows when none is chosen.
pub const VELOCITY_ARROW_SCALE: f64 = 0.5;

/// How the angle series was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// Closed-form small-angle approximation.
    Approx,
    /// Numerical integration of the exact ODE.
    Exact,
}

impl Method {
    /// Every method, in output order.
    pub const ALL: [Self; 2] = [Self::Approx, Self::Exact];

    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Approx => "approx",
            Self::Exact => "exact",
        }
    }

    /// Human-readable description.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Approx => "small angle approximation",
            Self::Exact => "numerical ode integration",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Method {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approx" => Ok(Self::Approx),
            "exact" => Ok(Self::Exact),
            other => Err(SimError::config(format!("Unknown method '{other}'"))),
        }
    }
}

/// Angle and kinematic series of one method, aligned with the time grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    /// Method that produced the series.
    pub method: Method,
    /// Angle (rad).
    pub phi: Vec<f64>,
    /// Angular velocity (rad/s).
    pub phi_dot: Vec<f64>,
    /// Angular acceleration (rad/s²).
    pub phi_double_dot: Vec<f64>,
    /// Bob position (m).
    pub r: Vec<DVec2>,
    /// Bob velocity (m/s).
    pub r_dot: Vec<DVec2>,
    /// Bob acceleration (m/s²).
    pub r_double_dot: Vec<DVec2>,
}

/// One sample of a trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Angle (rad).
    pub phi: f64,
    /// Angular velocity (rad/s).
    pub phi_dot: f64,
    /// Angular acceleration (rad/s²).
    pub phi_double_dot: f64,
    /// Position (m).
    pub r: DVec2,
    /// Velocity (m/s).
    pub r_dot: DVec2,
    /// Acceleration (m/s²).
    pub r_double_dot: DVec2,
}

impl Trajectory {
    /// Assemble a trajectory from angle series, deriving the kinematics.
    #[must_use]
    pub fn from_angles(
        method: Method,
        arm: &PendulumArm,
        phi: Vec<f64>,
        phi_dot: Vec<f64>,
        phi_double_dot: Vec<f64>,
    ) -> Self {
        let r = arm.positions(&phi);
        let r_dot = arm.velocities(&phi, &phi_dot);
        let r_double_dot = arm.accelerations(&phi, &phi_dot, &phi_double_dot);
        Self {
            method,
            phi,
            phi_dot,
            phi_double_dot,
            r,
            r_dot,
            r_double_dot,
        }
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.phi.len()
    }

    /// Whether the trajectory has no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.phi.is_empty()
    }

    /// Sample `i`, if it exists.
    #[must_use]
    pub fn sample(&self, i: usize) -> Option<Sample> {
        Some(Sample {
            phi: *self.phi.get(i)?,
            phi_dot: *self.phi_dot.get(i)?,
            phi_double_dot: *self.phi_double_dot.get(i)?,
            r: *self.r.get(i)?,
            r_dot: *self.r_dot.get(i)?,
            r_double_dot: *self.r_double_dot.get(i)?,
        })
    }

    /// Total mechanical energy at every sample.
    #[must_use]
    pub fn energy(&self, config: &PendulumConfig) -> Vec<f64> {
        self.phi
            .iter()
            .zip(&self.phi_dot)
            .map(|(&p, &pd)| mechanical_energy(config, p, pd))
            .collect()
    }

    /// Whether all six series have length `len`.
    #[must_use]
    pub fn is_aligned(&self, len: usize) -> bool {
        self.phi.len() == len
            && self.phi_dot.len() == len
            && self.phi_double_dot.len() == len
            && self.r.len() == len
            && self.r_dot.len() == len
            && self.r_double_dot.len() == len
    }
}

/// Every method's sample at one grid index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Grid index.
    pub index: usize,
    /// Sample time (s).
    pub t: f64,
    /// Per-method samples.
    pub samples: BTreeMap<Method, Sample>,
}

/// Result of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationData {
    /// Arm used to map angles to positions.
    pub arm: PendulumArm,
    /// Shared sample grid.
    pub grid: TimeGrid,
    /// Per-method trajectories, keyed `"approx"` / `"exact"` when serialized.
    pub trajectories: BTreeMap<Method, Trajectory>,
    /// Work done by the ODE solver for the exact method.
    pub solver_stats: SolverStats,
    /// Guard reports, empty when the guards are disabled.
    #[serde(default)]
    pub reports: BTreeMap<Method, JidokaReport>,
}

impl SimulationData {
    /// Trajectory of one method.
    #[must_use]
    pub fn trajectory(&self, method: Method) -> Option<&Trajectory> {
        self.trajectories.get(&method)
    }

    /// Number of grid samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.grid.len()
    }

    /// Whether the run has no samples. Never true for a completed run.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }

    /// Snapshot of every method at grid index `i`.
    #[must_use]
    pub fn frame(&self, i: usize) -> Option<Frame> {
        let t = self.grid.get(i)?;
        let samples = self
            .trajectories
            .iter()
            .map(|(&method, traj)| traj.sample(i).map(|s| (method, s)))
            .collect::<Option<BTreeMap<_, _>>>()?;
        Some(Frame {
            index: i,
            t,
            samples,
        })
    }

    /// Iterate over all frames in time order.
    pub fn frames(&self) -> impl Iterator<Item = Frame> + '_ {
        (0..self.len()).filter_map(|i| self.frame(i))
    }

    /// Velocity arrow of `method` at grid index `i`: start point and
    /// `scale`-scaled velocity. Renderers default to
    /// [`VELOCITY_ARROW_SCALE`].
    #[must_use]
    pub fn velocity_arrow(&self, i: usize, method: Method, scale: f64) -> Option<(DVec2, DVec2)> {
        let traj = self.trajectory(method)?;
        Some((*traj.r.get(i)?, *traj.r_dot.get(i)? * scale))
    }

    /// Axis extents for plotting this run.
    #[must_use]
    pub fn plot_bounds(&self) -> PlotBounds {
        PlotBounds::from_data(self)
    }

    /// BLAKE3 digest over the bit patterns of the grid and every series.
    ///
    /// Two runs are bitwise identical iff their fingerprints match.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        let mut put = |v: f64| {
            hasher.update(&v.to_bits().to_le_bytes());
        };
        self.grid.times().iter().copied().for_each(&mut put);
        for (method, traj) in &self.trajectories {
            put(f64::from(*method as u8));
            for series in [&traj.phi, &traj.phi_dot, &traj.phi_double_dot] {
                series.iter().copied().for_each(&mut put);
            }
            for series in [&traj.r, &traj.r_dot, &traj.r_double_dot] {
                for v in series {
                    put(v.x);
                    put(v.y);
                }
            }
        }
        hasher.finalize().to_hex().to_string()
    }
}

/// Small-angle trajectory on `grid`.
#[must_use]
pub fn approx_trajectory(config: &PendulumConfig, grid: &TimeGrid) -> Trajectory {
    let solution = SmallAngleSolution::from_config(config);
    let times = grid.times();
    let phi: Vec<f64> = times.iter().map(|&t| solution.phi(t)).collect();
    let phi_dot = times.iter().map(|&t| solution.phi_dot(t)).collect();
    let phi_double_dot = times.iter().map(|&t| solution.phi_double_dot(t)).collect();
    let arm = PendulumArm::new(config.attachment, config.length);
    Trajectory::from_angles(Method::Approx, &arm, phi, phi_dot, phi_double_dot)
}

/// Exact-ODE trajectory on `grid`, with the solver's work counters.
///
/// # Errors
///
/// Returns `SimError::Integration` if the solver fails.
pub fn exact_trajectory(
    config: &PendulumConfig,
    grid: &TimeGrid,
) -> SimResult<(Trajectory, SolverStats)> {
    let ode = PendulumOde::from_config(config);
    let solver = solver_for::<2>(&config.solver);
    let solution = solver.solve(&ode, [config.phi_0, config.phi_dot_0], grid.times())?;

    let (phi, phi_dot): (Vec<f64>, Vec<f64>) =
        solution.states.iter().map(|y| (y[0], y[1])).unzip();
    let phi_double_dot = phi.iter().map(|&p| ode.phi_double_dot(p)).collect();
    let arm = PendulumArm::new(config.attachment, config.length);
    let trajectory = Trajectory::from_angles(Method::Exact, &arm, phi, phi_dot, phi_double_dot);
    Ok((trajectory, solution.stats))
}

/// Run one method.
///
/// # Errors
///
/// Returns error if the parameters are invalid or integration fails.
pub fn simulate_method(config: &PendulumConfig, method: Method) -> SimResult<Trajectory> {
    config.validate_all()?;
    let grid = TimeGrid::from_config(config)?;
    match method {
        Method::Approx => Ok(approx_trajectory(config, &grid)),
        Method::Exact => exact_trajectory(config, &grid).map(|(traj, _)| traj),
    }
}

/// Run both methods and the guards.
///
/// # Errors
///
/// Returns error if:
/// - the parameters are invalid (before any computation)
/// - the ODE solver fails
/// - a guard detects an anomaly (when guards are enabled)
pub fn simulate(config: &PendulumConfig) -> SimResult<SimulationData> {
    config.validate_all()?;
    let grid = TimeGrid::from_config(config)?;

    info!(
        samples = grid.len(),
        length = config.length,
        phi_0 = config.phi_0,
        phi_dot_0 = config.phi_dot_0,
        solver = ?config.solver.method,
        "starting pendulum run"
    );

    let approx = approx_trajectory(config, &grid);
    let (exact, solver_stats) = exact_trajectory(config, &grid)?;

    debug!(
        accepted = solver_stats.accepted_steps,
        rejected = solver_stats.rejected_steps,
        rhs_evaluations = solver_stats.rhs_evaluations,
        "exact integration finished"
    );

    let mut reports = BTreeMap::new();
    if config.jidoka.enabled {
        let guard = JidokaGuard::from_config(config);
        for traj in [&approx, &exact] {
            reports.insert(traj.method, guard.check(config, traj)?);
        }
    }

    let trajectories = BTreeMap::from([(Method::Approx, approx), (Method::Exact, exact)]);

    info!(samples = grid.len(), "pendulum run finished");

    Ok(SimulationData {
        arm: PendulumArm::new(config.attachment, config.length),
        grid,
        trajectories,
        solver_stats,
        reports,
    })
}
