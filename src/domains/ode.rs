//! Numerical solvers for first-order ODE systems `y' = f(t, y)`.
//!
//! Two solvers sample a solution on a caller-supplied time grid:
//! - [`DormandPrince45`]: adaptive embedded Runge-Kutta 5(4), local error
//!   controlled per step
//! - [`Rk4Solver`]: classical RK4 with a fixed number of sub-steps between
//!   consecutive grid times
//!
//! Both land exactly on every grid time and fail with
//! [`SimError::Integration`] rather than return a partial solution.

use serde::{Deserialize, Serialize};

use crate::config::{SolverConfig, SolverMethod};
use crate::error::{SimError, SimResult};

/// Right-hand side of a first-order system with `N` state variables.
pub trait OdeSystem<const N: usize> {
    /// Evaluate `dy/dt` at time `t` and state `y`.
    fn rhs(&self, t: f64, y: &[f64; N], dydt: &mut [f64; N]);
}

/// Work counters of a solver run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverStats {
    /// Steps that were kept.
    pub accepted_steps: usize,
    /// Steps discarded by error control.
    pub rejected_steps: usize,
    /// Right-hand side evaluations.
    pub rhs_evaluations: usize,
}

/// States sampled on a time grid.
#[derive(Debug, Clone, PartialEq)]
pub struct OdeSolution<const N: usize> {
    /// One state per requested time.
    pub states: Vec<[f64; N]>,
    /// Work done to produce them.
    pub stats: SolverStats,
}

/// Solver that samples an initial value problem on a time grid.
pub trait OdeSolver<const N: usize> {
    /// Integrate from `times[0]` with state `y0` and return the state at
    /// every entry of `times`. `times` must be strictly increasing.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Integration` if the solver cannot advance, and
    /// `SimError::Config` if `times` is empty or not increasing.
    fn solve(
        &self,
        system: &dyn OdeSystem<N>,
        y0: [f64; N],
        times: &[f64],
    ) -> SimResult<OdeSolution<N>>;

    /// Order of the propagated solution.
    fn error_order(&self) -> u32;

    /// Whether the step size adapts to the local error.
    fn is_adaptive(&self) -> bool;
}

/// Create the solver selected by a configuration.
#[must_use]
pub fn solver_for<const N: usize>(config: &SolverConfig) -> Box<dyn OdeSolver<N>> {
    match config.method {
        SolverMethod::DormandPrince => Box::new(DormandPrince45::from_config(config)),
        SolverMethod::Rk4 => Box::new(Rk4Solver::from_config(config)),
    }
}

fn check_times(times: &[f64]) -> SimResult<()> {
    if times.is_empty() {
        return Err(SimError::config("Solver needs at least one sample time"));
    }
    if times.iter().any(|t| !t.is_finite()) {
        return Err(SimError::config("Sample times must be finite"));
    }
    if times.windows(2).any(|w| w[1] <= w[0]) {
        return Err(SimError::config("Sample times must be strictly increasing"));
    }
    Ok(())
}

fn all_finite<const N: usize>(y: &[f64; N]) -> bool {
    y.iter().all(|v| v.is_finite())
}

/// `out = y + h * Σ coeffs[j] * k[j]`
fn combine<const N: usize>(y: &[f64; N], h: f64, terms: &[(f64, &[f64; N])]) -> [f64; N] {
    let mut out = *y;
    for (i, o) in out.iter_mut().enumerate() {
        let mut acc = 0.0;
        for (c, k) in terms {
            acc += c * k[i];
        }
        *o += h * acc;
    }
    out
}

// Dormand-Prince 5(4) tableau.
const C2: f64 = 1.0 / 5.0;
const C3: f64 = 3.0 / 10.0;
const C4: f64 = 4.0 / 5.0;
const C5: f64 = 8.0 / 9.0;

const A21: f64 = 1.0 / 5.0;
const A31: f64 = 3.0 / 40.0;
const A32: f64 = 9.0 / 40.0;
const A41: f64 = 44.0 / 45.0;
const A42: f64 = -56.0 / 15.0;
const A43: f64 = 32.0 / 9.0;
const A51: f64 = 19372.0 / 6561.0;
const A52: f64 = -25360.0 / 2187.0;
const A53: f64 = 64448.0 / 6561.0;
const A54: f64 = -212.0 / 729.0;
const A61: f64 = 9017.0 / 3168.0;
const A62: f64 = -355.0 / 33.0;
const A63: f64 = 46732.0 / 5247.0;
const A64: f64 = 49.0 / 176.0;
const A65: f64 = -5103.0 / 18656.0;

// 5th-order weights (also the last stage row, so k7 is FSAL).
const B1: f64 = 35.0 / 384.0;
const B3: f64 = 500.0 / 1113.0;
const B4: f64 = 125.0 / 192.0;
const B5: f64 = -2187.0 / 6784.0;
const B6: f64 = 11.0 / 84.0;

// Difference between 5th- and 4th-order weights.
const E1: f64 = 71.0 / 57600.0;
const E3: f64 = -71.0 / 16695.0;
const E4: f64 = 71.0 / 1920.0;
const E5: f64 = -17253.0 / 339_200.0;
const E6: f64 = 22.0 / 525.0;
const E7: f64 = -1.0 / 40.0;

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 5.0;

/// Adaptive Dormand-Prince 5(4) solver.
///
/// Local error estimate of each step is scaled per component:
///
/// ```text
/// err = max_i |e_i| / (atol + rtol * max(|y_i|, |y_new_i|))
/// ```
///
/// A step is accepted when `err <= 1`. The next step size is
/// `h * clamp(0.9 * err^(-1/5), 0.2, 5)`. Steps are shortened to land on
/// each grid time; the solution is propagated with the 5th-order weights.
#[derive(Debug, Clone, PartialEq)]
pub struct DormandPrince45 {
    /// Relative tolerance.
    pub rtol: f64,
    /// Absolute tolerance.
    pub atol: f64,
    /// Step size below which the solver gives up.
    pub min_step: f64,
    /// Maximum number of attempted steps.
    pub max_steps: usize,
}

impl Default for DormandPrince45 {
    fn default() -> Self {
        Self::from_config(&SolverConfig::default())
    }
}

impl DormandPrince45 {
    /// Create a solver with the given tolerances.
    #[must_use]
    pub fn new(rtol: f64, atol: f64) -> Self {
        Self {
            rtol,
            atol,
            ..Self::default()
        }
    }

    /// Create from solver configuration.
    #[must_use]
    pub const fn from_config(config: &SolverConfig) -> Self {
        Self {
            rtol: config.rtol,
            atol: config.atol,
            min_step: config.min_step,
            max_steps: config.max_steps,
        }
    }

    fn scaled_error<const N: usize>(&self, y: &[f64; N], y_new: &[f64; N], e: &[f64; N]) -> f64 {
        let mut err: f64 = 0.0;
        for i in 0..N {
            let scale = self.atol + self.rtol * y[i].abs().max(y_new[i].abs());
            err = err.max((e[i] / scale).abs());
        }
        err
    }

    /// Starting step from the size of the state and its derivative.
    fn initial_step<const N: usize>(y: &[f64; N], f: &[f64; N], span: f64) -> f64 {
        let d0 = y.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        let d1 = f.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        let h = if d0 < 1e-5 || d1 < 1e-5 {
            1e-6
        } else {
            0.01 * d0 / d1
        };
        h.min(span)
    }
}

impl<const N: usize> OdeSolver<N> for DormandPrince45 {
    #[allow(clippy::many_single_char_names)]
    fn solve(
        &self,
        system: &dyn OdeSystem<N>,
        y0: [f64; N],
        times: &[f64],
    ) -> SimResult<OdeSolution<N>> {
        check_times(times)?;
        if !all_finite(&y0) {
            return Err(SimError::integration(times[0], "initial state is not finite"));
        }

        let mut stats = SolverStats::default();
        let mut states = Vec::with_capacity(times.len());
        states.push(y0);

        let mut t = times[0];
        let mut y = y0;
        let mut k1 = [0.0; N];
        system.rhs(t, &y, &mut k1);
        stats.rhs_evaluations += 1;

        let span = times[times.len() - 1] - t;
        let mut h = Self::initial_step(&y, &k1, span.max(f64::MIN_POSITIVE));

        let (mut k2, mut k3, mut k4, mut k5, mut k6, mut k7) =
            ([0.0; N], [0.0; N], [0.0; N], [0.0; N], [0.0; N], [0.0; N]);

        for &target in &times[1..] {
            while t < target {
                if stats.accepted_steps + stats.rejected_steps >= self.max_steps {
                    return Err(SimError::integration(
                        t,
                        format!("step budget of {} exhausted", self.max_steps),
                    ));
                }

                let remaining = target - t;
                let lands = h >= remaining;
                let step = if lands { remaining } else { h };

                let y2 = combine(&y, step, &[(A21, &k1)]);
                system.rhs(t + C2 * step, &y2, &mut k2);
                let y3 = combine(&y, step, &[(A31, &k1), (A32, &k2)]);
                system.rhs(t + C3 * step, &y3, &mut k3);
                let y4 = combine(&y, step, &[(A41, &k1), (A42, &k2), (A43, &k3)]);
                system.rhs(t + C4 * step, &y4, &mut k4);
                let y5 = combine(&y, step, &[(A51, &k1), (A52, &k2), (A53, &k3), (A54, &k4)]);
                system.rhs(t + C5 * step, &y5, &mut k5);
                let y6 = combine(
                    &y,
                    step,
                    &[(A61, &k1), (A62, &k2), (A63, &k3), (A64, &k4), (A65, &k5)],
                );
                system.rhs(t + step, &y6, &mut k6);
                let y_new = combine(
                    &y,
                    step,
                    &[(B1, &k1), (B3, &k3), (B4, &k4), (B5, &k5), (B6, &k6)],
                );
                let t_new = if lands { target } else { t + step };
                system.rhs(t_new, &y_new, &mut k7);
                stats.rhs_evaluations += 6;

                let zero = [0.0; N];
                let e = combine(
                    &zero,
                    step,
                    &[(E1, &k1), (E3, &k3), (E4, &k4), (E5, &k5), (E6, &k6), (E7, &k7)],
                );
                let err = self.scaled_error(&y, &y_new, &e);
                let finite = err.is_finite() && all_finite(&y_new) && all_finite(&k7);

                let factor = if !finite {
                    MIN_FACTOR
                } else if err == 0.0 {
                    MAX_FACTOR
                } else {
                    (SAFETY * err.powf(-0.2)).clamp(MIN_FACTOR, MAX_FACTOR)
                };

                if finite && err <= 1.0 {
                    stats.accepted_steps += 1;
                    t = t_new;
                    y = y_new;
                    k1 = k7;
                    // A step shortened to hit the grid says little about the
                    // step the dynamics allow, so never shrink below it.
                    h = if lands { h.max(step * factor) } else { step * factor };
                } else {
                    stats.rejected_steps += 1;
                    h = step * factor.min(1.0);
                }

                if h < self.min_step {
                    return Err(SimError::integration(
                        t,
                        format!("step size {h:.3e} fell below minimum {:.3e}", self.min_step),
                    ));
                }
            }
            states.push(y);
        }

        Ok(OdeSolution { states, stats })
    }

    fn error_order(&self) -> u32 {
        5
    }

    fn is_adaptive(&self) -> bool {
        true
    }
}

/// Classical Runge-Kutta 4th order with fixed sub-steps.
///
/// Each grid interval `[t_i, t_{i+1}]` is split into `substeps` equal
/// steps:
///
/// ```text
/// k1 = f(t, y)
/// k2 = f(t + h/2, y + h/2 k1)
/// k3 = f(t + h/2, y + h/2 k2)
/// k4 = f(t + h, y + h k3)
/// y' = y + h/6 (k1 + 2 k2 + 2 k3 + k4)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rk4Solver {
    /// Steps per grid interval.
    pub substeps: u32,
    /// Maximum number of steps.
    pub max_steps: usize,
}

impl Default for Rk4Solver {
    fn default() -> Self {
        Self::from_config(&SolverConfig::rk4(10))
    }
}

impl Rk4Solver {
    /// Create a solver taking `substeps` steps per grid interval.
    #[must_use]
    pub fn new(substeps: u32) -> Self {
        Self {
            substeps: substeps.max(1),
            ..Self::default()
        }
    }

    /// Create from solver configuration.
    #[must_use]
    pub fn from_config(config: &SolverConfig) -> Self {
        Self {
            substeps: config.substeps.max(1),
            max_steps: config.max_steps,
        }
    }
}

impl<const N: usize> OdeSolver<N> for Rk4Solver {
    fn solve(
        &self,
        system: &dyn OdeSystem<N>,
        y0: [f64; N],
        times: &[f64],
    ) -> SimResult<OdeSolution<N>> {
        check_times(times)?;
        if !all_finite(&y0) {
            return Err(SimError::integration(times[0], "initial state is not finite"));
        }

        let mut stats = SolverStats::default();
        let mut states = Vec::with_capacity(times.len());
        states.push(y0);

        let mut y = y0;
        let (mut k1, mut k2, mut k3, mut k4) = ([0.0; N], [0.0; N], [0.0; N], [0.0; N]);

        for w in times.windows(2) {
            let (start, end) = (w[0], w[1]);
            let h = (end - start) / f64::from(self.substeps);
            let half = h / 2.0;

            for s in 0..self.substeps {
                if stats.accepted_steps >= self.max_steps {
                    return Err(SimError::integration(
                        start,
                        format!("step budget of {} exhausted", self.max_steps),
                    ));
                }
                let t = start + f64::from(s) * h;

                system.rhs(t, &y, &mut k1);
                system.rhs(t + half, &combine(&y, half, &[(1.0, &k1)]), &mut k2);
                system.rhs(t + half, &combine(&y, half, &[(1.0, &k2)]), &mut k3);
                system.rhs(t + h, &combine(&y, h, &[(1.0, &k3)]), &mut k4);
                y = combine(
                    &y,
                    h / 6.0,
                    &[(1.0, &k1), (2.0, &k2), (2.0, &k3), (1.0, &k4)],
                );
                stats.rhs_evaluations += 4;
                stats.accepted_steps += 1;

                if !all_finite(&y) {
                    return Err(SimError::integration(t + h, "state became non-finite"));
                }
            }
            states.push(y);
        }

        Ok(OdeSolution { states, stats })
    }

    fn error_order(&self) -> u32 {
        4
    }

    fn is_adaptive(&self) -> bool {
        false
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    struct Harmonic {
        omega: f64,
    }

    impl OdeSystem<2> for Harmonic {
        fn rhs(&self, _t: f64, y: &[f64; 2], dydt: &mut [f64; 2]) {
            dydt[0] = y[1];
            dydt[1] = -self.omega * self.omega * y[0];
        }
    }

    proptest! {
        /// Adaptive solution of a harmonic oscillator tracks the closed form.
        #[test]
        fn prop_dopri_matches_closed_form(
            omega in 0.5f64..5.0,
            y0 in -2.0f64..2.0,
            v0 in -2.0f64..2.0,
        ) {
            let times: Vec<f64> = (0..100).map(|i| f64::from(i) * 0.05).collect();
            let sol = DormandPrince45::new(1e-10, 1e-12)
                .solve(&Harmonic { omega }, [y0, v0], &times);
            prop_assert!(sol.is_ok());
            if let Ok(sol) = sol {
                for (t, y) in times.iter().zip(&sol.states) {
                    let expected = y0 * (omega * t).cos() + v0 / omega * (omega * t).sin();
                    prop_assert!((y[0] - expected).abs() < 1e-7, "t={} got {} want {}", t, y[0], expected);
                }
            }
        }
    }
}
