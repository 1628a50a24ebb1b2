//! Simple pendulum equations of motion.
//!
//! Two descriptions of the same pendulum:
//! - the small-angle (linearized) closed form, `φ̈ = -ω² φ`
//! - the exact nonlinear ODE, `φ̈ = -ω² sin φ`
//!
//! with ω = sqrt(g/L) and φ measured from the downward vertical.

use crate::config::PendulumConfig;
use crate::domains::ode::OdeSystem;

/// Closed-form small-angle solution of a pendulum.
///
/// ```text
/// φ(t)  =  φ₀ cos(ωt) + (φ̇₀/ω) sin(ωt)
/// φ̇(t)  = -φ₀ ω sin(ωt) + φ̇₀ cos(ωt)
/// φ̈(t)  = -ω² φ(t)
/// ```
///
/// Exact for the linearized equation only; the deviation from the true
/// motion grows with the amplitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmallAngleSolution {
    /// Natural angular frequency.
    pub omega: f64,
    /// Angle at t = 0.
    pub phi_0: f64,
    /// Angular velocity at t = 0.
    pub phi_dot_0: f64,
}

impl SmallAngleSolution {
    /// Create the solution for the given initial conditions.
    #[must_use]
    pub const fn new(omega: f64, phi_0: f64, phi_dot_0: f64) -> Self {
        Self {
            omega,
            phi_0,
            phi_dot_0,
        }
    }

    /// Create from a run configuration.
    #[must_use]
    pub fn from_config(config: &PendulumConfig) -> Self {
        Self::new(config.omega(), config.phi_0, config.phi_dot_0)
    }

    /// Angle at time `t`.
    #[must_use]
    pub fn phi(&self, t: f64) -> f64 {
        let (sin, cos) = (self.omega * t).sin_cos();
        self.phi_0 * cos + self.phi_dot_0 / self.omega * sin
    }

    /// Angular velocity at time `t`.
    #[must_use]
    pub fn phi_dot(&self, t: f64) -> f64 {
        let (sin, cos) = (self.omega * t).sin_cos();
        -self.phi_0 * self.omega * sin + self.phi_dot_0 * cos
    }

    /// Angular acceleration at time `t`.
    #[must_use]
    pub fn phi_double_dot(&self, t: f64) -> f64 {
        -self.omega * self.omega * self.phi(t)
    }
}

/// Exact pendulum equation as a first-order system over `[φ, φ̇]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendulumOde {
    /// Natural angular frequency.
    pub omega: f64,
}

impl PendulumOde {
    /// Create the system for a natural angular frequency.
    #[must_use]
    pub const fn new(omega: f64) -> Self {
        Self { omega }
    }

    /// Create from a run configuration.
    #[must_use]
    pub fn from_config(config: &PendulumConfig) -> Self {
        Self::new(config.omega())
    }

    /// Angular acceleration `-ω² sin φ`.
    #[must_use]
    pub fn phi_double_dot(&self, phi: f64) -> f64 {
        -self.omega * self.omega * phi.sin()
    }
}

impl OdeSystem<2> for PendulumOde {
    fn rhs(&self, _t: f64, y: &[f64; 2], dydt: &mut [f64; 2]) {
        dydt[0] = y[1];
        dydt[1] = self.phi_double_dot(y[0]);
    }
}

/// Total mechanical energy of the bob, zero at rest.
///
/// `E = ½ m L² φ̇² + m g L (1 - cos φ)`
#[must_use]
pub fn mechanical_energy(config: &PendulumConfig, phi: f64, phi_dot: f64) -> f64 {
    let kinetic = 0.5 * config.mass * config.length * config.length * phi_dot * phi_dot;
    let potential = config.mass * config.g * config.length * (1.0 - phi.cos());
    kinetic + potential
}

/// Period of the exact pendulum for release from rest at amplitude `phi_0`.
///
/// Uses `T = 2π / (ω · AGM(1, cos(φ₀/2)))`, the arithmetic-geometric mean
/// form of the complete elliptic integral. Returns `None` for amplitudes of
/// π or more, where the pendulum no longer oscillates.
#[must_use]
pub fn exact_period(omega: f64, phi_0: f64) -> Option<f64> {
    if !phi_0.is_finite() || phi_0.abs() >= std::f64::consts::PI {
        return None;
    }
    let k_prime = (phi_0 / 2.0).cos();
    let (mut a, mut b) = (1.0_f64, k_prime);
    for _ in 0..64 {
        if (a - b).abs() <= f64::EPSILON * a {
            break;
        }
        let next_a = 0.5 * (a + b);
        b = (a * b).sqrt();
        a = next_a;
    }
    Some(2.0 * std::f64::consts::PI / (omega * a))
}
