//! Angle-to-Cartesian kinematics of a planar pendulum.
//!
//! The bob sits at `attachment + L (sin φ, -cos φ)` with φ measured from the
//! downward vertical. Velocity and acceleration are the first and second
//! time derivatives of that relation:
//!
//! ```text
//! r     = r_fix + L ê_r(φ)                ê_r = ( sin φ, -cos φ)
//! ṙ     = L φ̇ ê_φ(φ)                      ê_φ = ( cos φ,  sin φ)
//! r̈     = L φ̈ ê_φ(φ) - L φ̇² ê_r(φ)
//! ```

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Unit vector from the attachment point towards the bob.
#[must_use]
pub fn radial(phi: f64) -> DVec2 {
    let (sin, cos) = phi.sin_cos();
    DVec2::new(sin, -cos)
}

/// Unit vector along the direction of increasing φ.
#[must_use]
pub fn tangential(phi: f64) -> DVec2 {
    let (sin, cos) = phi.sin_cos();
    DVec2::new(cos, sin)
}

/// Rigid arm of fixed length hanging from a fixed point.
///
/// Every sample of a trajectory is mapped through the same arm, so all
/// positions lie on one circle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PendulumArm {
    /// Fixed attachment point.
    pub attachment: DVec2,
    /// Arm length.
    pub length: f64,
}

impl PendulumArm {
    /// Create a new arm.
    #[must_use]
    pub const fn new(attachment: DVec2, length: f64) -> Self {
        Self { attachment, length }
    }

    /// Position of the bob at angle `phi`.
    #[must_use]
    pub fn position(&self, phi: f64) -> DVec2 {
        self.attachment + self.length * radial(phi)
    }

    /// Velocity of the bob.
    #[must_use]
    pub fn velocity(&self, phi: f64, phi_dot: f64) -> DVec2 {
        self.length * phi_dot * tangential(phi)
    }

    /// Acceleration of the bob.
    #[must_use]
    pub fn acceleration(&self, phi: f64, phi_dot: f64, phi_double_dot: f64) -> DVec2 {
        self.length * phi_double_dot * tangential(phi)
            - self.length * phi_dot * phi_dot * radial(phi)
    }

    /// Rest position, straight below the attachment.
    #[must_use]
    pub fn rest_position(&self) -> DVec2 {
        self.attachment - DVec2::new(0.0, self.length)
    }

    /// Map a sequence of angles to positions.
    #[must_use]
    pub fn positions(&self, phi: &[f64]) -> Vec<DVec2> {
        phi.iter().map(|&p| self.position(p)).collect()
    }

    /// Map aligned angle and rate sequences to velocities.
    ///
    /// Output length is the shorter of the two inputs.
    #[must_use]
    pub fn velocities(&self, phi: &[f64], phi_dot: &[f64]) -> Vec<DVec2> {
        phi.iter()
            .zip(phi_dot)
            .map(|(&p, &pd)| self.velocity(p, pd))
            .collect()
    }

    /// Map aligned angle, rate and angular acceleration sequences to
    /// accelerations.
    #[must_use]
    pub fn accelerations(
        &self,
        phi: &[f64],
        phi_dot: &[f64],
        phi_double_dot: &[f64],
    ) -> Vec<DVec2> {
        phi.iter()
            .zip(phi_dot)
            .zip(phi_double_dot)
            .map(|((&p, &pd), &pdd)| self.acceleration(p, pd, pdd))
            .collect()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// The bob never leaves the circle of radius L.
        #[test]
        fn prop_position_on_circle(
            phi in -50.0f64..50.0,
            length in 0.01f64..100.0,
            ax in -10.0f64..10.0,
            ay in -10.0f64..10.0,
        ) {
            let arm = PendulumArm::new(DVec2::new(ax, ay), length);
            let distance = (arm.position(phi) - arm.attachment).length();
            prop_assert!((distance - length).abs() <= 1e-12 * length.max(1.0));
        }
    }
}
