//! # pendulum2d
//!
//! Trajectories of a planar simple pendulum, computed two ways over one
//! uniform time grid:
//! - `approx`: the closed-form small-angle (simple harmonic) solution
//! - `exact`: numerical integration of `φ̈ = -(g/L) sin φ`
//!
//! Each trajectory carries the angle, its first two derivatives and the
//! bob's 2D position, velocity and acceleration. Runs are pure and
//! deterministic, and checked by Jidoka guards before they are returned.
//!
//! ## Example
//!
//! ```rust
//! use pendulum2d::prelude::*;
//!
//! let config = PendulumConfig::builder()
//!     .length(1.0)
//!     .phi_0(0.8)
//!     .build();
//! let data = simulate(&config).unwrap();
//!
//! assert_eq!(data.len(), 600);
//! let exact = data.trajectory(Method::Exact).unwrap();
//! assert!((exact.phi[0] - 0.8).abs() < f64::EPSILON);
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::suboptimal_flops,  // Written-out formulas read closer to the math
    clippy::imprecise_flops,
    clippy::too_many_lines,
    clippy::missing_const_for_fn,
    clippy::needless_range_loop,
    clippy::many_single_char_names,  // Butcher tableau coefficients
)]

pub mod cli;
pub mod config;
pub mod domains;
pub mod engine;
pub mod error;
pub mod scenarios;
pub mod simulation;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::{PendulumConfig, PendulumConfigBuilder, SolverConfig, SolverMethod};
    pub use crate::domains::kinematics::PendulumArm;
    pub use crate::engine::grid::TimeGrid;
    pub use crate::engine::jidoka::{JidokaConfig, JidokaGuard, JidokaReport};
    pub use crate::error::{SimError, SimResult};
    pub use crate::simulation::{simulate, simulate_method, Method, SimulationData, Trajectory};
}

/// Re-export for public API
pub use error::{SimError, SimResult};
