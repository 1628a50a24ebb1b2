//! Domain building blocks.
//!
//! - Kinematics: angle series to 2D motion of the bob
//! - ODE: solvers for first-order systems sampled on a time grid

pub mod kinematics;
pub mod ode;

pub use kinematics::PendulumArm;
pub use ode::{DormandPrince45, OdeSolution, OdeSolver, OdeSystem, Rk4Solver, SolverStats};
