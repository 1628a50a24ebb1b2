//! Physical scenarios.

pub mod pendulum;

pub use pendulum::{PendulumOde, SmallAngleSolution};
