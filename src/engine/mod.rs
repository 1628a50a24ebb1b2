//! Run infrastructure shared by every method.
//!
//! - the uniform time grid all trajectories are sampled on
//! - Jidoka guards for stop-on-error

pub mod grid;
pub mod jidoka;

pub use grid::TimeGrid;
pub use jidoka::{JidokaConfig, JidokaGuard, JidokaReport};
