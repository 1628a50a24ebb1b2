//! Uniform sample grid shared by every trajectory of a run.

use serde::{Deserialize, Serialize};

use crate::config::PendulumConfig;
use crate::error::{SimError, SimResult};

/// Ordered sample times `t_i = i * dt` for `i in [0, n)`.
///
/// Times are computed as `i * dt` rather than by accumulation, so the grid
/// carries no rounding drift however long it is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeGrid {
    dt: f64,
    times: Vec<f64>,
}

impl TimeGrid {
    /// Create a grid of `len` samples spaced `dt` apart.
    ///
    /// # Errors
    ///
    /// Returns error if `dt` is not positive and finite, or `len` is zero.
    pub fn new(dt: f64, len: usize) -> SimResult<Self> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(SimError::config(format!("Grid spacing must be positive, got {dt}")));
        }
        if len == 0 {
            return Err(SimError::config("Time grid would be empty"));
        }
        let times = (0..len).map(|i| i as f64 * dt).collect();
        Ok(Self { dt, times })
    }

    /// Build the grid described by a configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration yields an empty grid.
    pub fn from_config(config: &PendulumConfig) -> SimResult<Self> {
        Self::new(config.dt(), config.sample_count())
    }

    /// Spacing between samples.
    #[must_use]
    pub const fn dt(&self) -> f64 {
        self.dt
    }

    /// Sample times.
    #[must_use]
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Whether the grid has no samples. Never true for a constructed grid.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Time of sample `i`, if it exists.
    #[must_use]
    pub fn get(&self, i: usize) -> Option<f64> {
        self.times.get(i).copied()
    }

    /// Time of the last sample.
    #[must_use]
    pub fn last(&self) -> f64 {
        self.times.last().copied().unwrap_or(0.0)
    }
}
