//! Error types for pendulum2d.
//!
//! Every fallible operation returns `Result<T, SimError>`. Nothing in the
//! library panics on bad input: parameters are rejected before any work
//! starts, and solver failures are propagated to the caller unchanged.

use thiserror::Error;

/// Result type alias for pendulum2d operations.
pub type SimResult<T> = Result<T, SimError>;

/// Unified error type for all pendulum2d operations.
#[derive(Debug, Error)]
pub enum SimError {
    // ===== Jidoka Violations =====
    /// Numerical instability detected (NaN or Inf).
    #[error("Jidoka: non-finite value detected at {location}")]
    NonFiniteValue {
        /// Location where the non-finite value was detected.
        location: String,
    },

    /// Energy conservation violated beyond tolerance.
    #[error("Jidoka: energy drift {drift:.6e} exceeds tolerance {tolerance:.6e}")]
    EnergyDrift {
        /// Relative energy drift from the initial sample.
        drift: f64,
        /// Configured tolerance threshold.
        tolerance: f64,
    },

    /// Constraint violation detected.
    #[error("Jidoka: constraint '{name}' violated by {violation:.6e} (tolerance: {tolerance:.6e})")]
    ConstraintViolation {
        /// Name of the violated constraint.
        name: String,
        /// Amount of violation.
        violation: f64,
        /// Configured tolerance.
        tolerance: f64,
    },

    // ===== Configuration Errors =====
    /// Invalid configuration parameter.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// YAML parsing error.
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    // ===== Numerical Errors =====
    /// ODE integration failed to advance.
    #[error("Integration error at t={time:.6}: {message}")]
    Integration {
        /// Simulation time at which the solver gave up.
        time: f64,
        /// What went wrong.
        message: String,
    },

    // ===== I/O Errors =====
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SimError {
    /// Create a configuration error with a message.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an integration error.
    #[must_use]
    pub fn integration(time: f64, message: impl Into<String>) -> Self {
        Self::Integration {
            time,
            message: message.into(),
        }
    }

    /// Check if this error is a Jidoka violation.
    #[must_use]
    pub const fn is_jidoka_violation(&self) -> bool {
        matches!(
            self,
            Self::NonFiniteValue { .. }
                | Self::EnergyDrift { .. }
                | Self::ConstraintViolation { .. }
        )
    }
}

impl From<serde_json::Error> for SimError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jidoka_violation_detection() {
        let non_finite = SimError::NonFiniteValue {
            location: "exact.phi[3]".to_string(),
        };
        assert!(non_finite.is_jidoka_violation());

        let energy = SimError::EnergyDrift {
            drift: 0.001,
            tolerance: 0.0001,
        };
        assert!(energy.is_jidoka_violation());

        let constraint = SimError::ConstraintViolation {
            name: "arm_length".to_string(),
            violation: 0.5,
            tolerance: 1e-9,
        };
        assert!(constraint.is_jidoka_violation());

        assert!(!SimError::config("invalid").is_jidoka_violation());
        assert!(!SimError::integration(1.0, "stuck").is_jidoka_violation());
    }

    #[test]
    fn test_error_display() {
        let err = SimError::EnergyDrift {
            drift: 0.001_234_567,
            tolerance: 0.000_001,
        };
        let msg = err.to_string();
        assert!(msg.contains("energy drift"));
        assert!(msg.contains("1.234567e-3"));
    }

    #[test]
    fn test_error_config() {
        let msg = SimError::config("length must be positive").to_string();
        assert!(msg.contains("Configuration error"));
        assert!(msg.contains("length must be positive"));
    }

    #[test]
    fn test_error_integration() {
        let err = SimError::integration(2.5, "step size underflow");
        let msg = err.to_string();
        assert!(msg.contains("Integration error"));
        assert!(msg.contains("t=2.500000"));
        assert!(msg.contains("step size underflow"));
    }

    #[test]
    fn test_error_serialization_from_json() {
        let json_err = serde_json::from_str::<f64>("not a number").unwrap_err();
        let err: SimError = json_err.into();
        assert!(err.to_string().contains("Serialization error"));
    }

    #[test]
    fn test_error_io() {
        let err: SimError = std::io::Error::other("disk full").into();
        let msg = err.to_string();
        assert!(msg.contains("I/O error"));
        assert!(msg.contains("disk full"));
    }

    #[test]
    fn test_error_constraint_violation_display() {
        let err = SimError::ConstraintViolation {
            name: "arm_length".to_string(),
            violation: 0.25,
            tolerance: 0.001,
        };
        let msg = err.to_string();
        assert!(msg.contains("arm_length"));
        assert!(msg.contains("violated"));
    }
}
