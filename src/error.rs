//! Error types for photon-geodesic.
//!
//! Two failure classes exist at the core:
//! - **Configuration** errors are fatal and raised before any ray exists.
//! - **Numeric degeneracy** is recovered per photon (the photon is absorbed)
//!   and never crosses the tick boundary.

use thiserror::Error;

/// Result type alias for photon-geodesic operations.
pub type SimResult<T> = Result<T, SimError>;

/// Unified error type for all photon-geodesic operations.
#[derive(Debug, Error)]
pub enum SimError {
    // ===== Setup Errors =====
    /// Invalid configuration parameter (mass, step size, initial ray).
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },

    /// YAML parsing error.
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// Schema validation error.
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // ===== Per-photon numeric failures =====
    /// Field evaluated at r <= 0 or at r numerically equal to r_s.
    #[error("Numeric degeneracy: r = {r:.6e} m against horizon r_s = {r_s:.6e} m")]
    NumericDegeneracy {
        /// Radial coordinate at which the evaluation failed.
        r: f64,
        /// Horizon radius.
        r_s: f64,
    },

    /// NaN or Inf produced during integration.
    #[error("Non-finite value detected at {location}")]
    NonFiniteValue {
        /// Location where the non-finite value was detected.
        location: String,
    },
}

impl SimError {
    /// Create a configuration error with a message.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a non-finite value error.
    #[must_use]
    pub fn non_finite(location: impl Into<String>) -> Self {
        Self::NonFiniteValue {
            location: location.into(),
        }
    }

    /// Check if this error is a setup-time configuration failure.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration { .. } | Self::YamlParse(_) | Self::Validation(_)
        )
    }

    /// Check if this error is recovered locally by absorbing the photon.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NumericDegeneracy { .. } | Self::NonFiniteValue { .. }
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = SimError::config("mass must be positive");
        assert!(err.is_configuration());
        assert!(!err.is_recoverable());
        let msg = err.to_string();
        assert!(msg.contains("Configuration error"));
        assert!(msg.contains("mass must be positive"));
    }

    #[test]
    fn test_degeneracy_is_recoverable() {
        let err = SimError::NumericDegeneracy {
            r: 1.0e10,
            r_s: 1.0e10,
        };
        assert!(err.is_recoverable());
        assert!(!err.is_configuration());
        assert!(err.to_string().contains("Numeric degeneracy"));
    }

    #[test]
    fn test_non_finite_display() {
        let err = SimError::non_finite("dr");
        assert!(err.is_recoverable());
        let msg = err.to_string();
        assert!(msg.contains("Non-finite"));
        assert!(msg.contains("dr"));
    }

    #[test]
    fn test_yaml_error_is_configuration() {
        let parse: Result<u32, _> = serde_yaml::from_str("not: [a number");
        let err = SimError::from(parse.unwrap_err());
        assert!(err.is_configuration());
        assert!(err.to_string().contains("YAML"));
    }

    #[test]
    fn test_json_error() {
        let parse: Result<Vec<f64>, _> = serde_json::from_str("[1.0,");
        let err = SimError::from(parse.unwrap_err());
        assert!(!err.is_configuration());
        assert!(err.to_string().contains("JSON"));
    }

    #[test]
    fn test_io_error() {
        let err = SimError::Io(std::io::Error::other("missing file"));
        assert!(!err.is_configuration());
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("I/O error"));
    }
}
