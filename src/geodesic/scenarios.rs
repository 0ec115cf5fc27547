//! Ray emitters and presets.
//!
//! - [`RaySpec`]: a single photon, position plus direction (units of c).
//! - [`BeamConfig`]: a column of parallel photons, as used to visualise
//!   gravitational lensing of a plane wave.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{SimError, SimResult};
use crate::geodesic::units::Position2D;

/// Safety cap on beam expansion.
pub const MAX_BEAM_RAYS: usize = 100_000;

/// One emitted photon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct RaySpec {
    /// Emission point (m).
    pub position: Position2D,
    /// Direction as a velocity in units of c.
    pub direction: Position2D,
}

impl RaySpec {
    /// Create a ray spec.
    #[must_use]
    pub const fn new(position: Position2D, direction: Position2D) -> Self {
        Self {
            position,
            direction,
        }
    }

    /// The same ray reflected across the x axis.
    #[must_use]
    pub fn mirrored_y(&self) -> Self {
        Self::new(self.position.mirrored_y(), self.direction.mirrored_y())
    }
}

/// Column of parallel photons at a fixed `x`.
///
/// Emits at `y = y_min, y_min + spacing, ...` while `y < y_max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct BeamConfig {
    /// Emission column (m).
    pub x: f64,
    /// First emission height (m).
    pub y_min: f64,
    /// Exclusive upper bound (m).
    pub y_max: f64,
    /// Distance between neighbouring photons (m).
    #[validate(range(exclusive_min = 0.0))]
    pub spacing: f64,
    /// Shared direction (units of c).
    pub direction: Position2D,
}

impl BeamConfig {
    /// The lensing demo beam: x = -1e11 m, |y| < 7.5e10 m, 0.5 c along +x.
    #[must_use]
    pub const fn sagittarius_demo() -> Self {
        Self {
            x: -1e11,
            y_min: -7.5e10,
            y_max: 7.5e10,
            spacing: 1e10,
            direction: Position2D::new(0.5, 0.0),
        }
    }

    /// Expand into individual rays.
    ///
    /// Heights are computed as `y_min + i·spacing` so no error accumulates.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a non-positive spacing, non-finite
    /// bounds, or a beam exceeding [`MAX_BEAM_RAYS`].
    pub fn expand(&self) -> SimResult<Vec<RaySpec>> {
        if !(self.spacing.is_finite() && self.spacing > 0.0) {
            return Err(SimError::config(format!(
                "beam spacing must be positive, got {}",
                self.spacing
            )));
        }
        if !(self.x.is_finite() && self.y_min.is_finite() && self.y_max.is_finite()) {
            return Err(SimError::config("beam bounds must be finite"));
        }

        let span = (self.y_max - self.y_min).max(0.0);
        let count = (span / self.spacing).ceil();
        if count > MAX_BEAM_RAYS as f64 {
            return Err(SimError::config(format!(
                "beam would emit {count} rays (limit {MAX_BEAM_RAYS})"
            )));
        }

        let rays = (0..count as usize)
            .map(|i| self.y_min + i as f64 * self.spacing)
            .take_while(|&y| y < self.y_max)
            .map(|y| RaySpec::new(Position2D::new(self.x, y), self.direction))
            .collect();
        Ok(rays)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_beam_is_fifteen_photon_fan() {
        let rays = BeamConfig::sagittarius_demo().expand().unwrap();
        // y in [-7.5e10, 7.5e10) step 1e10 -> 15 rays
        assert_eq!(rays.len(), 15);
        assert!((rays[0].position.y + 7.5e10).abs() < 1.0);
        assert!((rays[14].position.y - 6.5e10).abs() < 1.0);
        assert!(rays.iter().all(|r| (r.position.x + 1e11).abs() < f64::EPSILON));
        assert!(rays.iter().all(|r| r.direction == Position2D::new(0.5, 0.0)));
    }

    #[test]
    fn test_empty_beam() {
        let beam = BeamConfig {
            y_min: 1.0,
            y_max: 1.0,
            ..BeamConfig::sagittarius_demo()
        };
        assert!(beam.expand().unwrap().is_empty());
    }

    #[test]
    fn test_bad_spacing_rejected() {
        for spacing in [0.0, -1.0, f64::NAN] {
            let beam = BeamConfig {
                spacing,
                ..BeamConfig::sagittarius_demo()
            };
            assert!(beam.expand().unwrap_err().is_configuration());
        }
    }

    #[test]
    fn test_oversized_beam_rejected() {
        let beam = BeamConfig {
            spacing: 1.0,
            ..BeamConfig::sagittarius_demo()
        };
        assert!(beam.expand().is_err());
    }

    #[test]
    fn test_mirrored_spec() {
        let spec = RaySpec::new(Position2D::new(-1.0, 2.0), Position2D::new(0.5, -0.1));
        let m = spec.mirrored_y();
        assert_eq!(m.position, Position2D::new(-1.0, -2.0));
        assert_eq!(m.direction, Position2D::new(0.5, 0.1));
    }

    #[test]
    fn test_validator_rejects_zero_spacing() {
        let beam = BeamConfig {
            spacing: 0.0,
            ..BeamConfig::sagittarius_demo()
        };
        assert!(beam.validate().is_err());
        assert!(BeamConfig::sagittarius_demo().validate().is_ok());
    }
}
