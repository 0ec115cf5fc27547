//! Null-geodesic equations of the Schwarzschild metric (equatorial plane).
//!
//! ```text
//! f      = 1 - r_s / r
//! dt/dλ  = E / f
//! d²r/dλ² = -(r_s / 2r²) f (dt/dλ)² + (r_s / (2r² f)) (dr/dλ)² + (r - r_s) (dφ/dλ)²
//! d²φ/dλ² = -2 (dr/dλ)(dφ/dλ) / r
//! ```

use crate::error::{SimError, SimResult};
use crate::geodesic::ray::{Conserved, PhaseVector, RayState};

/// Relative distance from the horizon below which `f` is treated as zero.
pub const HORIZON_DEGENERACY_EPSILON: f64 = 1e-12;

/// Rate of change of the integrated 4-vector.
pub trait GeodesicField {
    /// Evaluate `(dr, dφ, d²r, d²φ)` at `y` for a photon with constants `conserved`.
    ///
    /// # Errors
    ///
    /// Returns `SimError::NumericDegeneracy` where the equations are singular,
    /// or `SimError::NonFiniteValue` if the result is not finite.
    fn derivative(&self, y: &PhaseVector, conserved: &Conserved) -> SimResult<PhaseVector>;

    /// Radius below which a photon counts as absorbed.
    fn horizon_radius(&self) -> f64;
}

/// Schwarzschild field for a given horizon radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchwarzschildField {
    r_s: f64,
}

impl SchwarzschildField {
    /// Create the field for horizon radius `r_s` (meters).
    #[must_use]
    pub const fn new(r_s: f64) -> Self {
        Self { r_s }
    }

    /// Horizon radius.
    #[must_use]
    pub const fn r_s(&self) -> f64 {
        self.r_s
    }
}

impl GeodesicField for SchwarzschildField {
    fn derivative(&self, y: &PhaseVector, conserved: &Conserved) -> SimResult<PhaseVector> {
        derivative_at(y, conserved, self.r_s)
    }

    fn horizon_radius(&self) -> f64 {
        self.r_s
    }
}

/// Evaluate the field for a whole ray.
///
/// # Errors
///
/// See [`derivative_at`].
pub fn derivative(state: &RayState, r_s: f64) -> SimResult<PhaseVector> {
    derivative_at(&state.phase(), &state.conserved(), r_s)
}

/// Evaluate the field at a trial state.
///
/// Only `E` enters the equations; `L` is carried implicitly by `dφ`.
///
/// # Errors
///
/// Returns `SimError::NumericDegeneracy` if `r <= 0` or `r` is within
/// [`HORIZON_DEGENERACY_EPSILON`] (relative) of `r_s`, and
/// `SimError::NonFiniteValue` if any input or output component is NaN/Inf.
pub fn derivative_at(y: &PhaseVector, conserved: &Conserved, r_s: f64) -> SimResult<PhaseVector> {
    if let Some(name) = y.first_non_finite() {
        return Err(SimError::non_finite(format!("field input {name}")));
    }

    let PhaseVector { r, dr, dphi, .. } = *y;
    if r <= 0.0 || (r - r_s).abs() <= HORIZON_DEGENERACY_EPSILON * r_s {
        return Err(SimError::NumericDegeneracy { r, r_s });
    }

    let f = 1.0 - r_s / r;
    let dt_dlambda = conserved.energy / f;
    let r2 = r * r;

    let d2r = -(r_s / (2.0 * r2)) * f * dt_dlambda * dt_dlambda
        + (r_s / (2.0 * r2 * f)) * (dr * dr)
        + (r - r_s) * dphi * dphi;
    let d2phi = -2.0 * dr * dphi / r;

    let out = PhaseVector::new(dr, dphi, d2r, d2phi);
    if let Some(name) = out.first_non_finite() {
        return Err(SimError::non_finite(format!("field output {name}")));
    }
    Ok(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::geodesic::history::HistoryRetention;
    use crate::geodesic::source::GravitySource;
    use crate::geodesic::units::Position2D;

    fn golden_ray() -> (RayState, f64) {
        let bh = GravitySource::sagittarius_a().unwrap();
        let ray = RayState::emit(
            &bh,
            Position2D::new(-1e11, 0.0),
            Position2D::new(0.5, 0.0),
            HistoryRetention::Unbounded,
        )
        .unwrap();
        (ray, bh.r_s())
    }

    #[test]
    fn test_first_components_are_velocities() {
        let (ray, r_s) = golden_ray();
        let k = derivative(&ray, r_s).unwrap();
        assert_eq!(k.r, ray.phase().dr);
        assert_eq!(k.phi, ray.phase().dphi);
    }

    #[test]
    fn test_radial_photon_has_no_radial_acceleration() {
        // Purely radial null ray: d²r = -(r_s/2r²)E²/f + (r_s/(2r²f)) dr² = 0 since dr² = E².
        let (ray, r_s) = golden_ray();
        let k = derivative(&ray, r_s).unwrap();
        let scale = ray.phase().dr.powi(2) / ray.r();
        assert!(k.dr.abs() <= 1e-9 * scale, "d2r = {:e}", k.dr);
        assert!(k.dphi.abs() < 1e-18);
    }

    #[test]
    fn test_golden_derivative_matches_formula() {
        let (ray, r_s) = golden_ray();
        let y = ray.phase();
        let e = ray.conserved().energy;

        let f = 1.0 - r_s / y.r;
        let dt = e / f;
        let r2 = y.r * y.r;
        let expected_d2r = -(r_s / (2.0 * r2)) * f * dt * dt
            + (r_s / (2.0 * r2 * f)) * (y.dr * y.dr)
            + (y.r - r_s) * y.dphi * y.dphi;
        let expected_d2phi = -2.0 * y.dr * y.dphi / y.r;

        let k = derivative(&ray, r_s).unwrap();
        assert_eq!(k, PhaseVector::new(y.dr, y.dphi, expected_d2r, expected_d2phi));
        assert!((k.r + 0.5 * crate::geodesic::units::C).abs() < 1e-6);
    }

    #[test]
    fn test_photon_sphere_is_circular() {
        // At r = 1.5 r_s a tangential photon is on the (unstable) circular orbit.
        let r_s = 1.0;
        let r = 1.5;
        let dphi = 1.0;
        let f = 1.0 - r_s / r;
        let conserved = Conserved {
            angular_momentum: r * r * dphi,
            energy: f * (r * r * dphi * dphi / f).sqrt(),
        };
        let k = derivative_at(&PhaseVector::new(r, 0.0, 0.0, dphi), &conserved, r_s).unwrap();
        assert!(k.dr.abs() < 1e-12, "photon sphere d2r = {:e}", k.dr);

        // Farther out the same tangential photon accelerates outward (straight line in flat space).
        let r = 10.0;
        let f = 1.0 - r_s / r;
        let conserved = Conserved {
            angular_momentum: r * r * dphi,
            energy: f * (r * r * dphi * dphi / f).sqrt(),
        };
        let k = derivative_at(&PhaseVector::new(r, 0.0, 0.0, dphi), &conserved, r_s).unwrap();
        assert!(k.dr > 0.0);
    }

    #[test]
    fn test_degenerate_at_horizon_and_origin() {
        let conserved = Conserved {
            angular_momentum: 0.0,
            energy: 1.0,
        };
        for r in [1.0, 0.0, -1.0] {
            let err = derivative_at(&PhaseVector::new(r, 0.0, -1.0, 0.0), &conserved, 1.0).unwrap_err();
            assert!(matches!(err, SimError::NumericDegeneracy { .. }), "r = {r}");
        }
        let near = 1.0 + 1e-14;
        let err = derivative_at(&PhaseVector::new(near, 0.0, -1.0, 0.0), &conserved, 1.0).unwrap_err();
        assert!(matches!(err, SimError::NumericDegeneracy { .. }));
    }

    #[test]
    fn test_non_finite_input_rejected() {
        let conserved = Conserved {
            angular_momentum: 0.0,
            energy: 1.0,
        };
        let err = derivative_at(&PhaseVector::new(2.0, f64::NAN, 0.0, 0.0), &conserved, 1.0).unwrap_err();
        assert!(matches!(err, SimError::NonFiniteValue { .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_inside_horizon_is_still_evaluable() {
        // f < 0 is not singular; only f ≈ 0 is.
        let conserved = Conserved {
            angular_momentum: 0.0,
            energy: 1.0,
        };
        assert!(derivative_at(&PhaseVector::new(0.5, 0.0, -1.0, 0.0), &conserved, 1.0).is_ok());
    }

    #[test]
    fn test_field_trait_object() {
        let field: &dyn GeodesicField = &SchwarzschildField::new(1.0);
        let conserved = Conserved {
            angular_momentum: 0.0,
            energy: 1.0,
        };
        let y = PhaseVector::new(4.0, 0.0, -1.0, 0.0);
        assert_eq!(
            field.derivative(&y, &conserved).unwrap(),
            derivative_at(&y, &conserved, 1.0).unwrap()
        );
        assert!((field.horizon_radius() - 1.0).abs() < f64::EPSILON);
        assert!((SchwarzschildField::new(2.5).r_s() - 2.5).abs() < f64::EPSILON);
    }
}
