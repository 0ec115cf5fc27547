//! Fourth-order Runge-Kutta stepper over the affine parameter.
//!
//! Algorithm (classical RK4 on `y = (r, φ, dr, dφ)`):
//! ```text
//! k1 = F(y)
//! k2 = F(y + h/2 · k1)
//! k3 = F(y + h/2 · k2)
//! k4 = F(y + h · k3)
//! y' = y + h/6 · (k1 + 2k2 + 2k3 + k4)
//! ```
//!
//! Trial states keep the photon's original `E` and `L`.

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::geodesic::field::{GeodesicField, SchwarzschildField};
use crate::geodesic::ray::{AbsorptionCause, PhaseVector, RayState};

/// Validated affine-parameter increment.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct StepSize(f64);

impl StepSize {
    /// Validate a step size.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Configuration` unless `dlambda` is finite and > 0.
    pub fn new(dlambda: f64) -> SimResult<Self> {
        if dlambda.is_finite() && dlambda > 0.0 {
            Ok(Self(dlambda))
        } else {
            Err(SimError::config(format!(
                "affine step size must be positive and finite, got {dlambda}"
            )))
        }
    }

    /// Increment in affine-parameter units.
    #[must_use]
    pub const fn get(self) -> f64 {
        self.0
    }
}

/// What a single step did to a photon.
#[derive(Debug)]
pub enum StepOutcome {
    /// Integrated and recorded a new point.
    Advanced,
    /// Integrated across the horizon; the crossing point was recorded and
    /// the photon is now absorbed.
    CrossedHorizon,
    /// The field failed during a stage; the photon was absorbed where it stood.
    Degenerate(SimError),
    /// Already absorbed (or found inside the horizon); nothing changed.
    Frozen,
}

impl StepOutcome {
    /// Check if the photon is still active after this step.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Advanced)
    }
}

/// Numerical integrator trait.
pub trait Integrator {
    /// Advance `state` by one affine increment.
    ///
    /// Field failures never escape: they become [`StepOutcome::Degenerate`].
    fn step(&self, state: &mut RayState, field: &dyn GeodesicField, dlambda: StepSize) -> StepOutcome;

    /// Error order of the method.
    fn error_order(&self) -> u32;
}

/// Classical Runge-Kutta 4th order integrator.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rk4Stepper;

impl Rk4Stepper {
    /// Create a new RK4 stepper.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn integrate(
        state: &RayState,
        field: &dyn GeodesicField,
        h: f64,
    ) -> SimResult<PhaseVector> {
        let y = state.phase();
        let conserved = state.conserved();
        let half_h = h / 2.0;

        let k1 = field.derivative(&y, &conserved)?;
        let k2 = field.derivative(&(y + k1 * half_h), &conserved)?;
        let k3 = field.derivative(&(y + k2 * half_h), &conserved)?;
        let k4 = field.derivative(&(y + k3 * h), &conserved)?;

        let next = y + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (h / 6.0);
        match next.first_non_finite() {
            Some(name) => Err(SimError::non_finite(format!("rk4 update {name}"))),
            None => Ok(next),
        }
    }
}

impl Integrator for Rk4Stepper {
    fn step(&self, state: &mut RayState, field: &dyn GeodesicField, dlambda: StepSize) -> StepOutcome {
        let r_s = field.horizon_radius();

        if !state.is_active() {
            return StepOutcome::Frozen;
        }
        if state.r() < r_s {
            state.absorb(AbsorptionCause::Horizon);
            return StepOutcome::Frozen;
        }

        let next = match Self::integrate(state, field, dlambda.get()) {
            Ok(next) => next,
            Err(err) => {
                state.absorb(AbsorptionCause::Degeneracy);
                return StepOutcome::Degenerate(err);
            }
        };

        state.advance(next);

        if next.r < r_s {
            state.absorb(AbsorptionCause::Horizon);
            return StepOutcome::CrossedHorizon;
        }

        StepOutcome::Advanced
    }

    fn error_order(&self) -> u32 {
        4
    }
}

/// Advance one photon in the Schwarzschild field of radius `r_s`.
pub fn step(state: &mut RayState, r_s: f64, dlambda: StepSize) -> StepOutcome {
    Rk4Stepper::new().step(state, &SchwarzschildField::new(r_s), dlambda)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::geodesic::history::HistoryRetention;
    use crate::geodesic::ray::{Conserved, RayStatus};
    use crate::geodesic::source::GravitySource;
    use crate::geodesic::units::Position2D;

    fn sgr() -> GravitySource {
        GravitySource::sagittarius_a().unwrap()
    }

    fn emit(bh: &GravitySource, pos: (f64, f64), dir: (f64, f64)) -> RayState {
        RayState::emit(
            bh,
            Position2D::new(pos.0, pos.1),
            Position2D::new(dir.0, dir.1),
            HistoryRetention::Unbounded,
        )
        .unwrap()
    }

    fn relative_error(actual: f64, expected: f64) -> f64 {
        (actual - expected).abs() / expected.abs()
    }

    /// Zero acceleration: r and φ move linearly.
    struct DriftField;
    impl GeodesicField for DriftField {
        fn derivative(&self, y: &PhaseVector, _: &Conserved) -> SimResult<PhaseVector> {
            Ok(PhaseVector::new(y.dr, y.dphi, 0.0, 0.0))
        }
        fn horizon_radius(&self) -> f64 {
            0.0
        }
    }

    /// Harmonic oscillator around r = 1.
    struct SpringField;
    impl GeodesicField for SpringField {
        fn derivative(&self, y: &PhaseVector, _: &Conserved) -> SimResult<PhaseVector> {
            Ok(PhaseVector::new(y.dr, y.dphi, -(y.r - 1.0), 0.0))
        }
        fn horizon_radius(&self) -> f64 {
            0.0
        }
    }

    /// Fails at every evaluation.
    struct BrokenField;
    impl GeodesicField for BrokenField {
        fn derivative(&self, y: &PhaseVector, _: &Conserved) -> SimResult<PhaseVector> {
            Err(SimError::NumericDegeneracy { r: y.r, r_s: y.r })
        }
        fn horizon_radius(&self) -> f64 {
            0.0
        }
    }

    #[test]
    fn test_step_size_validation() {
        assert!(StepSize::new(1.0).is_ok());
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(StepSize::new(bad).unwrap_err().is_configuration(), "{bad}");
        }
        assert!((StepSize::new(0.25).unwrap().get() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rk4_drift_field_is_exact() {
        let mut ray = emit(&sgr(), (-1e11, 0.0), (0.5, 0.0));
        let y0 = ray.phase();
        let h = StepSize::new(1.0).unwrap();
        for _ in 0..100 {
            assert!(Rk4Stepper::new().step(&mut ray, &DriftField, h).is_active());
        }
        let y = ray.phase();
        assert!((y.r - (y0.r + 100.0 * y0.dr)).abs() < 1e-1, "r = {}", y.r);
        assert_eq!(y.dr, y0.dr);
        assert_eq!(ray.path().len(), 100);
    }

    #[test]
    fn test_rk4_spring_period() {
        // 1 kg source: the horizon is irrelevant at r = 1 m.
        let tiny = GravitySource::from_kg(1.0, Position2D::origin()).unwrap();
        let mut ray = emit(&tiny, (-1.0, 0.0), (1e-9, 0.0));
        let y0 = ray.phase();
        let steps = 10_000;
        let h = StepSize::new(2.0 * std::f64::consts::PI / f64::from(steps)).unwrap();
        for _ in 0..steps {
            Rk4Stepper::new().step(&mut ray, &SpringField, h);
        }
        let y = ray.phase();
        let amplitude = y0.dr.abs();
        assert!((y.r - y0.r).abs() < 1e-9 * amplitude, "r error {:e}", y.r - y0.r);
        assert!(relative_error(y.dr, y0.dr) < 1e-9);
    }

    #[test]
    fn test_error_order() {
        assert_eq!(Rk4Stepper::new().error_order(), 4);
    }

    #[test]
    fn test_conservation_single_steps() {
        let bh = sgr();
        let r_s = bh.r_s();
        let mut ray = emit(&bh, (-1e11, 3e10), (1.0, 0.0));
        let c = ray.conserved();
        let h = StepSize::new(1.0).unwrap();

        for _ in 0..200 {
            assert!(step(&mut ray, r_s, h).is_active());
            assert!(relative_error(ray.implied_angular_momentum(), c.angular_momentum) < 1e-6);
            assert!(relative_error(ray.implied_energy(r_s), c.energy) < 1e-6);
        }
    }

    #[test]
    fn test_conservation_improves_with_smaller_step() {
        let bh = sgr();
        let r_s = bh.r_s();
        let drift = |dlambda: f64, steps: usize| {
            let mut ray = emit(&bh, (-8e10, 5e10), (1.0, 0.0));
            let e = ray.conserved().energy;
            let h = StepSize::new(dlambda).unwrap();
            for _ in 0..steps {
                step(&mut ray, r_s, h);
            }
            relative_error(ray.implied_energy(r_s), e)
        };
        let coarse = drift(50.0, 4);
        let fine = drift(5.0, 40);
        assert!(fine <= coarse, "fine {fine:e} vs coarse {coarse:e}");
    }

    #[test]
    fn test_radial_infall_crosses_horizon_and_records_crossing() {
        let bh = sgr();
        let r_s = bh.r_s();
        let mut ray = emit(&bh, (1.05 * r_s, 0.0), (-1.0, 0.0));
        let h = StepSize::new(1.0).unwrap();

        let mut steps = 0;
        let mut crossed = false;
        while steps < 20 {
            steps += 1;
            match step(&mut ray, r_s, h) {
                StepOutcome::Advanced => {}
                StepOutcome::CrossedHorizon => {
                    crossed = true;
                    break;
                }
                other => panic!("unexpected outcome {other:?}"),
            }
        }

        assert!(crossed);
        assert_eq!(ray.status(), RayStatus::Absorbed);
        assert_eq!(ray.absorption_cause(), Some(AbsorptionCause::Horizon));
        assert_eq!(ray.path().len(), steps);
        let last = ray.path().last().unwrap();
        assert!(last.magnitude() < r_s);
        assert_eq!(last, ray.position());
    }

    #[test]
    fn test_absorbed_is_idempotent() {
        let bh = sgr();
        let r_s = bh.r_s();
        let mut ray = emit(&bh, (1.05 * r_s, 0.0), (-1.0, 0.0));
        let h = StepSize::new(1.0).unwrap();
        while ray.is_active() {
            step(&mut ray, r_s, h);
        }
        let frozen = ray.clone();
        for _ in 0..50 {
            assert!(matches!(step(&mut ray, r_s, h), StepOutcome::Frozen));
        }
        assert_eq!(ray, frozen);
    }

    #[test]
    fn test_degeneracy_absorbs_without_recording() {
        let mut ray = emit(&sgr(), (-1e11, 0.0), (0.5, 0.0));
        let before = ray.phase();
        let outcome = Rk4Stepper::new().step(&mut ray, &BrokenField, StepSize::new(1.0).unwrap());
        assert!(matches!(outcome, StepOutcome::Degenerate(SimError::NumericDegeneracy { .. })));
        assert_eq!(ray.status(), RayStatus::Absorbed);
        assert_eq!(ray.absorption_cause(), Some(AbsorptionCause::Degeneracy));
        assert_eq!(ray.phase(), before);
        assert!(ray.path().is_empty());
    }

    #[test]
    fn test_deterministic_sequence() {
        let bh = sgr();
        let run = || {
            let mut ray = emit(&bh, (-1e11, 2.5e10), (1.0, 0.0));
            let h = StepSize::new(1.0).unwrap();
            for _ in 0..300 {
                step(&mut ray, bh.r_s(), h);
            }
            ray
        };
        assert_eq!(run(), run());
    }
}
