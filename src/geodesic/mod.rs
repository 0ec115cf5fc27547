//! Schwarzschild photon geodesics.
//!
//! Implements light bending around a non-rotating black hole with:
//! - Type-safe units at the source boundary (Poka-Yoke)
//! - Conserved-quantity geodesic equations in the equatorial plane
//! - Classical RK4 stepping with local recovery from degeneracy
//! - Jidoka conservation guard with graceful degradation
//! - Bounded path retention and beam presets
//!
//! # Toyota Way Principles
//!
//! - **Jidoka (自働化)**: Drift is detected and reported, never fatal
//! - **Poka-Yoke (ポカヨケ)**: Invalid inputs are rejected before any photon exists
//!
//! # Example
//!
//! ```rust
//! use photon_geodesic::geodesic::prelude::*;
//!
//! let bh = GravitySource::sagittarius_a().expect("preset mass is valid");
//! let mut ray = RayState::emit(
//!     &bh,
//!     Position2D::new(-1e11, 3e10),
//!     Position2D::new(1.0, 0.0),
//!     HistoryRetention::Unbounded,
//! )
//! .expect("emission point is outside the horizon");
//!
//! let h = StepSize::new(1.0).expect("positive step");
//! for _ in 0..100 {
//!     step(&mut ray, bh.r_s(), h);
//! }
//! assert_eq!(ray.path().len(), 100);
//! ```

pub mod units;
pub mod source;
pub mod history;
pub mod ray;
pub mod field;
pub mod stepper;
pub mod jidoka;
pub mod scenarios;
pub mod metamorphic;

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::units::{Position2D, SourceMass, C, G, SAGITTARIUS_A_MASS};
    pub use super::source::GravitySource;
    pub use super::history::{HistoryRetention, PathHistory};
    pub use super::ray::{AbsorptionCause, Conserved, PhaseVector, RayState, RayStatus};
    pub use super::field::{derivative, GeodesicField, SchwarzschildField};
    pub use super::stepper::{step, Integrator, Rk4Stepper, StepOutcome, StepSize};
    pub use super::jidoka::{ConservationGuard, GuardConfig, GuardReport, Severity};
    pub use super::scenarios::{BeamConfig, RaySpec};
    pub use super::metamorphic::{run_all_metamorphic_checks, MetamorphicResult};
}
