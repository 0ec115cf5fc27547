//! # photon-geodesic
//!
//! Light bending around a non-rotating black hole.
//!
//! Photons are integrated along Schwarzschild null geodesics in the
//! equatorial plane:
//! - Conserved angular momentum and energy fixed at emission
//! - Classical RK4 over the affine parameter
//! - Horizon absorption and local recovery from numeric degeneracy
//! - Jidoka conservation guard and metamorphic verification
//!
//! ## Example
//!
//! ```rust
//! use photon_geodesic::prelude::*;
//!
//! let config = SimConfig::sagittarius_beam();
//! let mut driver = SimulationDriver::from_config(&config).expect("preset is valid");
//! driver.run(10);
//!
//! let snapshot = driver.snapshot();
//! assert_eq!(snapshot.tick, 10);
//! assert_eq!(snapshot.rays.len(), 15);
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::suboptimal_flops,  // Formulas are kept in their textbook form
    clippy::imprecise_flops,
    clippy::too_many_lines,
    clippy::missing_const_for_fn,
)]

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod geodesic;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::{SimConfig, SimConfigBuilder};
    pub use crate::engine::{Diagnostic, Snapshot, SimulationDriver, TickSummary};
    pub use crate::error::{SimError, SimResult};
    pub use crate::geodesic::prelude::*;
}

/// Re-export for public API
pub use error::{SimError, SimResult};
