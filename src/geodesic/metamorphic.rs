//! Metamorphic testing for photon trajectories.
//!
//! Exact trajectories near a black hole are not known in closed form, so
//! these checks verify **relations** between runs instead of outputs.
//!
//! # Metamorphic Relations
//!
//! 1. **Mirror Symmetry**: reflecting every emission across the x axis
//!    reflects every trail.
//! 2. **Deterministic Replay**: identical configurations produce
//!    bit-identical trails.
//! 3. **Execution Independence**: sequential and parallel ticks agree bit
//!    for bit.
//! 4. **Conservation**: `L` and `E` recomputed from the state stay within
//!    tolerance of their emission values.

use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::engine::SimulationDriver;
use crate::error::SimResult;
use crate::geodesic::jidoka::{ConservationGuard, GuardConfig};

/// Default relative tolerance for mirrored coordinates (in units of r_s).
pub const MIRROR_TOLERANCE: f64 = 1e-9;

/// Default relative drift tolerance for the conservation relation.
pub const CONSERVATION_TOLERANCE: f64 = 1e-6;

/// Metamorphic test result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetamorphicResult {
    /// Name of the relation tested.
    pub relation: String,
    /// Whether the relation holds within tolerance.
    pub passed: bool,
    /// Measured error/deviation.
    pub error: f64,
    /// Tolerance used.
    pub tolerance: f64,
    /// Additional details.
    pub details: String,
}

impl MetamorphicResult {
    /// Create a passing result.
    #[must_use]
    pub fn pass(relation: &str, error: f64, tolerance: f64) -> Self {
        Self {
            relation: relation.to_string(),
            passed: true,
            error,
            tolerance,
            details: String::new(),
        }
    }

    /// Create a failing result.
    #[must_use]
    pub fn fail(relation: &str, error: f64, tolerance: f64, details: &str) -> Self {
        Self {
            relation: relation.to_string(),
            passed: false,
            error,
            tolerance,
            details: details.to_string(),
        }
    }
}

fn run_driver(config: &SimConfig, ticks: u64) -> SimResult<SimulationDriver> {
    let mut driver = SimulationDriver::from_config(config)?;
    for _ in 0..ticks {
        driver.tick();
    }
    Ok(driver)
}

/// Reflect the source and every emission across the x axis.
///
/// The beam is expanded so the mirrored rays keep their original order.
fn mirror_config(config: &SimConfig) -> SimResult<SimConfig> {
    let mut mirrored = config.clone();
    mirrored.black_hole.position = config.black_hole.position.mirrored_y();
    mirrored.rays = config.all_rays()?.iter().map(|r| r.mirrored_y()).collect();
    mirrored.beam = None;
    Ok(mirrored)
}

/// MR-1: Mirror Symmetry
///
/// Error is the largest coordinate mismatch between a trail and the
/// reflection of its mirror image, relative to r_s.
#[must_use]
pub fn check_mirror_symmetry(config: &SimConfig, ticks: u64, tolerance: f64) -> MetamorphicResult {
    const NAME: &str = "Mirror Symmetry";

    let original = match run_driver(config, ticks) {
        Ok(d) => d,
        Err(e) => return MetamorphicResult::fail(NAME, f64::NAN, tolerance, &e.to_string()),
    };
    let mirrored = match mirror_config(config).and_then(|c| run_driver(&c, ticks)) {
        Ok(d) => d,
        Err(e) => return MetamorphicResult::fail(NAME, f64::NAN, tolerance, &e.to_string()),
    };

    let scale = original.source().r_s();
    let a = original.snapshot();
    let b = mirrored.snapshot();
    let mut max_error = 0.0_f64;

    for (index, (ra, rb)) in a.rays.iter().zip(&b.rays).enumerate() {
        if ra.status != rb.status || ra.path.len() != rb.path.len() {
            return MetamorphicResult::fail(
                NAME,
                f64::INFINITY,
                tolerance,
                &format!(
                    "ray {index}: {:?} with {} points vs {:?} with {} points",
                    ra.status,
                    ra.path.len(),
                    rb.status,
                    rb.path.len()
                ),
            );
        }
        for (pa, pb) in ra.path.iter().zip(&rb.path) {
            let dx = (pa.x - pb.x).abs();
            let dy = (pa.y + pb.y).abs();
            max_error = max_error.max(dx.max(dy) / scale);
        }
    }

    if max_error <= tolerance {
        MetamorphicResult::pass(NAME, max_error, tolerance)
    } else {
        MetamorphicResult::fail(
            NAME,
            max_error,
            tolerance,
            &format!("Max mirrored deviation: {max_error:.2e} r_s"),
        )
    }
}

/// MR-2: Deterministic Replay
///
/// Same configuration should produce bit-identical trails.
#[must_use]
pub fn check_determinism(config: &SimConfig, ticks: u64) -> MetamorphicResult {
    const NAME: &str = "Deterministic Replay";

    let runs = run_driver(config, ticks).and_then(|a| Ok((a, run_driver(config, ticks)?)));
    let (first, second) = match runs {
        Ok(pair) => pair,
        Err(e) => return MetamorphicResult::fail(NAME, f64::NAN, 0.0, &e.to_string()),
    };

    if first.snapshot().fingerprint() == second.snapshot().fingerprint() {
        MetamorphicResult::pass(NAME, 0.0, 0.0)
    } else {
        MetamorphicResult::fail(NAME, 1.0, 0.0, "Results not bit-identical")
    }
}

/// MR-3: Execution Independence
///
/// Photons never interact, so stepping them in parallel must not change a
/// single bit.
#[must_use]
pub fn check_execution_independence(config: &SimConfig, ticks: u64) -> MetamorphicResult {
    const NAME: &str = "Execution Independence";

    let mut sequential = config.clone();
    sequential.execution.parallel = false;
    let mut parallel = config.clone();
    parallel.execution.parallel = true;

    let runs = run_driver(&sequential, ticks).and_then(|a| Ok((a, run_driver(&parallel, ticks)?)));
    let (seq, par) = match runs {
        Ok(pair) => pair,
        Err(e) => return MetamorphicResult::fail(NAME, f64::NAN, 0.0, &e.to_string()),
    };

    if seq.snapshot().fingerprint() == par.snapshot().fingerprint() {
        MetamorphicResult::pass(NAME, 0.0, 0.0)
    } else {
        MetamorphicResult::fail(NAME, 1.0, 0.0, "Parallel ticks diverged from sequential")
    }
}

/// MR-4: Conservation
///
/// Largest relative drift of `L` or `E` over all monitored photons and
/// all ticks. The monitored region follows the configured guard margin.
#[must_use]
pub fn check_conservation(config: &SimConfig, ticks: u64, tolerance: f64) -> MetamorphicResult {
    const NAME: &str = "Conservation";

    let mut quiet = config.clone();
    quiet.guard.enabled = false;
    let mut driver = match SimulationDriver::from_config(&quiet) {
        Ok(d) => d,
        Err(e) => return MetamorphicResult::fail(NAME, f64::NAN, tolerance, &e.to_string()),
    };
    let guard = ConservationGuard::new(GuardConfig {
        tolerance,
        ..config.guard.clone()
    });
    let r_s = driver.source().r_s();

    let mut max_l = 0.0_f64;
    let mut max_e = 0.0_f64;
    for _ in 0..ticks {
        driver.tick();
        let report = guard.check(driver.rays(), r_s);
        max_l = max_l.max(report.max_angular_momentum_drift);
        max_e = max_e.max(report.max_energy_drift);
        if report.findings.iter().any(|f| !f.relative_error.is_finite()) {
            return MetamorphicResult::fail(NAME, f64::NAN, tolerance, "Non-finite drift");
        }
    }

    let max_error = max_l.max(max_e);
    if max_error <= tolerance {
        MetamorphicResult::pass(NAME, max_error, tolerance)
    } else {
        MetamorphicResult::fail(
            NAME,
            max_error,
            tolerance,
            &format!("Max L drift: {max_l:.2e}, max E drift: {max_e:.2e}"),
        )
    }
}

/// Run all metamorphic checks on a configuration.
#[must_use]
pub fn run_all_metamorphic_checks(config: &SimConfig, ticks: u64) -> Vec<MetamorphicResult> {
    vec![
        check_mirror_symmetry(config, ticks, MIRROR_TOLERANCE),
        check_determinism(config, ticks),
        check_execution_independence(config, ticks),
        check_conservation(config, ticks, CONSERVATION_TOLERANCE),
    ]
}
