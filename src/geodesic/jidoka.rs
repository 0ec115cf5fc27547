//! Jidoka (自働化) - conservation monitoring with graceful degradation.
//!
//! After a tick, every active photon's `L` and `E` are recomputed from its
//! integrated state and compared with the constants fixed at emission.
//! Drift is classified by graduated severity. The guard never halts the
//! simulation: it reports, and the caller decides.
//!
//! Photons within `horizon_margin · r_s` of the horizon are not checked:
//! as `f → 0` the fixed-step truncation error in `E` grows without bound,
//! and those photons are about to be absorbed anyway.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::geodesic::ray::RayState;

/// Severity levels for a conservation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Within tolerance.
    Acceptable,
    /// Approaching tolerance.
    Warning,
    /// Tolerance exceeded.
    Critical,
}

/// Conserved quantity a finding refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    /// `L = r² dφ/dλ`.
    AngularMomentum,
    /// `E = f dt/dλ`.
    Energy,
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AngularMomentum => write!(f, "angular momentum"),
            Self::Energy => write!(f, "energy"),
        }
    }
}

/// Guard configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GuardConfig {
    /// Run the guard after every tick.
    pub enabled: bool,
    /// Relative drift tolerance.
    pub tolerance: f64,
    /// Warning threshold as a fraction of the tolerance.
    pub warning_fraction: f64,
    /// Photons with `r < (1 + horizon_margin) · r_s` are skipped.
    pub horizon_margin: f64,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tolerance: 1e-6,
            warning_fraction: 0.8,
            horizon_margin: 0.1,
        }
    }
}

impl GuardConfig {
    /// Classify a relative drift.
    #[must_use]
    pub fn classify(&self, drift: f64) -> Severity {
        if !drift.is_finite() || drift > self.tolerance {
            Severity::Critical
        } else if drift > self.tolerance * self.warning_fraction {
            Severity::Warning
        } else {
            Severity::Acceptable
        }
    }

    /// Check if a photon at `r` lies in the monitored region.
    #[must_use]
    pub fn monitors(&self, r: f64, r_s: f64) -> bool {
        r >= (1.0 + self.horizon_margin) * r_s
    }
}

/// One non-acceptable measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardFinding {
    /// Index of the photon in the driver.
    pub ray_index: usize,
    /// Which quantity drifted.
    pub metric: Metric,
    /// Relative drift against the emission value.
    pub relative_error: f64,
    /// Classified severity.
    pub severity: Severity,
}

/// Result of one guard pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuardReport {
    /// Photons inspected.
    pub checked: usize,
    /// Active photons skipped inside the horizon margin.
    pub skipped_near_horizon: usize,
    /// Largest angular momentum drift seen.
    pub max_angular_momentum_drift: f64,
    /// Largest energy drift seen.
    pub max_energy_drift: f64,
    /// Warning and critical findings.
    pub findings: Vec<GuardFinding>,
}

impl GuardReport {
    /// Worst severity in the report.
    #[must_use]
    pub fn worst(&self) -> Severity {
        self.findings
            .iter()
            .map(|f| f.severity)
            .max()
            .unwrap_or(Severity::Acceptable)
    }

    /// Check if everything was within tolerance.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.worst() == Severity::Acceptable
    }
}

fn relative(current: f64, initial: f64) -> f64 {
    if initial.abs() > f64::EPSILON {
        (current - initial).abs() / initial.abs()
    } else {
        (current - initial).abs()
    }
}

/// Conservation guard over a set of photons.
#[derive(Debug, Clone, Default)]
pub struct ConservationGuard {
    config: GuardConfig,
}

impl ConservationGuard {
    /// Create a new guard.
    #[must_use]
    pub const fn new(config: GuardConfig) -> Self {
        Self { config }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Inspect every active photon.
    pub fn check(&self, rays: &[RayState], r_s: f64) -> GuardReport {
        let mut report = GuardReport::default();

        for (index, ray) in rays.iter().enumerate().filter(|(_, r)| r.is_active()) {
            if !self.config.monitors(ray.r(), r_s) {
                report.skipped_near_horizon += 1;
                continue;
            }
            report.checked += 1;
            let constants = ray.conserved();

            let l_drift = relative(ray.implied_angular_momentum(), constants.angular_momentum);
            let e_drift = relative(ray.implied_energy(r_s), constants.energy);
            report.max_angular_momentum_drift = report.max_angular_momentum_drift.max(l_drift);
            report.max_energy_drift = report.max_energy_drift.max(e_drift);

            for (metric, drift) in [(Metric::AngularMomentum, l_drift), (Metric::Energy, e_drift)] {
                let severity = self.config.classify(drift);
                if severity == Severity::Acceptable {
                    continue;
                }
                if severity == Severity::Critical {
                    warn!(
                        ray = index,
                        %metric,
                        drift,
                        tolerance = self.config.tolerance,
                        "conservation drift exceeds tolerance"
                    );
                }
                report.findings.push(GuardFinding {
                    ray_index: index,
                    metric,
                    relative_error: drift,
                    severity,
                });
            }
        }

        report
    }
}
