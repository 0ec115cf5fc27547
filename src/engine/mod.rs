//! Core simulation driver.
//!
//! Owns the gravity source and every photon, and advances all of them once
//! per tick:
//! - Per-photon RK4 steps (sequential or data-parallel via rayon)
//! - Local recovery from numeric degeneracy, surfaced as diagnostics
//! - Conservation guard after each tick
//! - Immutable snapshots between ticks
//!
//! A tick is never observable half-done: it takes `&mut self`, while
//! [`SimulationDriver::snapshot`] only needs `&self`.

pub mod snapshot;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub use snapshot::{RaySnapshot, Snapshot, SourceGeometry};

use crate::config::SimConfig;
use crate::error::{SimError, SimResult};
use crate::geodesic::field::SchwarzschildField;
use crate::geodesic::jidoka::{ConservationGuard, GuardReport};
use crate::geodesic::ray::RayState;
use crate::geodesic::scenarios::RaySpec;
use crate::geodesic::source::GravitySource;
use crate::geodesic::stepper::{Integrator, Rk4Stepper, StepOutcome, StepSize};
use crate::geodesic::units::Position2D;

/// A recovered per-photon failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Tick during which the failure happened (1-based).
    pub tick: u64,
    /// Photon index in emission order.
    pub ray_index: usize,
    /// Radial coordinate at the start of the failed step.
    pub r: f64,
    /// Horizon radius.
    pub r_s: f64,
    /// Rendered error.
    pub message: String,
}

/// Counts of what happened during one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickSummary {
    /// Tick number just completed.
    pub tick: u64,
    /// Photons that advanced and remain active.
    pub advanced: usize,
    /// Photons absorbed at the horizon this tick.
    pub crossed_horizon: usize,
    /// Photons absorbed after a numeric degeneracy this tick.
    pub degenerate: usize,
    /// Photons that were already frozen.
    pub frozen: usize,
}

/// How photons are stepped within a tick.
#[derive(Debug)]
enum Execution {
    Sequential,
    /// `None` uses rayon's global pool.
    Parallel(Option<rayon::ThreadPool>),
}

/// Main simulation driver.
#[derive(Debug)]
pub struct SimulationDriver {
    source: GravitySource,
    rays: Vec<RayState>,
    dlambda: StepSize,
    stepper: Rk4Stepper,
    execution: Execution,
    guard: Option<ConservationGuard>,
    last_guard_report: Option<GuardReport>,
    diagnostics: Vec<Diagnostic>,
    tick: u64,
}

impl SimulationDriver {
    /// Set up a simulation from its bare inputs.
    ///
    /// Defaults apply for everything else (unbounded history, sequential
    /// execution, guard enabled).
    ///
    /// # Errors
    ///
    /// Returns `SimError::Configuration` if `mass_kg <= 0`, `dlambda <= 0`,
    /// or any initial ray starts at or inside the horizon.
    pub fn configure(
        mass_kg: f64,
        position: Position2D,
        initial_rays: &[RaySpec],
        dlambda: f64,
    ) -> SimResult<Self> {
        let config = SimConfig::builder()
            .mass_kg(mass_kg)
            .position(position)
            .rays(initial_rays.iter().copied())
            .dlambda(dlambda)
            .build();
        Self::from_config(&config)
    }

    /// Set up a simulation from a full configuration.
    ///
    /// Every input is validated before any photon is emitted.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Configuration` for any invalid input, including a
    /// worker pool that cannot be built.
    pub fn from_config(config: &SimConfig) -> SimResult<Self> {
        config.validate_semantic()?;

        let source = config.black_hole.source()?;
        let dlambda = StepSize::new(config.integration.dlambda)?;
        let rays = config
            .all_rays()?
            .iter()
            .map(|spec| RayState::emit(&source, spec.position, spec.direction, config.history))
            .collect::<SimResult<Vec<_>>>()?;

        let execution = match (config.execution.parallel, config.execution.worker_threads) {
            (false, _) => Execution::Sequential,
            (true, None) => Execution::Parallel(None),
            (true, Some(threads)) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| SimError::config(format!("cannot build worker pool: {e}")))?;
                Execution::Parallel(Some(pool))
            }
        };

        let guard = config
            .guard
            .enabled
            .then(|| ConservationGuard::new(config.guard.clone()));

        info!(
            mass_kg = source.mass().as_kg(),
            r_s = source.r_s(),
            photons = rays.len(),
            dlambda = dlambda.get(),
            parallel = config.execution.parallel,
            "simulation configured"
        );

        Ok(Self {
            source,
            rays,
            dlambda,
            stepper: Rk4Stepper::new(),
            execution,
            guard,
            last_guard_report: None,
            diagnostics: Vec::new(),
            tick: 0,
        })
    }

    /// Advance every active photon by the configured step.
    pub fn tick(&mut self) -> TickSummary {
        self.advance(self.dlambda)
    }

    /// Advance every active photon by `dlambda`.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Configuration` for a non-positive step; nothing is
    /// advanced in that case.
    pub fn tick_by(&mut self, dlambda: f64) -> SimResult<TickSummary> {
        let step = StepSize::new(dlambda)?;
        Ok(self.advance(step))
    }

    /// Tick up to `ticks` times, stopping early once every photon is absorbed.
    ///
    /// Returns the number of ticks performed.
    pub fn run(&mut self, ticks: u64) -> u64 {
        let mut done = 0;
        while done < ticks && self.active_count() > 0 {
            self.tick();
            done += 1;
        }
        done
    }

    fn advance(&mut self, dlambda: StepSize) -> TickSummary {
        let r_s = self.source.r_s();
        let field = SchwarzschildField::new(r_s);
        let stepper = &self.stepper;
        let step_one = |ray: &mut RayState| stepper.step(ray, &field, dlambda);

        let outcomes: Vec<StepOutcome> = match &self.execution {
            Execution::Sequential => self.rays.iter_mut().map(step_one).collect(),
            Execution::Parallel(None) => self.rays.par_iter_mut().map(step_one).collect(),
            Execution::Parallel(Some(pool)) => {
                let rays = &mut self.rays;
                pool.install(|| rays.par_iter_mut().map(step_one).collect())
            }
        };

        self.tick += 1;
        let mut summary = TickSummary {
            tick: self.tick,
            ..TickSummary::default()
        };

        for (index, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                StepOutcome::Advanced => summary.advanced += 1,
                StepOutcome::CrossedHorizon => {
                    debug!(tick = self.tick, ray = index, "photon absorbed at the horizon");
                    summary.crossed_horizon += 1;
                }
                StepOutcome::Degenerate(err) => {
                    let r = self.rays[index].r();
                    warn!(
                        tick = self.tick,
                        ray = index,
                        r,
                        r_s,
                        error = %err,
                        "numeric degeneracy, photon absorbed"
                    );
                    self.diagnostics.push(Diagnostic {
                        tick: self.tick,
                        ray_index: index,
                        r,
                        r_s,
                        message: err.to_string(),
                    });
                    summary.degenerate += 1;
                }
                StepOutcome::Frozen => summary.frozen += 1,
            }
        }

        if let Some(guard) = &self.guard {
            self.last_guard_report = Some(guard.check(&self.rays, r_s));
        }

        summary
    }

    /// Immutable view of the last completed tick.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self.tick, &self.source, &self.rays)
    }

    /// The gravity source.
    #[must_use]
    pub const fn source(&self) -> &GravitySource {
        &self.source
    }

    /// All photons in emission order.
    #[must_use]
    pub fn rays(&self) -> &[RayState] {
        &self.rays
    }

    /// Completed ticks.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Configured affine step.
    #[must_use]
    pub const fn dlambda(&self) -> f64 {
        self.dlambda.get()
    }

    /// Photons still being integrated.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.rays.iter().filter(|r| r.is_active()).count()
    }

    /// Check if photons are stepped in parallel.
    #[must_use]
    pub const fn is_parallel(&self) -> bool {
        matches!(self.execution, Execution::Parallel(_))
    }

    /// Recovered failures so far, oldest first.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Guard report of the last tick, if the guard is enabled.
    #[must_use]
    pub const fn last_guard_report(&self) -> Option<&GuardReport> {
        self.last_guard_report.as_ref()
    }
}
