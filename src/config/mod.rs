//! Configuration system with YAML schema and validation.
//!
//! Implements Poka-Yoke (mistake-proofing) through:
//! - Type-safe configuration structs
//! - Schema validation via serde and `validator`
//! - Runtime semantic validation (horizon, beam, step size)
//!
//! A minimal file:
//!
//! ```yaml
//! black_hole:
//!   mass_kg: 8.54e36
//! beam:
//!   x: -1.0e11
//!   y_min: -7.5e10
//!   y_max: 7.5e10
//!   spacing: 1.0e10
//!   direction: [0.5, 0.0]
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

use crate::error::{SimError, SimResult};
use crate::geodesic::history::HistoryRetention;
use crate::geodesic::jidoka::GuardConfig;
use crate::geodesic::scenarios::{BeamConfig, RaySpec};
use crate::geodesic::source::GravitySource;
use crate::geodesic::stepper::StepSize;
use crate::geodesic::units::{Position2D, SAGITTARIUS_A_MASS};

/// Top-level simulation configuration.
///
/// Loaded from YAML files with full schema validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SimConfig {
    /// Schema version for forward compatibility.
    #[validate(length(min = 1))]
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Simulation metadata.
    #[validate(nested)]
    #[serde(default)]
    pub simulation: SimulationMeta,

    /// The gravity source.
    #[validate(nested)]
    #[serde(default)]
    pub black_hole: BlackHoleConfig,

    /// Individually listed photons.
    #[validate(nested)]
    #[serde(default)]
    pub rays: Vec<RaySpec>,

    /// Optional column of parallel photons, emitted after `rays`.
    #[validate(nested)]
    #[serde(default)]
    pub beam: Option<BeamConfig>,

    /// Integration settings.
    #[validate(nested)]
    #[serde(default)]
    pub integration: IntegrationConfig,

    /// Path retention policy shared by every photon.
    #[serde(default)]
    pub history: HistoryRetention,

    /// Sequential or data-parallel ticks.
    #[validate(nested)]
    #[serde(default)]
    pub execution: ExecutionConfig,

    /// Conservation guard.
    #[serde(default)]
    pub guard: GuardConfig,
}

fn default_schema_version() -> String {
    "1.0".to_string()
}

impl SimConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - YAML parsing fails
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> SimResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string.
    ///
    /// # Errors
    ///
    /// Returns error if parsing or validation fails.
    pub fn from_yaml(yaml: &str) -> SimResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;

        // Poka-Yoke: validate all constraints
        config.validate()?;

        config.validate_semantic()?;

        Ok(config)
    }

    /// Serialize back to YAML.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_yaml(&self) -> SimResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Create a builder for configuration.
    #[must_use]
    pub fn builder() -> SimConfigBuilder {
        SimConfigBuilder::default()
    }

    /// The lensing demo: Sagittarius A* at the origin and a 15-photon beam.
    #[must_use]
    pub fn sagittarius_beam() -> Self {
        Self {
            simulation: SimulationMeta {
                name: "sagittarius-beam".to_string(),
                description: "Parallel beam lensed by Sagittarius A*".to_string(),
            },
            beam: Some(BeamConfig::sagittarius_demo()),
            ..Self::default()
        }
    }

    /// Validate semantic constraints beyond schema.
    ///
    /// Everything a driver would reject is rejected here too, so a config
    /// that passes can always be turned into a simulation.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Configuration` describing the first violation.
    pub fn validate_semantic(&self) -> SimResult<()> {
        StepSize::new(self.integration.dlambda)?;
        self.history.validate()?;

        if self.execution.worker_threads == Some(0) {
            return Err(SimError::config("worker_threads must be at least 1"));
        }
        if self.guard.tolerance.is_nan() || self.guard.tolerance <= 0.0 {
            return Err(SimError::config(format!(
                "guard tolerance must be positive, got {}",
                self.guard.tolerance
            )));
        }
        if !(0.0..=1.0).contains(&self.guard.warning_fraction) {
            return Err(SimError::config(format!(
                "guard warning_fraction must lie in [0, 1], got {}",
                self.guard.warning_fraction
            )));
        }
        if self.guard.horizon_margin.is_nan() || self.guard.horizon_margin < 0.0 {
            return Err(SimError::config(format!(
                "guard horizon_margin must be non-negative, got {}",
                self.guard.horizon_margin
            )));
        }

        let source = self.black_hole.source()?;
        let r_s = source.r_s();
        for (index, ray) in self.all_rays()?.iter().enumerate() {
            let r = (ray.position - source.position()).magnitude();
            if r.is_nan() || r <= r_s {
                return Err(SimError::config(format!(
                    "ray {index} starts at r = {r:e} m, not outside the horizon r_s = {r_s:e} m"
                )));
            }
            if ray.direction.magnitude() == 0.0 {
                return Err(SimError::config(format!(
                    "ray {index} has a zero direction vector"
                )));
            }
        }

        Ok(())
    }

    /// Listed rays followed by the expanded beam.
    ///
    /// # Errors
    ///
    /// Returns error if the beam cannot be expanded.
    pub fn all_rays(&self) -> SimResult<Vec<RaySpec>> {
        let mut rays = self.rays.clone();
        if let Some(beam) = &self.beam {
            rays.extend(beam.expand()?);
        }
        Ok(rays)
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            simulation: SimulationMeta::default(),
            black_hole: BlackHoleConfig::default(),
            rays: Vec::new(),
            beam: None,
            integration: IntegrationConfig::default(),
            history: HistoryRetention::default(),
            execution: ExecutionConfig::default(),
            guard: GuardConfig::default(),
        }
    }
}

/// Configuration builder for programmatic construction.
#[derive(Debug, Default)]
pub struct SimConfigBuilder {
    mass_kg: Option<f64>,
    position: Option<Position2D>,
    rays: Vec<RaySpec>,
    beam: Option<BeamConfig>,
    dlambda: Option<f64>,
    history: Option<HistoryRetention>,
    parallel: Option<bool>,
    worker_threads: Option<usize>,
    guard: Option<GuardConfig>,
}

impl SimConfigBuilder {
    /// Set the black hole mass in kilograms.
    #[must_use]
    pub const fn mass_kg(mut self, kg: f64) -> Self {
        self.mass_kg = Some(kg);
        self
    }

    /// Set the black hole position.
    #[must_use]
    pub const fn position(mut self, position: Position2D) -> Self {
        self.position = Some(position);
        self
    }

    /// Add a single photon.
    #[must_use]
    pub fn ray(mut self, ray: RaySpec) -> Self {
        self.rays.push(ray);
        self
    }

    /// Add several photons.
    #[must_use]
    pub fn rays<I: IntoIterator<Item = RaySpec>>(mut self, rays: I) -> Self {
        self.rays.extend(rays);
        self
    }

    /// Set the beam emitter.
    #[must_use]
    pub const fn beam(mut self, beam: BeamConfig) -> Self {
        self.beam = Some(beam);
        self
    }

    /// Set the affine step size.
    #[must_use]
    pub const fn dlambda(mut self, dlambda: f64) -> Self {
        self.dlambda = Some(dlambda);
        self
    }

    /// Set the path retention policy.
    #[must_use]
    pub const fn history(mut self, history: HistoryRetention) -> Self {
        self.history = Some(history);
        self
    }

    /// Enable or disable parallel ticks.
    #[must_use]
    pub const fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = Some(parallel);
        self
    }

    /// Use a dedicated pool of `n` worker threads.
    #[must_use]
    pub const fn worker_threads(mut self, n: usize) -> Self {
        self.worker_threads = Some(n);
        self
    }

    /// Set the guard configuration.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // GuardConfig doesn't impl Copy
    pub fn guard(mut self, config: GuardConfig) -> Self {
        self.guard = Some(config);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> SimConfig {
        let mut config = SimConfig::default();

        if let Some(kg) = self.mass_kg {
            config.black_hole.mass_kg = kg;
        }
        if let Some(position) = self.position {
            config.black_hole.position = position;
        }
        config.rays = self.rays;
        config.beam = self.beam;
        if let Some(dlambda) = self.dlambda {
            config.integration.dlambda = dlambda;
        }
        if let Some(history) = self.history {
            config.history = history;
        }
        if let Some(parallel) = self.parallel {
            config.execution.parallel = parallel;
        }
        if self.worker_threads.is_some() {
            config.execution.worker_threads = self.worker_threads;
        }
        if let Some(guard) = self.guard {
            config.guard = guard;
        }

        config
    }
}

/// Simulation metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct SimulationMeta {
    /// Simulation name.
    #[serde(default)]
    pub name: String,

    /// Description.
    #[serde(default)]
    pub description: String,
}

/// Gravity source settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct BlackHoleConfig {
    /// Mass in kilograms.
    #[validate(range(exclusive_min = 0.0))]
    pub mass_kg: f64,

    /// Center in world coordinates (m).
    #[serde(default)]
    pub position: Position2D,
}

impl Default for BlackHoleConfig {
    fn default() -> Self {
        Self {
            mass_kg: SAGITTARIUS_A_MASS,
            position: Position2D::origin(),
        }
    }
}

impl BlackHoleConfig {
    /// Build the gravity source.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Configuration` for an invalid mass or position.
    pub fn source(&self) -> SimResult<GravitySource> {
        GravitySource::from_kg(self.mass_kg, self.position)
    }
}

/// Integration settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct IntegrationConfig {
    /// Affine-parameter increment per tick.
    #[validate(range(exclusive_min = 0.0))]
    #[serde(default = "default_dlambda")]
    pub dlambda: f64,
}

const fn default_dlambda() -> f64 {
    1.0
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            dlambda: default_dlambda(),
        }
    }
}

/// Execution strategy for ticks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ExecutionConfig {
    /// Step photons in parallel with rayon.
    #[serde(default)]
    pub parallel: bool,

    /// Dedicated pool size; the global rayon pool is used when absent.
    #[validate(range(min = 1))]
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = SimConfig::default();

        assert_eq!(config.schema_version, "1.0");
        assert!((config.black_hole.mass_kg - SAGITTARIUS_A_MASS).abs() < 1.0);
        assert_eq!(config.black_hole.position, Position2D::origin());
        assert!((config.integration.dlambda - 1.0).abs() < f64::EPSILON);
        assert!(!config.execution.parallel);
        assert!(config.rays.is_empty());
        assert!(config.beam.is_none());
        assert!(config.validate_semantic().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = SimConfig::builder()
            .mass_kg(1e30)
            .position(Position2D::new(1.0, 2.0))
            .ray(RaySpec::new(Position2D::new(-1e5, 0.0), Position2D::new(1.0, 0.0)))
            .dlambda(0.25)
            .parallel(true)
            .worker_threads(2)
            .history(HistoryRetention::RingBuffer { capacity: 8 })
            .build();

        assert!((config.black_hole.mass_kg - 1e30).abs() < 1.0);
        assert_eq!(config.black_hole.position, Position2D::new(1.0, 2.0));
        assert_eq!(config.rays.len(), 1);
        assert!((config.integration.dlambda - 0.25).abs() < f64::EPSILON);
        assert!(config.execution.parallel);
        assert_eq!(config.execution.worker_threads, Some(2));
        assert_eq!(config.history.capacity(), Some(8));
        assert!(config.validate_semantic().is_ok());
    }

    #[test]
    fn test_config_yaml_parse() {
        let yaml = r"
simulation:
  name: lensing
black_hole:
  mass_kg: 8.54e36
  position: [0.0, 0.0]
rays:
  - position: [-1.0e11, 3.0e10]
    direction: [1.0, 0.0]
beam:
  x: -1.0e11
  y_min: -7.5e10
  y_max: 7.5e10
  spacing: 1.0e10
  direction: [0.5, 0.0]
integration:
  dlambda: 0.5
history:
  policy: ring_buffer
  capacity: 500
execution:
  parallel: true
  worker_threads: 2
";
        let config = SimConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.simulation.name, "lensing");
        assert_eq!(config.all_rays().unwrap().len(), 16);
        assert!((config.integration.dlambda - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.history, HistoryRetention::RingBuffer { capacity: 500 });
        assert_eq!(config.execution.worker_threads, Some(2));
        assert!(config.guard.enabled);
    }

    #[test]
    fn test_config_yaml_integers_accepted() {
        let yaml = r"
black_hole:
  mass_kg: 1000000
  position: [0, 0]
rays:
  - position: [-10, 0]
    direction: [1, 0]
";
        assert!(SimConfig::from_yaml(yaml).is_ok());
    }

    #[test]
    fn test_config_yaml_roundtrip() {
        let config = SimConfig::sagittarius_beam();
        let yaml = config.to_yaml().unwrap();
        let back = SimConfig::from_yaml(&yaml).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn test_config_validation_fails_zero_mass() {
        let yaml = r"
black_hole:
  mass_kg: 0.0
";
        let err = SimConfig::from_yaml(yaml).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_config_validation_fails_negative_step() {
        let yaml = r"
integration:
  dlambda: -1.0
";
        assert!(SimConfig::from_yaml(yaml).unwrap_err().is_configuration());
    }

    #[test]
    fn test_config_rejects_ray_inside_horizon() {
        // r_s of Sagittarius A* is ~1.27e10 m
        let yaml = r"
rays:
  - position: [1.0e10, 0.0]
    direction: [1.0, 0.0]
";
        let err = SimConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("ray 0"));
    }

    #[test]
    fn test_config_rejects_zero_direction() {
        let config = SimConfig::builder()
            .ray(RaySpec::new(Position2D::new(-1e11, 0.0), Position2D::origin()))
            .build();
        assert!(config.validate_semantic().is_err());
    }

    #[test]
    fn test_config_rejects_unknown_fields() {
        let yaml = r"
black_hole:
  mass_kg: 1.0e30
  spin: 0.9
";
        assert!(SimConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_config_guard_rejects_misspelled_keys() {
        let err = SimConfig::from_yaml("guard:\n  tolerence: 1.0e-8\n").unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("tolerence"));

        // Omitted keys still fall back to their defaults.
        let config = SimConfig::from_yaml("guard:\n  tolerance: 1.0e-8\n").unwrap();
        assert!((config.guard.tolerance - 1e-8).abs() < f64::EPSILON);
        assert!((config.guard.horizon_margin - 0.1).abs() < f64::EPSILON);
        assert!(config.guard.enabled);
    }

    #[test]
    fn test_config_rejects_bad_history_and_threads() {
        let yaml = r"
history:
  policy: decimate
  capacity: 1
";
        assert!(SimConfig::from_yaml(yaml).is_err());

        let config = SimConfig::builder().worker_threads(0).build();
        assert!(config.validate().is_err());
        assert!(config.validate_semantic().is_err());
    }

    #[test]
    fn test_config_rejects_bad_guard() {
        let config = SimConfig::builder()
            .guard(GuardConfig {
                tolerance: 0.0,
                ..GuardConfig::default()
            })
            .build();
        assert!(config.validate_semantic().is_err());

        let config = SimConfig::builder()
            .guard(GuardConfig {
                warning_fraction: 1.5,
                ..GuardConfig::default()
            })
            .build();
        assert!(config.validate_semantic().is_err());
    }

    #[test]
    fn test_sagittarius_preset() {
        let config = SimConfig::sagittarius_beam();
        assert_eq!(config.all_rays().unwrap().len(), 15);
        assert!(config.validate().is_ok());
        assert!(config.validate_semantic().is_ok());
    }

    #[test]
    fn test_config_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sim.yaml");
        std::fs::write(&path, SimConfig::sagittarius_beam().to_yaml().unwrap()).unwrap();

        let config = SimConfig::load(&path).unwrap();
        assert_eq!(config.simulation.name, "sagittarius-beam");

        let missing = SimConfig::load(dir.path().join("missing.yaml")).unwrap_err();
        assert!(matches!(missing, SimError::Io(_)));
    }
}
