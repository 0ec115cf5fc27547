//! The central mass.

use serde::{Deserialize, Serialize};
use uom::si::f64::Length;

use crate::error::{SimError, SimResult};
use crate::geodesic::units::{meters, Position2D, SourceMass, SAGITTARIUS_A_MASS};

/// Non-rotating point mass fixed in the equatorial plane.
///
/// Immutable after construction; the horizon radius is derived once.
/// Serialized as `{ mass_kg, position }`; deserializing goes through
/// [`GravitySource::new`] so `r_s` is always re-derived from a valid mass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SourceRecord", into = "SourceRecord")]
pub struct GravitySource {
    mass: SourceMass,
    position: Position2D,
    r_s: f64,
}

impl GravitySource {
    /// Create a gravity source.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Configuration` if the mass is not strictly
    /// positive and finite, or the position is not finite.
    pub fn new(mass: SourceMass, position: Position2D) -> SimResult<Self> {
        let kg = mass.as_kg();
        if !kg.is_finite() || kg <= 0.0 {
            return Err(SimError::config(format!(
                "black hole mass must be positive and finite, got {kg:e} kg"
            )));
        }
        if !position.is_finite() {
            return Err(SimError::config("black hole position must be finite"));
        }

        let r_s = meters(mass.schwarzschild_radius());
        if r_s <= 0.0 || !r_s.is_finite() {
            return Err(SimError::config(format!(
                "mass {kg:e} kg yields a degenerate horizon radius {r_s:e} m"
            )));
        }

        Ok(Self {
            mass,
            position,
            r_s,
        })
    }

    /// Create from a mass in kilograms.
    ///
    /// # Errors
    ///
    /// See [`GravitySource::new`].
    pub fn from_kg(kg: f64, position: Position2D) -> SimResult<Self> {
        Self::new(SourceMass::from_kg(kg), position)
    }

    /// Sagittarius A* at the origin.
    ///
    /// # Errors
    ///
    /// Never fails for the preset mass; the signature mirrors [`GravitySource::new`].
    pub fn sagittarius_a() -> SimResult<Self> {
        Self::from_kg(SAGITTARIUS_A_MASS, Position2D::origin())
    }

    /// Mass of the source.
    #[must_use]
    pub const fn mass(&self) -> SourceMass {
        self.mass
    }

    /// Fixed position.
    #[must_use]
    pub const fn position(&self) -> Position2D {
        self.position
    }

    /// Horizon radius in meters.
    #[must_use]
    pub const fn r_s(&self) -> f64 {
        self.r_s
    }

    /// Horizon radius as a typed length.
    #[must_use]
    pub fn horizon_radius(&self) -> Length {
        self.mass.schwarzschild_radius()
    }
}

/// Wire form of a [`GravitySource`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct SourceRecord {
    mass_kg: f64,
    position: Position2D,
}

impl TryFrom<SourceRecord> for GravitySource {
    type Error = SimError;

    fn try_from(record: SourceRecord) -> SimResult<Self> {
        Self::from_kg(record.mass_kg, record.position)
    }
}

impl From<GravitySource> for SourceRecord {
    fn from(source: GravitySource) -> Self {
        Self {
            mass_kg: source.mass.as_kg(),
            position: source.position,
        }
    }
}
