//! Physical constants and typed quantities.
//!
//! Mass and horizon radius cross the public API as `uom` quantities so a
//! kilogram can never be handed where a meter is expected. Inside the
//! integrator everything is plain `f64` in SI units.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Neg, Sub};
use uom::si::f64::{Length, Mass};
use uom::si::length::meter;
use uom::si::mass::kilogram;

/// Gravitational constant (m³ kg⁻¹ s⁻²).
pub const G: f64 = 6.674_30e-11;

/// Speed of light in vacuum (m/s).
pub const C: f64 = 299_792_458.0;

/// Mass used by the Sagittarius A* preset (kg).
pub const SAGITTARIUS_A_MASS: f64 = 8.54e36;

/// Type-safe mass wrapper.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct SourceMass(pub Mass);

impl SourceMass {
    /// Create from kilograms.
    #[must_use]
    pub fn from_kg(kg: f64) -> Self {
        Self(Mass::new::<kilogram>(kg))
    }

    /// Get value in kilograms.
    #[must_use]
    pub fn as_kg(&self) -> f64 {
        self.0.get::<kilogram>()
    }

    /// Schwarzschild radius `2GM/c²` of this mass.
    #[must_use]
    pub fn schwarzschild_radius(&self) -> Length {
        Length::new::<meter>(2.0 * G * self.as_kg() / (C * C))
    }
}

/// Point in the equatorial plane (meters).
///
/// Serialized as a `[x, y]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Position2D {
    pub x: f64,
    pub y: f64,
}

impl Position2D {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// The origin.
    #[must_use]
    pub const fn origin() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Euclidean norm.
    #[must_use]
    pub fn magnitude(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Reflection across the x axis.
    #[must_use]
    pub fn mirrored_y(&self) -> Self {
        Self::new(self.x, -self.y)
    }

    /// Check if both components are finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Position2D {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Position2D {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Position2D {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y)
    }
}

impl From<[f64; 2]> for Position2D {
    fn from([x, y]: [f64; 2]) -> Self {
        Self::new(x, y)
    }
}

impl From<Position2D> for [f64; 2] {
    fn from(p: Position2D) -> Self {
        [p.x, p.y]
    }
}

/// Helper to read a `Length` in meters.
#[must_use]
pub fn meters(length: Length) -> f64 {
    length.get::<meter>()
}
