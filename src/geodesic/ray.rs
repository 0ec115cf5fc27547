//! Per-photon state in equatorial polar coordinates.
//!
//! A ray is emitted from a cartesian point with a direction given in units
//! of c. Polar coordinates are measured from the gravity source, and the
//! conserved quantities
//!
//! ```text
//! L = r² · dφ/dλ
//! E = f · dt/dλ,   f = 1 - r_s / r
//! ```
//!
//! are fixed at emission. Only `(r, φ, dr, dφ)` evolve afterwards.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul};

use crate::error::{SimError, SimResult};
use crate::geodesic::history::{HistoryRetention, PathHistory};
use crate::geodesic::source::GravitySource;
use crate::geodesic::units::{Position2D, C};

/// The integrated 4-vector `y = (r, φ, dr, dφ)`.
///
/// Also used for its derivative `(dr, dφ, d²r, d²φ)`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PhaseVector {
    pub r: f64,
    pub phi: f64,
    pub dr: f64,
    pub dphi: f64,
}

impl PhaseVector {
    /// Create a new phase vector.
    #[must_use]
    pub const fn new(r: f64, phi: f64, dr: f64, dphi: f64) -> Self {
        Self { r, phi, dr, dphi }
    }

    /// Check if every component is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.r.is_finite() && self.phi.is_finite() && self.dr.is_finite() && self.dphi.is_finite()
    }

    /// Name of the first non-finite component, if any.
    #[must_use]
    pub fn first_non_finite(&self) -> Option<&'static str> {
        [
            ("r", self.r),
            ("phi", self.phi),
            ("dr", self.dr),
            ("dphi", self.dphi),
        ]
        .into_iter()
        .find(|(_, v)| !v.is_finite())
        .map(|(name, _)| name)
    }
}

impl Add for PhaseVector {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(
            self.r + rhs.r,
            self.phi + rhs.phi,
            self.dr + rhs.dr,
            self.dphi + rhs.dphi,
        )
    }
}

impl Mul<f64> for PhaseVector {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        Self::new(self.r * rhs, self.phi * rhs, self.dr * rhs, self.dphi * rhs)
    }
}

/// Constants of motion fixed at emission.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Conserved {
    /// Angular momentum `L = r² dφ/dλ`.
    pub angular_momentum: f64,
    /// Energy-like quantity `E = f dt/dλ`.
    pub energy: f64,
}

/// Lifecycle of a photon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RayStatus {
    /// Still being integrated.
    Active,
    /// Crossed the horizon or failed numerically; frozen for good.
    Absorbed,
}

/// Why a photon stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbsorptionCause {
    /// Radial coordinate fell below r_s.
    Horizon,
    /// The field could not be evaluated (r <= 0, r ≈ r_s, or NaN/Inf).
    Degeneracy,
}

/// Physical state of one photon.
///
/// Only [`RayState::emit`] creates one, so an active ray always starts
/// outside the horizon with constants derived from its own state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RayState {
    y: PhaseVector,
    conserved: Conserved,
    center: Position2D,
    position: Position2D,
    path: PathHistory,
    status: RayStatus,
    cause: Option<AbsorptionCause>,
}

impl RayState {
    /// Emit a photon from `position` travelling along `direction` (units of c).
    ///
    /// # Errors
    ///
    /// Returns `SimError::Configuration` if the start point is at or inside
    /// the horizon, or the direction is zero or non-finite.
    pub fn emit(
        source: &GravitySource,
        position: Position2D,
        direction: Position2D,
        retention: HistoryRetention,
    ) -> SimResult<Self> {
        if !position.is_finite() || !direction.is_finite() {
            return Err(SimError::config("ray position and direction must be finite"));
        }
        if direction.magnitude() == 0.0 {
            return Err(SimError::config(format!(
                "ray at ({:e}, {:e}) has a zero direction vector",
                position.x, position.y
            )));
        }
        retention.validate()?;

        let r_s = source.r_s();
        let center = source.position();
        let rel = position - center;
        let r = rel.x.hypot(rel.y);
        if r <= r_s {
            return Err(SimError::config(format!(
                "ray at ({:e}, {:e}) starts at r = {r:e} m, not outside the horizon r_s = {r_s:e} m",
                position.x, position.y
            )));
        }

        let phi = rel.y.atan2(rel.x);
        let (sin_phi, cos_phi) = phi.sin_cos();
        let vx = C * direction.x;
        let vy = C * direction.y;

        let dr = vx * cos_phi + vy * sin_phi;
        let dphi = (-vx * sin_phi + vy * cos_phi) / r;

        let f = 1.0 - r_s / r;
        let dt_dlambda = (dr * dr / (f * f) + r * r * dphi * dphi / f).sqrt();

        let conserved = Conserved {
            angular_momentum: r * r * dphi,
            energy: f * dt_dlambda,
        };
        if !conserved.angular_momentum.is_finite() || !conserved.energy.is_finite() {
            return Err(SimError::config(format!(
                "ray at ({:e}, {:e}) has non-finite constants of motion",
                position.x, position.y
            )));
        }

        Ok(Self {
            y: PhaseVector::new(r, phi, dr, dphi),
            conserved,
            center,
            position,
            path: PathHistory::new(retention),
            status: RayStatus::Active,
            cause: None,
        })
    }

    /// Current `(r, φ, dr, dφ)`.
    #[must_use]
    pub const fn phase(&self) -> PhaseVector {
        self.y
    }

    /// Radial coordinate.
    #[must_use]
    pub const fn r(&self) -> f64 {
        self.y.r
    }

    /// Azimuth.
    #[must_use]
    pub const fn phi(&self) -> f64 {
        self.y.phi
    }

    /// Constants of motion.
    #[must_use]
    pub const fn conserved(&self) -> Conserved {
        self.conserved
    }

    /// Current cartesian position (world space).
    #[must_use]
    pub const fn position(&self) -> Position2D {
        self.position
    }

    /// Recorded trail.
    #[must_use]
    pub const fn path(&self) -> &PathHistory {
        &self.path
    }

    /// Lifecycle status.
    #[must_use]
    pub const fn status(&self) -> RayStatus {
        self.status
    }

    /// Check if still being integrated.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == RayStatus::Active
    }

    /// Reason for absorption, once absorbed.
    #[must_use]
    pub const fn absorption_cause(&self) -> Option<AbsorptionCause> {
        self.cause
    }

    /// `L` implied by the current state.
    #[must_use]
    pub fn implied_angular_momentum(&self) -> f64 {
        self.y.r * self.y.r * self.y.dphi
    }

    /// `E` implied by the current state through the null condition.
    #[must_use]
    pub fn implied_energy(&self, r_s: f64) -> f64 {
        let PhaseVector { r, dr, dphi, .. } = self.y;
        let f = 1.0 - r_s / r;
        f * (dr * dr / (f * f) + r * r * dphi * dphi / f).sqrt()
    }

    /// Cartesian point for a polar pair around this ray's center.
    #[must_use]
    pub fn to_cartesian(&self, r: f64, phi: f64) -> Position2D {
        let (sin_phi, cos_phi) = phi.sin_cos();
        self.center + Position2D::new(r * cos_phi, r * sin_phi)
    }

    /// Commit an integrated phase vector and record its position.
    pub(crate) fn advance(&mut self, next: PhaseVector) {
        self.y = next;
        self.position = self.to_cartesian(next.r, next.phi);
        self.path.push(self.position);
    }

    /// Freeze the ray. Later calls keep the first cause.
    pub(crate) fn absorb(&mut self, cause: AbsorptionCause) {
        if self.status == RayStatus::Active {
            self.status = RayStatus::Absorbed;
            self.cause = Some(cause);
        }
    }
}
