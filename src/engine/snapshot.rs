//! Read-only view of a simulation after a tick.
//!
//! A snapshot owns copies of every trail so renderers and verifiers can
//! keep it around while the driver moves on.

use serde::{Deserialize, Serialize};

use crate::geodesic::ray::{RayState, RayStatus};
use crate::geodesic::source::GravitySource;
use crate::geodesic::units::Position2D;

/// Where the hole is and how big it is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceGeometry {
    /// Center in world coordinates (m).
    pub position: Position2D,
    /// Event horizon radius (m).
    pub horizon_radius: f64,
}

impl From<&GravitySource> for SourceGeometry {
    fn from(source: &GravitySource) -> Self {
        Self {
            position: source.position(),
            horizon_radius: source.r_s(),
        }
    }
}

/// One photon as seen by a renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaySnapshot {
    /// Lifecycle status.
    pub status: RayStatus,
    /// Retained trail, oldest first.
    pub path: Vec<Position2D>,
}

impl From<&RayState> for RaySnapshot {
    fn from(ray: &RayState) -> Self {
        Self {
            status: ray.status(),
            path: ray.path().to_vec(),
        }
    }
}

/// State of all photons after a completed tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Completed ticks.
    pub tick: u64,
    /// Source geometry.
    pub source: SourceGeometry,
    /// Photons in emission order.
    pub rays: Vec<RaySnapshot>,
}

impl Snapshot {
    /// Capture a snapshot.
    #[must_use]
    pub fn capture(tick: u64, source: &GravitySource, rays: &[RayState]) -> Self {
        Self {
            tick,
            source: SourceGeometry::from(source),
            rays: rays.iter().map(RaySnapshot::from).collect(),
        }
    }

    /// Number of photons still being integrated.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.rays
            .iter()
            .filter(|r| r.status == RayStatus::Active)
            .count()
    }

    /// Number of absorbed photons.
    #[must_use]
    pub fn absorbed_count(&self) -> usize {
        self.rays.len() - self.active_count()
    }

    /// BLAKE3 digest of every status and path coordinate, bit for bit.
    ///
    /// Two snapshots share a fingerprint exactly when their trails are
    /// bitwise identical, which is what determinism checks compare.
    #[must_use]
    pub fn fingerprint(&self) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.tick.to_le_bytes());
        hasher.update(&self.source.position.x.to_bits().to_le_bytes());
        hasher.update(&self.source.position.y.to_bits().to_le_bytes());
        hasher.update(&self.source.horizon_radius.to_bits().to_le_bytes());

        for ray in &self.rays {
            let status: u8 = match ray.status {
                RayStatus::Active => 0,
                RayStatus::Absorbed => 1,
            };
            hasher.update(&[status]);
            hasher.update(&(ray.path.len() as u64).to_le_bytes());
            for point in &ray.path {
                hasher.update(&point.x.to_bits().to_le_bytes());
                hasher.update(&point.y.to_bits().to_le_bytes());
            }
        }

        *hasher.finalize().as_bytes()
    }

    /// Fingerprint as lowercase hex.
    #[must_use]
    pub fn fingerprint_hex(&self) -> String {
        self.fingerprint()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }
}
