//! Path history with a configurable retention policy.
//!
//! The default keeps every point ever recorded. The bounded policies cap
//! memory for long-running sessions:
//! - `RingBuffer` drops the oldest point once full.
//! - `Decimate` halves the resolution of the retained trail once full,
//!   always keeping the newest point.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::error::{SimError, SimResult};
use crate::geodesic::units::Position2D;

/// Retention policy for a photon trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "policy")]
pub enum HistoryRetention {
    /// Keep every point.
    #[default]
    Unbounded,
    /// Keep the most recent `capacity` points.
    RingBuffer {
        /// Maximum retained points.
        capacity: usize,
    },
    /// Drop every second retained point whenever `capacity` is reached.
    Decimate {
        /// Maximum retained points.
        capacity: usize,
    },
}

impl HistoryRetention {
    /// Validate the policy.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a bounded capacity is below 2.
    pub fn validate(&self) -> SimResult<()> {
        match *self {
            Self::Unbounded => Ok(()),
            Self::RingBuffer { capacity } | Self::Decimate { capacity } if capacity < 2 => {
                Err(SimError::config(format!(
                    "history capacity must be at least 2, got {capacity}"
                )))
            }
            _ => Ok(()),
        }
    }

    /// Capacity bound, if any.
    #[must_use]
    pub const fn capacity(&self) -> Option<usize> {
        match *self {
            Self::Unbounded => None,
            Self::RingBuffer { capacity } | Self::Decimate { capacity } => Some(capacity),
        }
    }
}

/// Ordered trail of cartesian positions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PathHistory {
    points: VecDeque<Position2D>,
    retention: HistoryRetention,
    total_appended: u64,
}

impl PathHistory {
    /// Create an empty history with the given policy.
    #[must_use]
    pub fn new(retention: HistoryRetention) -> Self {
        let points = match retention.capacity() {
            Some(capacity) => VecDeque::with_capacity(capacity),
            None => VecDeque::new(),
        };
        Self {
            points,
            retention,
            total_appended: 0,
        }
    }

    /// Append a point, applying the retention policy.
    pub fn push(&mut self, point: Position2D) {
        self.total_appended += 1;
        match self.retention {
            HistoryRetention::Unbounded => self.points.push_back(point),
            HistoryRetention::RingBuffer { capacity } => {
                if self.points.len() >= capacity {
                    self.points.pop_front();
                }
                self.points.push_back(point);
            }
            HistoryRetention::Decimate { capacity } => {
                if self.points.len() >= capacity {
                    self.decimate();
                    // Tiny capacities can still be full after halving.
                    while self.points.len() >= capacity {
                        self.points.pop_front();
                    }
                }
                self.points.push_back(point);
            }
        }
    }

    /// Keep points at even indices, plus the newest one.
    fn decimate(&mut self) {
        let last = self.points.back().copied();
        let kept: VecDeque<Position2D> = self
            .points
            .iter()
            .step_by(2)
            .copied()
            .collect();
        self.points = kept;
        if let Some(last) = last {
            if self.points.back() != Some(&last) {
                self.points.push_back(last);
            }
        }
    }

    /// Number of retained points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if no point is retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of points ever appended, including dropped ones.
    #[must_use]
    pub const fn total_appended(&self) -> u64 {
        self.total_appended
    }

    /// Most recent point.
    #[must_use]
    pub fn last(&self) -> Option<Position2D> {
        self.points.back().copied()
    }

    /// Iterate retained points, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Position2D> {
        self.points.iter()
    }

    /// Copy retained points into a contiguous vector.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Position2D> {
        self.points.iter().copied().collect()
    }

    /// Retention policy in force.
    #[must_use]
    pub const fn retention(&self) -> HistoryRetention {
        self.retention
    }
}
