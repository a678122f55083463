//! Trajectory types: raw source samples, normalized points, provenance

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Raw Source Samples
// ============================================================================

/// Timestamp exactly as a data source delivered it.
///
/// Sources mix epoch seconds, epoch milliseconds, fractional seconds and
/// ISO-8601 text. Conversion to an instant happens once, in
/// [`crate::trajectory::normalize`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl From<i64> for RawTimestamp {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<&str> for RawTimestamp {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// One altitude observation as fetched, before any repair.
///
/// Accepts both `{timestamp, altitude}` and the short `{ts, alt}` form used
/// by Flightradar24 trails.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawPoint {
    #[serde(default, alias = "ts")]
    pub timestamp: Option<RawTimestamp>,

    #[serde(default, alias = "alt")]
    pub altitude: Option<f64>,
}

impl RawPoint {
    pub fn new(timestamp: impl Into<RawTimestamp>, altitude: Option<f64>) -> Self {
        Self {
            timestamp: Some(timestamp.into()),
            altitude,
        }
    }
}

// ============================================================================
// Normalized Trajectory
// ============================================================================

/// A cleaned altitude sample: UTC instant, altitude in feet, never negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub timestamp: DateTime<Utc>,
    pub altitude: f64,
}

impl TrajectoryPoint {
    pub fn new(timestamp: DateTime<Utc>, altitude: f64) -> Self {
        Self {
            timestamp,
            altitude,
        }
    }
}

/// Where a trajectory came from.
///
/// Synthetic trajectories are the 5-point schedule approximation and are
/// much coarser than observed telemetry; the tag travels with the phases
/// all the way to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    #[default]
    Observed,
    Synthetic,
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provenance::Observed => write!(f, "observed"),
            Provenance::Synthetic => write!(f, "synthetic"),
        }
    }
}

/// Time-ordered, non-empty sequence of [`TrajectoryPoint`]s.
///
/// Only the normalizer and synthesizer construct this type, so every value
/// in circulation is sorted (stable on ties) with altitudes clamped to >= 0.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTrajectory {
    points: Vec<TrajectoryPoint>,
    provenance: Provenance,
}

impl NormalizedTrajectory {
    /// Caller guarantees `points` is non-empty, sorted and clamped.
    pub(crate) fn from_sorted(points: Vec<TrajectoryPoint>, provenance: Provenance) -> Self {
        debug_assert!(!points.is_empty());
        debug_assert!(points.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        Self { points, provenance }
    }

    pub fn points(&self) -> &[TrajectoryPoint] {
        &self.points
    }

    pub fn provenance(&self) -> Provenance {
        self.provenance
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_timestamp(&self) -> DateTime<Utc> {
        self.points[0].timestamp
    }

    pub fn last_timestamp(&self) -> DateTime<Utc> {
        self.points[self.points.len() - 1].timestamp
    }

    pub fn into_points(self) -> Vec<TrajectoryPoint> {
        self.points
    }
}
