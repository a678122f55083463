//! Trajectory Normalizer
//!
//! Repairs raw samples into a [`NormalizedTrajectory`]:
//! 1. Timestamp converted once to `DateTime<Utc>` (unreadable ones dropped)
//! 2. Missing / NaN altitude becomes 0, negative altitude clamps to 0
//! 3. Stable sort by timestamp, so duplicate instants keep source order

use tracing::{debug, warn};

use super::{timestamp, DataError};
use crate::types::{NormalizedTrajectory, Provenance, RawPoint, TrajectoryPoint};

/// Normalize observed samples. Fails only when nothing usable is left.
pub fn normalize(raw: &[RawPoint]) -> Result<NormalizedTrajectory, DataError> {
    let mut dropped = 0usize;
    let points: Vec<TrajectoryPoint> = raw
        .iter()
        .filter_map(|p| {
            let instant = p.timestamp.as_ref().and_then(timestamp::to_instant);
            if instant.is_none() {
                dropped += 1;
            }
            instant.map(|ts| TrajectoryPoint::new(ts, clamp_altitude(p.altitude)))
        })
        .collect();

    if dropped > 0 {
        warn!(
            dropped,
            kept = points.len(),
            "Dropped samples with missing or unreadable timestamps"
        );
    }

    normalize_points(points, Provenance::Observed)
}

/// Sort and clamp already-typed points. Shared with the synthesizer.
pub(crate) fn normalize_points(
    mut points: Vec<TrajectoryPoint>,
    provenance: Provenance,
) -> Result<NormalizedTrajectory, DataError> {
    if points.is_empty() {
        return Err(DataError::EmptyTrajectory);
    }

    for point in &mut points {
        point.altitude = clamp_altitude(Some(point.altitude));
    }

    // sort_by_key is stable: equal timestamps keep their original order
    points.sort_by_key(|p| p.timestamp);

    debug!(
        points = points.len(),
        %provenance,
        "Normalized trajectory"
    );

    Ok(NormalizedTrajectory::from_sorted(points, provenance))
}

/// Altitude repair rule: absent, non-finite or negative → 0.
pub fn clamp_altitude(altitude: Option<f64>) -> f64 {
    match altitude {
        Some(a) if a.is_finite() && a > 0.0 => a,
        _ => 0.0,
    }
}
