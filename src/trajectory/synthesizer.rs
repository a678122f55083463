//! Trajectory Synthesizer (schedule fallback)
//!
//! When a flight has no usable telemetry but departure, arrival and duration
//! are known, build the canonical 5-point profile:
//!
//! ```text
//!  altitude
//!   35000 |             *
//!         |
//!    1000 |                          *
//!     500 |      *
//!       0 | *                              *
//!         +--+----+------+-----------+-----+---- time
//!          dep-15 dep  dep+dur/2  arr-15  arr
//! ```
//!
//! The result is tagged [`Provenance::Synthetic`]; it is an approximation of
//! phase boundaries, not a measurement.

use chrono::{DateTime, Duration, Utc};

use super::normalizer::normalize_points;
use super::DataError;
use crate::config::defaults::{
    SYNTHETIC_APPROACH_ALTITUDE_FT, SYNTHETIC_CRUISE_ALTITUDE_FT, SYNTHETIC_GROUND_MINUTES,
    SYNTHETIC_TAKEOFF_ALTITUDE_FT,
};
use crate::types::{FlightSchedule, NormalizedTrajectory, Provenance, TrajectoryPoint};

/// Build the 5-point synthetic trajectory.
///
/// Every argument is required; a negative duration, or one that pushes an
/// instant outside the representable calendar, is rejected. Points are
/// run through the same stable sort as observed data, which only reorders
/// anything for flights shorter than the taxi allowance.
pub fn synthesize(
    depart: Option<DateTime<Utc>>,
    arrive: Option<DateTime<Utc>>,
    duration_seconds: Option<i64>,
) -> Result<NormalizedTrajectory, DataError> {
    let depart = depart.ok_or(DataError::InsufficientScheduleData("departure time"))?;
    let arrive = arrive.ok_or(DataError::InsufficientScheduleData("arrival time"))?;
    let duration_seconds =
        duration_seconds.ok_or(DataError::InsufficientScheduleData("flight duration"))?;

    if duration_seconds < 0 {
        return Err(DataError::InvalidField {
            field: "duration_seconds",
            reason: format!("must be >= 0, got {duration_seconds}"),
        });
    }

    let ground = Duration::minutes(SYNTHETIC_GROUND_MINUTES);
    let half_duration = Duration::try_seconds(duration_seconds / 2).ok_or_else(|| {
        DataError::InvalidField {
            field: "duration_seconds",
            reason: format!("{duration_seconds} s is out of range"),
        }
    })?;

    let points = vec![
        TrajectoryPoint::new(shift(depart, -ground, "departure time")?, 0.0),
        TrajectoryPoint::new(depart, SYNTHETIC_TAKEOFF_ALTITUDE_FT),
        TrajectoryPoint::new(
            shift(depart, half_duration, "duration_seconds")?,
            SYNTHETIC_CRUISE_ALTITUDE_FT,
        ),
        TrajectoryPoint::new(
            shift(arrive, -ground, "arrival time")?,
            SYNTHETIC_APPROACH_ALTITUDE_FT,
        ),
        TrajectoryPoint::new(arrive, 0.0),
    ];

    normalize_points(points, Provenance::Synthetic)
}

// Instant arithmetic that reports overflow instead of panicking
fn shift(
    instant: DateTime<Utc>,
    delta: Duration,
    field: &'static str,
) -> Result<DateTime<Utc>, DataError> {
    instant.checked_add_signed(delta).ok_or_else(|| DataError::InvalidField {
        field,
        reason: format!("{instant} shifted by {delta} is out of range"),
    })
}

/// [`synthesize`] using a schedule's actual-else-scheduled times.
pub fn synthesize_from_schedule(
    schedule: &FlightSchedule,
) -> Result<NormalizedTrajectory, DataError> {
    synthesize(
        schedule.departure(),
        schedule.arrival(),
        schedule.duration_seconds,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn builds_the_canonical_five_points() {
        let track = synthesize(
            Some(at(1_700_000_000)),
            Some(at(1_700_003_600)),
            Some(3600),
        )
        .unwrap();

        let got: Vec<(i64, f64)> = track
            .points()
            .iter()
            .map(|p| (p.timestamp.timestamp(), p.altitude))
            .collect();
        assert_eq!(
            got,
            vec![
                (1_700_000_000 - 900, 0.0),
                (1_700_000_000, 500.0),
                (1_700_000_000 + 1800, 35_000.0),
                (1_700_003_600 - 900, 1000.0),
                (1_700_003_600, 0.0),
            ]
        );
        assert_eq!(track.provenance(), Provenance::Synthetic);
    }

    #[test]
    fn odd_duration_halves_with_integer_division() {
        let track = synthesize(Some(at(0)), Some(at(7201)), Some(7201)).unwrap();
        assert_eq!(track.points()[2].timestamp.timestamp(), 3600);
    }

    #[test]
    fn each_missing_input_is_reported() {
        assert_eq!(
            synthesize(None, Some(at(10)), Some(10)),
            Err(DataError::InsufficientScheduleData("departure time"))
        );
        assert_eq!(
            synthesize(Some(at(0)), None, Some(10)),
            Err(DataError::InsufficientScheduleData("arrival time"))
        );
        assert_eq!(
            synthesize(Some(at(0)), Some(at(10)), None),
            Err(DataError::InsufficientScheduleData("flight duration"))
        );
    }

    #[test]
    fn oversized_duration_is_an_error_not_a_panic() {
        for duration in [20_000_000_000_000_000, 1_000_000_000_000_000, i64::MAX] {
            assert!(matches!(
                synthesize(Some(at(1_700_000_000)), Some(at(1_700_003_600)), Some(duration)),
                Err(DataError::InvalidField { field: "duration_seconds", .. })
            ));
        }
    }

    #[test]
    fn instants_at_the_calendar_edge_are_rejected() {
        let edge = DateTime::<Utc>::MIN_UTC;
        assert!(matches!(
            synthesize(Some(edge), Some(at(0)), Some(60)),
            Err(DataError::InvalidField { field: "departure time", .. })
        ));
    }

    #[test]
    fn negative_duration_is_rejected() {
        assert!(matches!(
            synthesize(Some(at(0)), Some(at(10)), Some(-5)),
            Err(DataError::InvalidField { field: "duration_seconds", .. })
        ));
    }

    #[test]
    fn schedule_falls_back_to_scheduled_times() {
        let schedule = FlightSchedule {
            scheduled_departure: Some(at(1_700_000_000)),
            scheduled_arrival: Some(at(1_700_003_600)),
            actual_departure: None,
            actual_arrival: None,
            duration_seconds: Some(3600),
        };
        let track = synthesize_from_schedule(&schedule).unwrap();
        assert_eq!(track.points()[1].timestamp, at(1_700_000_000));
        assert_eq!(track.last_timestamp(), at(1_700_003_600));
    }

    #[test]
    fn short_flight_is_still_time_ordered() {
        let track = synthesize(Some(at(1000)), Some(at(1600)), Some(600)).unwrap();
        assert!(track
            .points()
            .windows(2)
            .all(|w| w[0].timestamp <= w[1].timestamp));
        assert_eq!(track.len(), 5);
    }
}
