//! Phase Segmenter
//!
//! Single forward pass over a [`NormalizedTrajectory`] driven by the
//! [`TRANSITIONS`] table:
//!
//! ```text
//!   TAXI-OUT --alt > 0--> TAKEOFF --climb topped out--> CRUISE
//!   CRUISE --alt < previous--> LANDING --alt <= 0--> TAXI-IN
//! ```
//!
//! The first point opens TAXI-OUT. A firing transition closes the current
//! phase at the triggering point's timestamp and opens the next phase at the
//! same instant. At most one transition fires per point. Whatever phase is
//! open when the points run out is closed at the last timestamp; phases that
//! were never reached are not emitted.
//!
//! TAKEOFF -> CRUISE looks ahead a bounded number of points: the climb has
//! topped out when the current point and the next `confirmation_window`
//! points all stay at or below the highest altitude seen since TAKEOFF
//! opened. A brief level-off or dip during the climb therefore does not end
//! TAKEOFF early.

use tracing::{debug, trace};

use crate::config::defaults::CONFIRMATION_WINDOW;
use crate::types::{FlightPhase, NormalizedTrajectory, PhaseType, TrajectoryPoint};

// ============================================================================
// Transition Table
// ============================================================================

/// What a guard can see when deciding whether to leave the current phase.
#[derive(Debug, Clone, Copy)]
pub struct GuardContext<'a> {
    /// Altitude of the point being examined
    pub altitude: f64,
    /// Altitude of the point before it
    pub previous_altitude: f64,
    /// Highest altitude since TAKEOFF opened, this point included
    pub climb_peak: f64,
    /// Up to `confirmation_window` points following this one
    pub lookahead: &'a [TrajectoryPoint],
}

/// One row of the state machine.
#[derive(Debug, Clone, Copy)]
pub struct Transition {
    pub from: PhaseType,
    pub to: PhaseType,
    pub guard: fn(&GuardContext<'_>) -> bool,
}

/// Every legal phase change. TAXI-IN is terminal and has no row.
pub const TRANSITIONS: [Transition; 4] = [
    Transition {
        from: PhaseType::TaxiOut,
        to: PhaseType::Takeoff,
        guard: left_the_ground,
    },
    Transition {
        from: PhaseType::Takeoff,
        to: PhaseType::Cruise,
        guard: climb_topped_out,
    },
    Transition {
        from: PhaseType::Cruise,
        to: PhaseType::Landing,
        guard: started_descent,
    },
    Transition {
        from: PhaseType::Landing,
        to: PhaseType::TaxiIn,
        guard: touched_down,
    },
];

fn left_the_ground(ctx: &GuardContext<'_>) -> bool {
    ctx.altitude > 0.0
}

fn climb_topped_out(ctx: &GuardContext<'_>) -> bool {
    !ctx.lookahead.is_empty()
        && ctx.altitude <= ctx.climb_peak
        && ctx.lookahead.iter().all(|p| p.altitude <= ctx.climb_peak)
}

fn started_descent(ctx: &GuardContext<'_>) -> bool {
    ctx.altitude < ctx.previous_altitude
}

fn touched_down(ctx: &GuardContext<'_>) -> bool {
    ctx.altitude <= 0.0
}

fn transition_from(phase: PhaseType) -> Option<&'static Transition> {
    TRANSITIONS.iter().find(|t| t.from == phase)
}

// ============================================================================
// Segmenter
// ============================================================================

/// Deterministic flight phase state machine. Never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseSegmenter {
    confirmation_window: usize,
}

impl Default for PhaseSegmenter {
    fn default() -> Self {
        Self::new(CONFIRMATION_WINDOW)
    }
}

impl PhaseSegmenter {
    /// `confirmation_window` below 1 is raised to 1.
    pub fn new(confirmation_window: usize) -> Self {
        Self {
            confirmation_window: confirmation_window.max(1),
        }
    }

    pub fn confirmation_window(&self) -> usize {
        self.confirmation_window
    }

    /// Segment a normalized trajectory.
    pub fn segment(&self, track: &NormalizedTrajectory) -> Vec<FlightPhase> {
        let phases = self.segment_points(track.points());
        debug!(
            points = track.len(),
            phases = phases.len(),
            provenance = %track.provenance(),
            "Segmented trajectory"
        );
        phases
    }

    /// Segment points that are already sorted by timestamp with clamped
    /// altitudes. Fewer than two points yield no phases.
    pub fn segment_points(&self, points: &[TrajectoryPoint]) -> Vec<FlightPhase> {
        let (Some(first), Some(last)) = (points.first(), points.last()) else {
            return Vec::new();
        };
        if points.len() < 2 {
            return Vec::new();
        }

        let mut phases = Vec::with_capacity(PhaseType::ALL.len());
        let mut current = PhaseType::TaxiOut;
        let mut opened_at = first.timestamp;
        let mut previous_altitude = first.altitude;
        let mut climb_peak = 0.0_f64;

        for (i, point) in points.iter().enumerate().skip(1) {
            if current == PhaseType::Takeoff {
                climb_peak = climb_peak.max(point.altitude);
            }

            let lookahead_end = (i + 1 + self.confirmation_window).min(points.len());
            let ctx = GuardContext {
                altitude: point.altitude,
                previous_altitude,
                climb_peak,
                lookahead: &points[i + 1..lookahead_end],
            };

            if let Some(transition) = transition_from(current).filter(|t| (t.guard)(&ctx)) {
                trace!(
                    from = %transition.from,
                    to = %transition.to,
                    at = %point.timestamp,
                    altitude = point.altitude,
                    "Phase transition"
                );
                phases.push(FlightPhase {
                    phase_type: current,
                    start: opened_at,
                    end: point.timestamp,
                });
                current = transition.to;
                opened_at = point.timestamp;
                if current == PhaseType::Takeoff {
                    climb_peak = point.altitude;
                }
            }

            previous_altitude = point.altitude;
        }

        phases.push(FlightPhase {
            phase_type: current,
            start: opened_at,
            end: last.timestamp,
        });
        phases
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn t(minutes: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + minutes * 60, 0).unwrap()
    }

    fn track(samples: &[(i64, f64)]) -> Vec<TrajectoryPoint> {
        samples
            .iter()
            .map(|&(m, alt)| TrajectoryPoint::new(t(m), alt))
            .collect()
    }

    fn summary(phases: &[FlightPhase]) -> Vec<(PhaseType, i64, i64)> {
        phases
            .iter()
            .map(|p| {
                (
                    p.phase_type,
                    (p.start - t(0)).num_minutes(),
                    (p.end - t(0)).num_minutes(),
                )
            })
            .collect()
    }

    fn ctx(
        altitude: f64,
        previous_altitude: f64,
        climb_peak: f64,
        lookahead: &[TrajectoryPoint],
    ) -> GuardContext<'_> {
        GuardContext {
            altitude,
            previous_altitude,
            climb_peak,
            lookahead,
        }
    }

    // --- one test per table row ---------------------------------------------

    #[test]
    fn taxi_out_row_fires_on_positive_altitude() {
        let row = transition_from(PhaseType::TaxiOut).unwrap();
        assert_eq!(row.to, PhaseType::Takeoff);
        assert!((row.guard)(&ctx(0.5, 0.0, 0.0, &[])));
        assert!(!(row.guard)(&ctx(0.0, 0.0, 0.0, &[])));
    }

    #[test]
    fn takeoff_row_needs_peak_held_across_lookahead() {
        let row = transition_from(PhaseType::Takeoff).unwrap();
        assert_eq!(row.to, PhaseType::Cruise);

        let held = track(&[(1, 35_000.0), (2, 34_900.0), (3, 35_000.0)]);
        assert!((row.guard)(&ctx(35_000.0, 30_000.0, 35_000.0, &held)));

        let still_climbing = track(&[(1, 34_000.0), (2, 36_000.0)]);
        assert!(!(row.guard)(&ctx(35_000.0, 30_000.0, 35_000.0, &still_climbing)));

        // Peak already passed and nothing after it goes higher
        let settled = track(&[(1, 24_000.0)]);
        assert!((row.guard)(&ctx(20_000.0, 25_000.0, 25_000.0, &settled)));

        // Nothing to confirm against
        assert!(!(row.guard)(&ctx(35_000.0, 30_000.0, 35_000.0, &[])));
    }

    #[test]
    fn cruise_row_fires_on_any_descent() {
        let row = transition_from(PhaseType::Cruise).unwrap();
        assert_eq!(row.to, PhaseType::Landing);
        assert!((row.guard)(&ctx(34_999.0, 35_000.0, 0.0, &[])));
        assert!(!(row.guard)(&ctx(35_000.0, 35_000.0, 0.0, &[])));
    }

    #[test]
    fn landing_row_fires_on_ground_contact() {
        let row = transition_from(PhaseType::Landing).unwrap();
        assert_eq!(row.to, PhaseType::TaxiIn);
        assert!((row.guard)(&ctx(0.0, 200.0, 0.0, &[])));
        assert!(!(row.guard)(&ctx(10.0, 200.0, 0.0, &[])));
    }

    #[test]
    fn taxi_in_is_terminal() {
        assert!(transition_from(PhaseType::TaxiIn).is_none());
    }

    // --- whole-track behaviour ----------------------------------------------

    #[test]
    fn canonical_flight() {
        let points = track(&[
            (0, 0.0),
            (15, 0.0),
            (16, 500.0),
            (60, 35_000.0),
            (118, 1000.0),
            (120, 0.0),
        ]);
        let phases = PhaseSegmenter::default().segment_points(&points);
        assert_eq!(
            summary(&phases),
            vec![
                (PhaseType::TaxiOut, 0, 16),
                (PhaseType::Takeoff, 16, 60),
                (PhaseType::Cruise, 60, 118),
                (PhaseType::Landing, 118, 120),
                (PhaseType::TaxiIn, 120, 120),
            ]
        );
    }

    #[test]
    fn empty_and_single_point_yield_nothing() {
        let segmenter = PhaseSegmenter::default();
        assert!(segmenter.segment_points(&[]).is_empty());
        assert!(segmenter.segment_points(&track(&[(0, 100.0)])).is_empty());
    }

    #[test]
    fn step_climb_does_not_end_takeoff_early() {
        let points = track(&[
            (0, 0.0),
            (1, 1000.0),
            (2, 10_000.0),
            (3, 10_000.0),
            (4, 9_900.0),
            (5, 20_000.0),
            (6, 35_000.0),
            (7, 35_000.0),
            (8, 35_000.0),
            (9, 35_000.0),
            (10, 0.0),
        ]);
        let phases = PhaseSegmenter::default().segment_points(&points);
        let takeoff = phases
            .iter()
            .find(|p| p.phase_type == PhaseType::Takeoff)
            .unwrap();
        assert_eq!((takeoff.end - t(0)).num_minutes(), 6);
    }

    #[test]
    fn wider_window_sees_a_later_climb() {
        let points = track(&[
            (0, 0.0),
            (1, 5000.0),
            (2, 5000.0),
            (3, 5000.0),
            (4, 8000.0),
            (5, 8000.0),
            (6, 0.0),
        ]);
        let narrow = PhaseSegmenter::new(1).segment_points(&points);
        let wide = PhaseSegmenter::new(3).segment_points(&points);
        assert_eq!(summary(&narrow)[1], (PhaseType::Takeoff, 1, 2));
        assert_eq!(summary(&wide)[1], (PhaseType::Takeoff, 1, 4));
    }

    #[test]
    fn ground_only_track_stays_in_taxi_out() {
        let points = track(&[(0, 0.0), (5, 0.0), (10, 0.0)]);
        assert_eq!(
            summary(&PhaseSegmenter::default().segment_points(&points)),
            vec![(PhaseType::TaxiOut, 0, 10)]
        );
    }

    #[test]
    fn track_ending_mid_climb_closes_takeoff_at_last_point() {
        let points = track(&[(0, 0.0), (2, 500.0), (4, 3000.0), (6, 9000.0)]);
        assert_eq!(
            summary(&PhaseSegmenter::default().segment_points(&points)),
            vec![(PhaseType::TaxiOut, 0, 2), (PhaseType::Takeoff, 2, 6)]
        );
    }

    #[test]
    fn airborne_first_point_does_not_skip_taxi_out() {
        let points = track(&[(0, 3000.0), (1, 4000.0), (2, 3000.0), (3, 0.0)]);
        let phases = PhaseSegmenter::default().segment_points(&points);
        assert_eq!(phases[0].phase_type, PhaseType::TaxiOut);
        assert_eq!(summary(&phases)[0], (PhaseType::TaxiOut, 0, 1));
    }

    #[test]
    fn one_transition_per_point() {
        // The lift-off point is also the peak, but it only opens TAKEOFF
        let points = track(&[(0, 0.0), (1, 35_000.0), (2, 35_000.0), (3, 0.0)]);
        assert_eq!(
            summary(&PhaseSegmenter::default().segment_points(&points)),
            vec![
                (PhaseType::TaxiOut, 0, 1),
                (PhaseType::Takeoff, 1, 2),
                (PhaseType::Cruise, 2, 3),
                (PhaseType::Landing, 3, 3),
            ]
        );
    }

    #[test]
    fn zero_window_is_raised_to_one() {
        assert_eq!(PhaseSegmenter::new(0).confirmation_window(), 1);
    }

    #[test]
    fn output_is_valid_and_covers_the_track() {
        let points = track(&[
            (0, 0.0),
            (3, 0.0),
            (4, 800.0),
            (9, 12_000.0),
            (20, 31_000.0),
            (25, 31_000.0),
            (70, 31_000.0),
            (80, 15_000.0),
            (95, 0.0),
            (99, 0.0),
        ]);
        let phases = PhaseSegmenter::default().segment_points(&points);
        assert_eq!(super::super::check_sequence(&phases), Ok(()));
        assert_eq!(super::super::check_coverage(&phases, t(0), t(99)), Ok(()));
        assert_eq!(phases.len(), 5);
    }
}
