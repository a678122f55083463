//! Phase sequence invariants.

use chrono::{DateTime, Utc};

use super::PhaseInvariantError;
use crate::types::FlightPhase;

/// Check that a flight's phases are well formed:
/// every interval has `start <= end`, phase types strictly follow flight
/// order, and each phase starts exactly where the previous one ended.
///
/// An empty sequence passes.
pub fn check_sequence(phases: &[FlightPhase]) -> Result<(), PhaseInvariantError> {
    for phase in phases {
        if phase.start > phase.end {
            return Err(PhaseInvariantError::InvertedInterval {
                phase: phase.phase_type,
                start: phase.start,
                end: phase.end,
            });
        }
    }

    for pair in phases.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if prev.phase_type == next.phase_type {
            return Err(PhaseInvariantError::Repeated {
                phase: next.phase_type,
            });
        }
        if next.phase_type < prev.phase_type {
            return Err(PhaseInvariantError::OutOfOrder {
                previous: prev.phase_type,
                next: next.phase_type,
            });
        }
        if prev.end != next.start {
            return Err(PhaseInvariantError::Discontinuity {
                previous: prev.phase_type,
                next: next.phase_type,
                end: prev.end,
                start: next.start,
            });
        }
    }

    Ok(())
}

/// Check that `phases` span exactly `[first, last]`.
pub fn check_coverage(
    phases: &[FlightPhase],
    first: DateTime<Utc>,
    last: DateTime<Utc>,
) -> Result<(), PhaseInvariantError> {
    let (Some(head), Some(tail)) = (phases.first(), phases.last()) else {
        return Err(PhaseInvariantError::Empty);
    };

    if head.start != first || tail.end != last {
        return Err(PhaseInvariantError::Coverage {
            expected_start: first,
            expected_end: last,
            actual_start: head.start,
            actual_end: tail.end,
        });
    }
    Ok(())
}
