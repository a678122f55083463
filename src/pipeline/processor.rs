//! Flight Processor
//!
//! The synchronous core of the pipeline for one flight:
//!
//! ```text
//! raw samples --normalize--> NormalizedTrajectory --segment--> phases --validate--> PhaseBatch
//! schedule   --synthesize-/
//! ```
//!
//! No I/O happens here; the runner fetches and persists around it.

use thiserror::Error;

use crate::acquisition::SourceError;
use crate::segmentation::{check_coverage, PhaseSegmenter};
use crate::storage::PersistenceError;
use crate::trajectory::{normalize, synthesize_from_schedule, DataError};
use crate::types::{FlightRef, FlightSchedule, NormalizedTrajectory, PhaseBatch, RawPoint};

// ============================================================================
// Error Types
// ============================================================================

/// Why one flight was skipped.
#[derive(Debug, Error)]
pub enum FlightError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Coarse skip category for batch statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
    Source,
    EmptyTrajectory,
    InsufficientSchedule,
    InvalidData,
    NoPhases,
    Persistence,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Source => "source",
            ErrorKind::EmptyTrajectory => "empty_trajectory",
            ErrorKind::InsufficientSchedule => "insufficient_schedule",
            ErrorKind::InvalidData => "invalid_data",
            ErrorKind::NoPhases => "no_phases",
            ErrorKind::Persistence => "persistence",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FlightError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FlightError::Source(_) => ErrorKind::Source,
            FlightError::Data(DataError::EmptyTrajectory) => ErrorKind::EmptyTrajectory,
            FlightError::Data(DataError::InsufficientScheduleData(_)) => {
                ErrorKind::InsufficientSchedule
            }
            FlightError::Data(DataError::NoPhases(_)) => ErrorKind::NoPhases,
            FlightError::Data(DataError::InvalidField { .. } | DataError::InvalidPhases(_)) => {
                ErrorKind::InvalidData
            }
            FlightError::Persistence(_) => ErrorKind::Persistence,
        }
    }
}

// ============================================================================
// Processor
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct FlightProcessor {
    segmenter: PhaseSegmenter,
    synthesis_enabled: bool,
}

impl Default for FlightProcessor {
    fn default() -> Self {
        Self::new(PhaseSegmenter::default(), true)
    }
}

impl FlightProcessor {
    pub fn new(segmenter: PhaseSegmenter, synthesis_enabled: bool) -> Self {
        Self {
            segmenter,
            synthesis_enabled,
        }
    }

    pub fn synthesis_enabled(&self) -> bool {
        self.synthesis_enabled
    }

    /// Phases from observed telemetry.
    pub fn process_observed(&self, raw: &[RawPoint]) -> Result<PhaseBatch, DataError> {
        let track = normalize(raw)?;
        self.process_trajectory(&track)
    }

    /// Phases from the 5-point schedule approximation.
    pub fn process_scheduled(&self, schedule: &FlightSchedule) -> Result<PhaseBatch, DataError> {
        let track = synthesize_from_schedule(schedule)?;
        self.process_trajectory(&track)
    }

    /// Segment and validate an already-normalized trajectory.
    pub fn process_trajectory(
        &self,
        track: &NormalizedTrajectory,
    ) -> Result<PhaseBatch, DataError> {
        let phases = self.segmenter.segment(track);
        if phases.is_empty() {
            return Err(DataError::NoPhases(track.len()));
        }
        check_coverage(&phases, track.first_timestamp(), track.last_timestamp())?;
        Ok(PhaseBatch::new(phases, track.provenance())?)
    }

    /// Observed telemetry when there is any, schedule synthesis otherwise.
    ///
    /// `raw` is `None` when no trajectory source is configured. Synthesis is
    /// only attempted when the telemetry is missing or entirely unusable, and
    /// only if enabled.
    pub fn process_flight(
        &self,
        flight: &FlightRef,
        raw: Option<&[RawPoint]>,
    ) -> Result<PhaseBatch, DataError> {
        let observed = match raw {
            Some(raw) => self.process_observed(raw),
            None => Err(DataError::EmptyTrajectory),
        };

        match observed {
            Err(DataError::EmptyTrajectory) if self.synthesis_enabled => {
                let schedule = flight.schedule.clone().unwrap_or_default();
                self.process_scheduled(&schedule)
            }
            other => other,
        }
    }
}
