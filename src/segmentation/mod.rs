//! Phase segmentation
//!
//! - [`segmenter`]: the table-driven state machine that cuts a normalized
//!   trajectory into [`FlightPhase`](crate::types::FlightPhase) intervals
//! - [`validation`]: the ordering / contiguity / coverage checks every phase
//!   sequence must pass before it is persisted

pub mod segmenter;
pub mod validation;

pub use segmenter::{GuardContext, PhaseSegmenter, Transition, TRANSITIONS};
pub use validation::{check_coverage, check_sequence};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::types::PhaseType;

/// A phase sequence that breaks the flight-phase invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhaseInvariantError {
    #[error("{phase} ends before it starts ({start} > {end})")]
    InvertedInterval {
        phase: PhaseType,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("{next} follows {previous}, breaking flight order")]
    OutOfOrder { previous: PhaseType, next: PhaseType },

    #[error("{phase} appears more than once")]
    Repeated { phase: PhaseType },

    #[error("{previous} ends at {end} but {next} starts at {start}")]
    Discontinuity {
        previous: PhaseType,
        next: PhaseType,
        end: DateTime<Utc>,
        start: DateTime<Utc>,
    },

    #[error("phases span [{actual_start}, {actual_end}] but the track spans [{expected_start}, {expected_end}]")]
    Coverage {
        expected_start: DateTime<Utc>,
        expected_end: DateTime<Utc>,
        actual_start: DateTime<Utc>,
        actual_end: DateTime<Utc>,
    },

    #[error("no phases to cover the track")]
    Empty,
}
