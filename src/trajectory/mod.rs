//! Trajectory preparation
//!
//! Everything between "a source handed us some samples" and "the segmenter
//! gets a clean, ordered track":
//!
//! - [`timestamp`]: the single place raw timestamp forms are interpreted
//! - [`normalizer`]: repair + stable sort of observed samples
//! - [`synthesizer`]: 5-point fallback profile built from schedule times

pub mod normalizer;
pub mod synthesizer;
pub mod timestamp;

pub use normalizer::{clamp_altitude, normalize};
pub use synthesizer::{synthesize, synthesize_from_schedule};
pub use timestamp::to_instant;

use thiserror::Error;

/// Per-flight data problems. Never fatal to a batch: the flight is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    #[error("trajectory is empty after normalization")]
    EmptyTrajectory,

    #[error("insufficient schedule data: missing {0}")]
    InsufficientScheduleData(&'static str),

    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("trajectory too short to segment ({0} point(s))")]
    NoPhases(usize),

    #[error("phase sequence rejected: {0}")]
    InvalidPhases(#[from] crate::segmentation::PhaseInvariantError),
}
