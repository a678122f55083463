//! Shared data structures for flight phase segmentation
//!
//! This module defines the types that flow through the pipeline:
//! - Stage 1: FlightRef / FlightSchedule (what a source says about a flight)
//! - Stage 2: RawPoint (per-sample telemetry as fetched)
//! - Stage 3: NormalizedTrajectory (sorted, clamped, tagged with provenance)
//! - Stage 4: FlightPhase / PhaseBatch (segmenter output)
//! - Stage 5: FlightIdentity (grouping / conflict key at the storage boundary)

mod identity;
mod phase;
mod schedule;
mod trajectory;

pub use identity::*;
pub use phase::*;
pub use schedule::*;
pub use trajectory::*;
