//! Flight Phase Pipeline
//!
//! ```text
//! ScheduleSource ──► FlightRef ──► TrajectorySource ──► RawPoint[]
//!                                                          │
//!                      normalize (or synthesize) ◄─────────┘
//!                                │
//!                      PhaseSegmenter ──► PhaseBatch ──► PersistenceSink
//! ```
//!
//! [`FlightProcessor`] is the pure per-flight core; [`BatchRunner`] adds the
//! fetching, persisting and bookkeeping around it.

mod processor;
mod runner;

pub use processor::{ErrorKind, FlightError, FlightProcessor};
pub use runner::{BatchRunner, BatchStats};
