//! phasetrack: flight phase segmentation
//!
//! Turns an aircraft's altitude track into the five ground/air phases of a
//! flight and stores them.
//!
//! ## Architecture
//!
//! - **Acquisition**: schedule and trajectory sources (OpenSky, Flightradar24, replay files)
//! - **Trajectory**: normalization of raw samples and schedule-based synthesis
//! - **Segmentation**: table-driven phase state machine plus sequence checks
//! - **Storage**: idempotent phase persistence (sled or in-memory)
//! - **Pipeline**: per-flight processing and the batch runner

pub mod acquisition;
pub mod config;
pub mod pipeline;
pub mod segmentation;
pub mod storage;
pub mod trajectory;
pub mod types;

// Re-export configuration
pub use config::{AppConfig, ConfigError, Credentials, SourceKind};

// Re-export commonly used types
pub use types::{
    FlightIdentity, FlightPhase, FlightRef, FlightSchedule, NormalizedTrajectory, PhaseBatch,
    PhaseType, Provenance, RawPoint, TrajectoryPoint,
};

// Re-export the processing entry points
pub use pipeline::{BatchRunner, BatchStats, FlightProcessor};
pub use segmentation::PhaseSegmenter;
pub use trajectory::{normalize, synthesize, DataError};
