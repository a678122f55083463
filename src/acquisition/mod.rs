//! Flight data acquisition
//!
//! Two narrow read contracts sit between the pipeline and the outside world:
//! [`ScheduleSource`] lists an aircraft's recent flights, [`TrajectorySource`]
//! fetches the raw altitude samples of one of them. Adapters:
//!
//! - [`opensky`]: OpenSky Network REST API (schedule + tracks)
//! - [`flightradar`]: Flightradar24 flight list and optional live trail
//! - [`replay`]: offline JSON file, used for dry runs and tests
//!
//! HTTP adapters share a [`RequestPacer`] so successive calls to the same
//! provider are spaced by the configured delay.

pub mod flightradar;
pub mod opensky;
pub mod pacer;
pub mod replay;

pub use flightradar::{Flightradar24Source, Flightradar24TrailSource};
pub use opensky::OpenSkySource;
pub use pacer::RequestPacer;
pub use replay::ReplaySource;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::config::{AppConfig, Credentials, SourceKind};
use crate::types::{FlightRef, RawPoint};

// ============================================================================
// Error Types
// ============================================================================

/// A fetch that failed. Always per-flight or per-batch, never fatal.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} returned status {status}")]
    Status {
        provider: &'static str,
        status: reqwest::StatusCode,
    },

    #[error("{provider} blocked the request (HTTP 451); try another network route")]
    Blocked { provider: &'static str },

    #[error("{provider} rate limit reached (HTTP 429)")]
    RateLimited { provider: &'static str },

    #[error("malformed {provider} payload: {message}")]
    Malformed {
        provider: &'static str,
        message: String,
    },

    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("source setup failed: {0}")]
    Setup(String),
}

/// Map a non-success HTTP status to the matching error.
pub fn check_status(
    provider: &'static str,
    status: reqwest::StatusCode,
) -> Result<(), SourceError> {
    match status.as_u16() {
        _ if status.is_success() => Ok(()),
        451 => Err(SourceError::Blocked { provider }),
        429 => Err(SourceError::RateLimited { provider }),
        _ => Err(SourceError::Status { provider, status }),
    }
}

// ============================================================================
// Source Traits
// ============================================================================

/// Lists the recent flights of one aircraft.
#[async_trait]
pub trait ScheduleSource: Send + Sync {
    /// Flights for `aircraft_id` (tail number or ICAO24 hex), most relevant
    /// first. An aircraft with no flights is `Ok(vec![])`, not an error.
    async fn fetch_schedule(&self, aircraft_id: &str) -> Result<Vec<FlightRef>, SourceError>;

    /// Human-readable name for logging.
    fn source_name(&self) -> &str;
}

/// Fetches the raw telemetry of one flight.
#[async_trait]
pub trait TrajectorySource: Send + Sync {
    /// Raw samples as delivered; ordering and repair are left to the
    /// normalizer. No telemetry is `Ok(vec![])`.
    async fn fetch_track(&self, flight: &FlightRef) -> Result<Vec<RawPoint>, SourceError>;

    fn source_name(&self) -> &str;
}

/// The sources one run reads from.
#[derive(Clone)]
pub struct SourceSet {
    pub schedule: Arc<dyn ScheduleSource>,
    /// `None` when only schedule data is available (synthesis only)
    pub trajectory: Option<Arc<dyn TrajectorySource>>,
}

impl std::fmt::Debug for SourceSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceSet")
            .field("schedule", &self.schedule.source_name())
            .field(
                "trajectory",
                &self.trajectory.as_ref().map(|t| t.source_name()),
            )
            .finish()
    }
}

/// Build the configured sources.
///
/// Credentials must already have been checked with
/// [`Credentials::require_for`].
pub fn build_sources(
    config: &AppConfig,
    credentials: &Credentials,
) -> Result<SourceSet, SourceError> {
    let pacer = Arc::new(RequestPacer::new(Duration::from_millis(
        config.source.request_delay_ms,
    )));

    let set = match config.source.kind {
        SourceKind::OpenSky => {
            let source = Arc::new(OpenSkySource::new(
                &config.opensky,
                &config.source,
                credentials.opensky.clone(),
                pacer,
            )?);
            SourceSet {
                schedule: source.clone(),
                trajectory: Some(source),
            }
        }
        SourceKind::Flightradar24 => {
            let api_key = credentials
                .fr24_api_key
                .clone()
                .ok_or_else(|| SourceError::Setup("FR24_API_KEY is not set".to_string()))?;
            let list = Arc::new(Flightradar24Source::new(
                &config.flightradar24,
                &config.source,
                api_key.clone(),
                pacer.clone(),
            )?);
            let trail: Option<Arc<dyn TrajectorySource>> = if config.flightradar24.use_trail {
                Some(Arc::new(Flightradar24TrailSource::new(
                    &config.flightradar24,
                    &config.source,
                    api_key,
                    pacer,
                )?))
            } else {
                None
            };
            SourceSet {
                schedule: list,
                trajectory: trail,
            }
        }
        SourceKind::Replay => {
            let path = config
                .replay
                .path
                .as_deref()
                .ok_or_else(|| SourceError::Setup("replay.path is not set".to_string()))?;
            let source = Arc::new(ReplaySource::load(path)?);
            SourceSet {
                schedule: source.clone(),
                trajectory: Some(source),
            }
        }
    };

    info!(
        schedule = set.schedule.source_name(),
        trajectory = set.trajectory.as_ref().map_or("none", |t| t.source_name()),
        delay_ms = config.source.request_delay_ms,
        "Data sources ready"
    );
    Ok(set)
}

/// Shared reqwest client construction.
pub(crate) fn http_client(
    timeout_secs: u64,
    user_agent: Option<&str>,
) -> Result<reqwest::Client, SourceError> {
    let mut builder = reqwest::Client::builder().timeout(Duration::from_secs(timeout_secs));
    if let Some(agent) = user_agent {
        builder = builder.user_agent(agent);
    }
    Ok(builder.build()?)
}
