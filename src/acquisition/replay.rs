//! Offline replay source
//!
//! Serves flights from a JSON file so the whole pipeline can run without
//! network access:
//!
//! ```json
//! {"flights": [
//!   {"identity": {"aircraft_id": "F-GSQA", "flight_number": "AF1234"},
//!    "schedule": {"actual_departure": "2024-03-01T10:00:00Z", ...},
//!    "track": [{"timestamp": 1709287200, "altitude": 0}, ...]}
//! ]}
//! ```

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use super::{ScheduleSource, SourceError, TrajectorySource};
use crate::types::{FlightIdentity, FlightRef, FlightSchedule, RawPoint};

const PROVIDER: &str = "replay";

#[derive(Debug, Deserialize)]
struct ReplayFile {
    #[serde(default)]
    flights: Vec<ReplayFlight>,
}

#[derive(Debug, Deserialize)]
struct ReplayFlight {
    #[serde(default)]
    identity: FlightIdentity,
    #[serde(default)]
    schedule: Option<FlightSchedule>,
    #[serde(default)]
    track: Vec<RawPoint>,
}

/// In-memory flights loaded from a replay file.
#[derive(Debug)]
pub struct ReplaySource {
    flights: Vec<(FlightRef, Vec<RawPoint>)>,
}

impl ReplaySource {
    pub fn load(path: &Path) -> Result<Self, SourceError> {
        let contents = std::fs::read_to_string(path).map_err(|e| SourceError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let source = Self::from_json(&contents)?;
        info!(path = %path.display(), flights = source.len(), "Loaded replay file");
        Ok(source)
    }

    pub fn from_json(contents: &str) -> Result<Self, SourceError> {
        let file: ReplayFile = serde_json::from_str(contents).map_err(|e| SourceError::Malformed {
            provider: PROVIDER,
            message: e.to_string(),
        })?;

        let flights = file
            .flights
            .into_iter()
            .enumerate()
            .map(|(i, f)| {
                let flight = FlightRef::new(f.identity, f.schedule)
                    .with_source_ref(Some(format!("replay-{i}")));
                (flight, f.track)
            })
            .collect();
        Ok(Self { flights })
    }

    pub fn len(&self) -> usize {
        self.flights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flights.is_empty()
    }
}

#[async_trait]
impl ScheduleSource for ReplaySource {
    async fn fetch_schedule(&self, aircraft_id: &str) -> Result<Vec<FlightRef>, SourceError> {
        let wanted = aircraft_id.trim();
        Ok(self
            .flights
            .iter()
            .filter(|(f, _)| f.identity.aircraft_id.eq_ignore_ascii_case(wanted))
            .map(|(f, _)| f.clone())
            .collect())
    }

    fn source_name(&self) -> &str {
        PROVIDER
    }
}

#[async_trait]
impl TrajectorySource for ReplaySource {
    async fn fetch_track(&self, flight: &FlightRef) -> Result<Vec<RawPoint>, SourceError> {
        Ok(self
            .flights
            .iter()
            .find(|(f, _)| f.source_ref.is_some() && f.source_ref == flight.source_ref)
            .map(|(_, track)| track.clone())
            .unwrap_or_default())
    }

    fn source_name(&self) -> &str {
        PROVIDER
    }
}
