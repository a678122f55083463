//! Schedule data and flight references handed out by schedule sources

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::FlightIdentity;

/// Departure / arrival instants known for a flight without telemetry.
///
/// Actual times win over scheduled ones when both exist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightSchedule {
    #[serde(default)]
    pub scheduled_departure: Option<DateTime<Utc>>,

    #[serde(default)]
    pub scheduled_arrival: Option<DateTime<Utc>>,

    #[serde(default)]
    pub actual_departure: Option<DateTime<Utc>>,

    #[serde(default)]
    pub actual_arrival: Option<DateTime<Utc>>,

    /// Block-to-block duration as reported by the source (seconds).
    #[serde(default)]
    pub duration_seconds: Option<i64>,
}

impl FlightSchedule {
    /// Actual departure, falling back to scheduled.
    pub fn departure(&self) -> Option<DateTime<Utc>> {
        self.actual_departure.or(self.scheduled_departure)
    }

    /// Actual arrival, falling back to scheduled.
    pub fn arrival(&self) -> Option<DateTime<Utc>> {
        self.actual_arrival.or(self.scheduled_arrival)
    }
}

/// One flight as listed by a [`ScheduleSource`](crate::acquisition::ScheduleSource).
///
/// Carries enough to fetch its track and, failing that, to synthesize one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightRef {
    pub identity: FlightIdentity,

    #[serde(default)]
    pub schedule: Option<FlightSchedule>,

    /// Provider-specific flight handle (e.g. a Flightradar24 flight id)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ref: Option<String>,
}

impl FlightRef {
    pub fn new(identity: FlightIdentity, schedule: Option<FlightSchedule>) -> Self {
        Self {
            identity,
            schedule,
            source_ref: None,
        }
    }

    #[must_use]
    pub fn with_source_ref(mut self, source_ref: Option<String>) -> Self {
        self.source_ref = source_ref.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn departure(&self) -> Option<DateTime<Utc>> {
        self.schedule.as_ref().and_then(FlightSchedule::departure)
    }
}
