//! Flight identity: the grouping / conflict key at the storage boundary

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Placeholder used when a source omits an identifier.
pub const UNKNOWN: &str = "UNKNOWN";

/// Who flew, which flight, which day.
///
/// `aircraft_id` is a tail number (e.g. `F-GSQA`) or an ICAO24 hex address
/// (e.g. `39856a`). Plays no part in segmentation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlightIdentity {
    #[serde(default = "unknown")]
    pub aircraft_id: String,

    #[serde(default)]
    pub flight_number: Option<String>,

    #[serde(default)]
    pub departure_date: Option<NaiveDate>,
}

fn unknown() -> String {
    UNKNOWN.to_string()
}

impl Default for FlightIdentity {
    fn default() -> Self {
        Self {
            aircraft_id: unknown(),
            flight_number: None,
            departure_date: None,
        }
    }
}

impl FlightIdentity {
    /// Blank or whitespace-only ids fall back to [`UNKNOWN`].
    pub fn new(aircraft_id: &str) -> Self {
        let trimmed = aircraft_id.trim();
        Self {
            aircraft_id: if trimmed.is_empty() {
                unknown()
            } else {
                trimmed.to_string()
            },
            flight_number: None,
            departure_date: None,
        }
    }

    /// Blank flight numbers are treated as absent.
    #[must_use]
    pub fn with_flight_number(mut self, flight_number: Option<&str>) -> Self {
        self.flight_number = flight_number
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        self
    }

    #[must_use]
    pub fn with_departure_date(mut self, date: Option<NaiveDate>) -> Self {
        self.departure_date = date;
        self
    }

    pub fn flight_number_or_unknown(&self) -> &str {
        self.flight_number.as_deref().unwrap_or(UNKNOWN)
    }

    /// Human-readable flight key: `<aircraft>_<flight>_<YYYY-MM-DD>`.
    pub fn flight_key(&self) -> String {
        let date = self
            .departure_date
            .map_or_else(unknown, |d| d.format("%Y-%m-%d").to_string());
        format!(
            "{}_{}_{}",
            self.aircraft_id,
            self.flight_number_or_unknown(),
            date
        )
    }
}

impl std::fmt::Display for FlightIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.flight_key())
    }
}
