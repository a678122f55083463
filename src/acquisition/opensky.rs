//! OpenSky Network adapter
//!
//! - `GET {api}/flights/aircraft?icao24&begin&end`: flights in the lookback
//!   window; `firstSeen` / `lastSeen` are the actual departure and arrival
//! - `GET {api}/tracks/all?icao24&time=<firstSeen>`: waypoints of one flight,
//!   `path` rows are `[time, lat, lon, baro_altitude_m, true_track, on_ground]`
//!
//! OpenSky answers 404 when it has nothing for the query; that is an empty
//! result, not a failure. Altitudes arrive in metres and leave in feet.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::{
    check_status, http_client, RequestPacer, ScheduleSource, SourceError, TrajectorySource,
};
use crate::config::defaults::{FEET_PER_METRE, MAX_LOOKBACK_DAYS};
use crate::config::{OpenSkyConfig, OpenSkyLogin, SourceConfig};
use crate::types::{FlightIdentity, FlightRef, FlightSchedule, RawPoint, RawTimestamp};

const PROVIDER: &str = "OpenSky";

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpenSkyFlight {
    icao24: String,
    #[serde(default)]
    first_seen: Option<i64>,
    #[serde(default)]
    last_seen: Option<i64>,
    #[serde(default)]
    callsign: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenSkyTrack {
    #[serde(default)]
    path: Vec<Vec<Value>>,
}

// ============================================================================
// Parsing
// ============================================================================

/// Parse a `/flights/aircraft` body into flight references, newest first,
/// capped at `max_flights`. Flights without a callsign are skipped.
pub fn parse_flights(body: &str, max_flights: usize) -> Result<Vec<FlightRef>, SourceError> {
    let mut flights: Vec<OpenSkyFlight> =
        serde_json::from_str(body).map_err(|e| SourceError::Malformed {
            provider: PROVIDER,
            message: e.to_string(),
        })?;

    flights.sort_by_key(|f| std::cmp::Reverse(f.first_seen.unwrap_or(0)));

    let refs = flights
        .into_iter()
        .filter(|f| {
            let has_callsign = f.callsign.as_deref().is_some_and(|c| !c.trim().is_empty());
            if !has_callsign {
                warn!(
                    icao24 = %f.icao24,
                    first_seen = ?f.first_seen,
                    "Flight has no callsign, skipping"
                );
            }
            has_callsign
        })
        .take(max_flights)
        .map(to_flight_ref)
        .collect();

    Ok(refs)
}

fn to_flight_ref(flight: OpenSkyFlight) -> FlightRef {
    let departure = flight.first_seen.and_then(|s| DateTime::<Utc>::from_timestamp(s, 0));
    let arrival = flight.last_seen.and_then(|s| DateTime::<Utc>::from_timestamp(s, 0));
    let duration_seconds = match (flight.first_seen, flight.last_seen) {
        (Some(first), Some(last)) if last >= first => Some(last - first),
        _ => None,
    };

    let identity = FlightIdentity::new(&flight.icao24.to_lowercase())
        .with_flight_number(flight.callsign.as_deref())
        .with_departure_date(departure.map(|d| d.date_naive()));

    let schedule = FlightSchedule {
        actual_departure: departure,
        actual_arrival: arrival,
        duration_seconds,
        ..Default::default()
    };

    FlightRef::new(identity, Some(schedule))
}

/// Parse a `/tracks/all` body into raw points (altitude in feet).
///
/// Rows flagged on-ground report 0 ft whatever the barometric reading, so
/// airport elevation is not mistaken for a climb.
pub fn parse_track(body: &str) -> Result<Vec<RawPoint>, SourceError> {
    let track: OpenSkyTrack = serde_json::from_str(body).map_err(|e| SourceError::Malformed {
        provider: PROVIDER,
        message: e.to_string(),
    })?;

    Ok(track.path.iter().map(|row| path_row_to_point(row)).collect())
}

fn path_row_to_point(row: &[Value]) -> RawPoint {
    let timestamp = row.first().and_then(|v| {
        v.as_i64()
            .map(RawTimestamp::Integer)
            .or_else(|| v.as_f64().map(RawTimestamp::Float))
    });
    let on_ground = row.get(5).and_then(Value::as_bool).unwrap_or(false);
    let altitude = if on_ground {
        Some(0.0)
    } else {
        row.get(3).and_then(Value::as_f64).map(|m| m * FEET_PER_METRE)
    };
    RawPoint { timestamp, altitude }
}

// ============================================================================
// Source
// ============================================================================

/// OpenSky schedule + trajectory source.
pub struct OpenSkySource {
    http: reqwest::Client,
    api_url: String,
    lookback: Duration,
    max_flights: usize,
    login: Option<OpenSkyLogin>,
    pacer: Arc<RequestPacer>,
}

impl OpenSkySource {
    pub fn new(
        config: &OpenSkyConfig,
        source: &SourceConfig,
        login: Option<OpenSkyLogin>,
        pacer: Arc<RequestPacer>,
    ) -> Result<Self, SourceError> {
        let lookback = Some(config.lookback_days)
            .filter(|days| (1..=MAX_LOOKBACK_DAYS).contains(days))
            .and_then(Duration::try_days)
            .ok_or_else(|| {
                SourceError::Setup(format!(
                    "opensky.lookback_days = {} must be between 1 and {MAX_LOOKBACK_DAYS}",
                    config.lookback_days
                ))
            })?;

        Ok(Self {
            http: http_client(source.timeout_secs, None)?,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            lookback,
            max_flights: source.max_flights,
            login,
            pacer,
        })
    }

    /// GET with pacing and optional basic auth. `Ok(None)` on 404.
    async fn get(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Option<String>, SourceError> {
        self.pacer.wait().await;

        let mut request = self.http.get(url).query(query);
        if let Some(ref login) = self.login {
            request = request.basic_auth(&login.username, Some(&login.password));
        }
        let resp = request.send().await?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            debug!(url, "OpenSky has no data for query");
            return Ok(None);
        }
        check_status(PROVIDER, resp.status())?;
        Ok(Some(resp.text().await?))
    }
}

#[async_trait]
impl ScheduleSource for OpenSkySource {
    async fn fetch_schedule(&self, aircraft_id: &str) -> Result<Vec<FlightRef>, SourceError> {
        let icao24 = aircraft_id.trim().to_lowercase();
        let end = Utc::now();
        let begin = end - self.lookback;

        let url = format!("{}/flights/aircraft", self.api_url);
        let body = self
            .get(
                &url,
                &[
                    ("icao24", icao24.clone()),
                    ("begin", begin.timestamp().to_string()),
                    ("end", end.timestamp().to_string()),
                ],
            )
            .await?;

        let flights = match body {
            Some(body) => parse_flights(&body, self.max_flights)?,
            None => Vec::new(),
        };
        debug!(icao24 = %icao24, flights = flights.len(), "Fetched OpenSky flights");
        Ok(flights)
    }

    fn source_name(&self) -> &str {
        PROVIDER
    }
}

#[async_trait]
impl TrajectorySource for OpenSkySource {
    async fn fetch_track(&self, flight: &FlightRef) -> Result<Vec<RawPoint>, SourceError> {
        let Some(departure) = flight.departure() else {
            return Ok(Vec::new());
        };

        let url = format!("{}/tracks/all", self.api_url);
        let body = self
            .get(
                &url,
                &[
                    ("icao24", flight.identity.aircraft_id.to_lowercase()),
                    ("time", departure.timestamp().to_string()),
                ],
            )
            .await?;

        match body {
            Some(body) => parse_track(&body),
            None => Ok(Vec::new()),
        }
    }

    fn source_name(&self) -> &str {
        PROVIDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FLIGHTS: &str = r#"[
        {"icao24": "39856A", "firstSeen": 1700000000, "lastSeen": 1700007200,
         "callsign": "AFR1234 ", "estDepartureAirport": "LFPG"},
        {"icao24": "39856a", "firstSeen": 1700100000, "lastSeen": 1700103600,
         "callsign": null},
        {"icao24": "39856a", "firstSeen": 1700200000, "lastSeen": 1700209000,
         "callsign": "AFR88"}
    ]"#;

    #[test]
    fn flights_are_newest_first_and_callsign_filtered() {
        let refs = parse_flights(FLIGHTS, 10).unwrap();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].identity.flight_number.as_deref(), Some("AFR88"));
        assert_eq!(refs[1].identity.flight_number.as_deref(), Some("AFR1234"));
        assert_eq!(refs[1].identity.aircraft_id, "39856a");
    }

    #[test]
    fn seen_times_become_actual_schedule() {
        let refs = parse_flights(FLIGHTS, 1).unwrap();
        assert_eq!(refs.len(), 1);
        let schedule = refs[0].schedule.as_ref().unwrap();
        assert_eq!(schedule.actual_departure.unwrap().timestamp(), 1_700_200_000);
        assert_eq!(schedule.actual_arrival.unwrap().timestamp(), 1_700_209_000);
        assert_eq!(schedule.duration_seconds, Some(9000));
        assert!(refs[0].identity.departure_date.is_some());
    }

    #[test]
    fn track_rows_convert_to_feet() {
        let body = r#"{
            "icao24": "39856a", "callsign": "AFR88",
            "path": [
                [1700200000, 49.0, 2.5, 120.0, 90.0, true],
                [1700200060, 49.1, 2.6, 1000.0, 90.0, false],
                [1700200120, 49.2, 2.7, null, 90.0, false]
            ]
        }"#;
        let points = parse_track(body).unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].altitude, Some(0.0));
        assert!((points[1].altitude.unwrap() - 3280.84).abs() < 1e-6);
        assert_eq!(points[2].altitude, None);
        assert_eq!(points[1].timestamp, Some(RawTimestamp::Integer(1_700_200_060)));
    }

    #[test]
    fn malformed_body_is_a_source_error() {
        assert!(matches!(
            parse_flights("{\"oops\": 1}", 10),
            Err(SourceError::Malformed { provider: "OpenSky", .. })
        ));
    }
}
