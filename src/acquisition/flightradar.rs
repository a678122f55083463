//! Flightradar24 adapters
//!
//! [`Flightradar24Source`] lists an aircraft's recent flights from the
//! `flight/list.json` endpoint (token in the query string, browser-like
//! User-Agent). Entries only carry schedule times, so by default each flight
//! goes through schedule synthesis.
//!
//! [`Flightradar24TrailSource`] optionally fetches the live trail of a flight
//! from the `clickhandler` endpoint with a bearer token.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{check_status, http_client, RequestPacer, ScheduleSource, SourceError, TrajectorySource};
use crate::config::defaults::FR24_USER_AGENT;
use crate::config::{Flightradar24Config, SourceConfig};
use crate::types::{FlightIdentity, FlightRef, FlightSchedule, RawPoint};

const PROVIDER: &str = "Flightradar24";

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
struct ListEnvelope {
    #[serde(default)]
    result: ListResult,
}

#[derive(Debug, Default, Deserialize)]
struct ListResult {
    #[serde(default)]
    response: ListResponse,
}

#[derive(Debug, Default, Deserialize)]
struct ListResponse {
    #[serde(default)]
    data: Option<Vec<ListEntry>>,
}

#[derive(Debug, Default, Deserialize)]
struct ListEntry {
    #[serde(default)]
    identification: Identification,
    #[serde(default)]
    aircraft: Aircraft,
    #[serde(default)]
    time: TimeBlock,
}

#[derive(Debug, Default, Deserialize)]
struct Identification {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    number: FlightNumber,
}

#[derive(Debug, Default, Deserialize)]
struct FlightNumber {
    #[serde(default)]
    default: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Aircraft {
    #[serde(default)]
    registration: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TimeBlock {
    #[serde(default)]
    scheduled: TimePair,
    #[serde(default)]
    real: TimePair,
    #[serde(default)]
    other: OtherTimes,
}

#[derive(Debug, Default, Deserialize)]
struct TimePair {
    #[serde(default)]
    departure: Option<i64>,
    #[serde(default)]
    arrival: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct OtherTimes {
    #[serde(default)]
    duration: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TrailEnvelope {
    #[serde(default)]
    trail: Option<Vec<RawPoint>>,
}

// ============================================================================
// Parsing
// ============================================================================

fn epoch(seconds: Option<i64>) -> Option<DateTime<Utc>> {
    seconds.and_then(|s| DateTime::<Utc>::from_timestamp(s, 0))
}

/// Parse a `list.json` body. Keeps the last `max_flights` entries; an entry
/// without a registration is attributed to `queried_id`.
pub fn parse_flight_list(
    body: &str,
    queried_id: &str,
    max_flights: usize,
) -> Result<Vec<FlightRef>, SourceError> {
    let envelope: ListEnvelope = serde_json::from_str(body).map_err(|e| SourceError::Malformed {
        provider: PROVIDER,
        message: e.to_string(),
    })?;

    let data = envelope.result.response.data.unwrap_or_default();
    let skip = data.len().saturating_sub(max_flights);

    Ok(data
        .into_iter()
        .skip(skip)
        .map(|entry| to_flight_ref(entry, queried_id))
        .collect())
}

fn to_flight_ref(entry: ListEntry, queried_id: &str) -> FlightRef {
    let schedule = FlightSchedule {
        scheduled_departure: epoch(entry.time.scheduled.departure),
        scheduled_arrival: epoch(entry.time.scheduled.arrival),
        actual_departure: epoch(entry.time.real.departure),
        actual_arrival: epoch(entry.time.real.arrival),
        duration_seconds: entry.time.other.duration,
    };

    let registration = entry
        .aircraft
        .registration
        .as_deref()
        .filter(|r| !r.trim().is_empty())
        .unwrap_or(queried_id);

    let identity = FlightIdentity::new(registration)
        .with_flight_number(entry.identification.number.default.as_deref())
        .with_departure_date(schedule.departure().map(|d| d.date_naive()));

    FlightRef::new(identity, Some(schedule)).with_source_ref(entry.identification.id)
}

/// Parse a clickhandler body into raw points. A body without a trail is
/// treated as no telemetry.
pub fn parse_trail(body: &str) -> Result<Vec<RawPoint>, SourceError> {
    let envelope: TrailEnvelope = serde_json::from_str(body).map_err(|e| SourceError::Malformed {
        provider: PROVIDER,
        message: e.to_string(),
    })?;
    Ok(envelope.trail.unwrap_or_default())
}

// ============================================================================
// Flight List Source
// ============================================================================

pub struct Flightradar24Source {
    http: reqwest::Client,
    list_url: String,
    api_key: String,
    max_flights: usize,
    pacer: Arc<RequestPacer>,
}

impl Flightradar24Source {
    pub fn new(
        config: &Flightradar24Config,
        source: &SourceConfig,
        api_key: String,
        pacer: Arc<RequestPacer>,
    ) -> Result<Self, SourceError> {
        Ok(Self {
            http: http_client(source.timeout_secs, Some(FR24_USER_AGENT))?,
            list_url: config.list_url.clone(),
            api_key,
            max_flights: source.max_flights,
            pacer,
        })
    }
}

#[async_trait]
impl ScheduleSource for Flightradar24Source {
    async fn fetch_schedule(&self, aircraft_id: &str) -> Result<Vec<FlightRef>, SourceError> {
        let registration = aircraft_id.trim();
        let limit = self.max_flights.to_string();
        self.pacer.wait().await;

        let resp = self
            .http
            .get(&self.list_url)
            .query(&[
                ("query", registration),
                ("fetchBy", "reg"),
                ("limit", limit.as_str()),
                ("token", self.api_key.as_str()),
            ])
            .send()
            .await?;
        check_status(PROVIDER, resp.status())?;

        let body = resp.text().await?;
        let flights = parse_flight_list(&body, registration, self.max_flights)?;
        debug!(registration, flights = flights.len(), "Fetched Flightradar24 flight list");
        Ok(flights)
    }

    fn source_name(&self) -> &str {
        PROVIDER
    }
}

// ============================================================================
// Live Trail Source
// ============================================================================

pub struct Flightradar24TrailSource {
    http: reqwest::Client,
    trail_url: String,
    api_key: String,
    pacer: Arc<RequestPacer>,
}

impl Flightradar24TrailSource {
    pub fn new(
        config: &Flightradar24Config,
        source: &SourceConfig,
        api_key: String,
        pacer: Arc<RequestPacer>,
    ) -> Result<Self, SourceError> {
        Ok(Self {
            http: http_client(source.timeout_secs, Some(FR24_USER_AGENT))?,
            trail_url: config.trail_url.clone(),
            api_key,
            pacer,
        })
    }
}

#[async_trait]
impl TrajectorySource for Flightradar24TrailSource {
    async fn fetch_track(&self, flight: &FlightRef) -> Result<Vec<RawPoint>, SourceError> {
        // Prefer the provider's flight id; the registration only finds the
        // aircraft's current flight
        let handle = flight
            .source_ref
            .as_deref()
            .unwrap_or(&flight.identity.aircraft_id);
        self.pacer.wait().await;

        let resp = self
            .http
            .get(&self.trail_url)
            .query(&[("flight", handle)])
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        check_status(PROVIDER, resp.status())?;

        let points = parse_trail(&resp.text().await?)?;
        if points.is_empty() {
            warn!(flight = handle, "Flightradar24 returned no trail");
        }
        Ok(points)
    }

    fn source_name(&self) -> &str {
        "Flightradar24-trail"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawTimestamp;

    fn entry(id: &str, number: &str, reg: Option<&str>, dep: i64) -> String {
        let reg = reg.map_or("null".to_string(), |r| format!("\"{r}\""));
        format!(
            r#"{{
                "identification": {{"id": "{id}", "number": {{"default": "{number}"}}}},
                "aircraft": {{"registration": {reg}}},
                "time": {{
                    "scheduled": {{"departure": {dep}, "arrival": {arr}}},
                    "real": {{"departure": null, "arrival": null}},
                    "other": {{"duration": 3600}}
                }}
            }}"#,
            arr = dep + 3600
        )
    }

    fn list(entries: &[String]) -> String {
        format!(
            r#"{{"result": {{"response": {{"data": [{}]}}}}}}"#,
            entries.join(",")
        )
    }

    #[test]
    fn keeps_the_last_entries() {
        let body = list(&[
            entry("a1", "AF1", Some("F-GSQA"), 1_700_000_000),
            entry("a2", "AF2", Some("F-GSQA"), 1_700_100_000),
            entry("a3", "AF3", Some("F-GSQA"), 1_700_200_000),
        ]);
        let refs = parse_flight_list(&body, "F-GSQA", 2).unwrap();
        let numbers: Vec<_> = refs
            .iter()
            .map(|r| r.identity.flight_number.clone().unwrap())
            .collect();
        assert_eq!(numbers, vec!["AF2", "AF3"]);
        assert_eq!(refs[1].source_ref.as_deref(), Some("a3"));
    }

    #[test]
    fn missing_registration_uses_the_queried_id() {
        let body = list(&[entry("x", "AF9", None, 1_700_000_000)]);
        let refs = parse_flight_list(&body, "F-HBXA", 10).unwrap();
        assert_eq!(refs[0].identity.aircraft_id, "F-HBXA");
    }

    #[test]
    fn scheduled_times_fill_in_for_missing_real_times() {
        let body = list(&[entry("x", "AF9", Some("F-GSQA"), 1_700_000_000)]);
        let refs = parse_flight_list(&body, "F-GSQA", 10).unwrap();
        let schedule = refs[0].schedule.as_ref().unwrap();
        assert_eq!(schedule.departure().unwrap().timestamp(), 1_700_000_000);
        assert_eq!(schedule.arrival().unwrap().timestamp(), 1_700_003_600);
        assert_eq!(schedule.duration_seconds, Some(3600));
    }

    #[test]
    fn null_data_is_an_empty_list() {
        let body = r#"{"result": {"response": {"data": null}}}"#;
        let refs = parse_flight_list(body, "X", 10).unwrap();
        assert!(refs.is_empty());
    }

    #[test]
    fn trail_points_use_short_field_names() {
        let body = r#"{"trail": [{"ts": 1700000000, "alt": 0}, {"ts": 1700000060, "alt": 1200}]}"#;
        let points = parse_trail(body).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].timestamp, Some(RawTimestamp::Integer(1_700_000_060)));
        assert_eq!(points[1].altitude, Some(1200.0));

        assert!(parse_trail(r#"{"aircraft": {}}"#).unwrap().is_empty());
    }
}
