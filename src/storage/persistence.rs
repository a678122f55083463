//! PersistenceSink trait: pluggable phase storage
//!
//! The write contract the pipeline depends on:
//! - `SledSink`: durable embedded store (default)
//! - `InMemorySink`: for tests and dry runs
//!
//! Both are idempotent on the same key. A repeated key is counted as a
//! duplicate and never overwrites the stored row.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::config::defaults::KEY_SEPARATOR;
use crate::types::{FlightIdentity, FlightPhase, PhaseBatch, Provenance};

// ============================================================================
// Keys and Rows
// ============================================================================

/// What makes two phase rows "the same row".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyScope {
    /// One row per (aircraft, phase type): the first flight stored wins
    #[default]
    AircraftPhase,
    /// One row per (aircraft, phase type, time range): every flight is kept
    AircraftPhaseRange,
}

/// Storage key for one phase row.
///
/// Components are joined with the unit separator so an aircraft id can never
/// run into the phase name.
pub fn phase_key(scope: KeyScope, identity: &FlightIdentity, phase: &FlightPhase) -> Vec<u8> {
    let mut key = aircraft_prefix(&identity.aircraft_id);
    key.extend_from_slice(phase.phase_type.as_str().as_bytes());
    if scope == KeyScope::AircraftPhaseRange {
        for instant in [phase.start, phase.end] {
            key.push(KEY_SEPARATOR);
            key.extend_from_slice(key_instant(instant).as_bytes());
        }
    }
    key
}

/// Key prefix shared by every row of one aircraft.
pub fn aircraft_prefix(aircraft_id: &str) -> Vec<u8> {
    let mut prefix = aircraft_id.as_bytes().to_vec();
    prefix.push(KEY_SEPARATOR);
    prefix
}

// Fixed width, so lexical order is chronological
fn key_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// One persisted phase row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPhase {
    pub identity: FlightIdentity,
    pub phase: FlightPhase,
    pub provenance: Provenance,
    pub stored_at: DateTime<Utc>,
}

/// Outcome of saving one flight's phases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveReport {
    pub inserted: usize,
    pub duplicates: usize,
}

impl SaveReport {
    pub fn total(&self) -> usize {
        self.inserted + self.duplicates
    }
}

pub(crate) fn rows<'a>(
    scope: KeyScope,
    identity: &'a FlightIdentity,
    batch: &'a PhaseBatch,
    stored_at: DateTime<Utc>,
) -> impl Iterator<Item = (Vec<u8>, StoredPhase)> + 'a {
    batch.phases().iter().map(move |phase| {
        (
            phase_key(scope, identity, phase),
            StoredPhase {
                identity: identity.clone(),
                phase: *phase,
                provenance: batch.provenance(),
                stored_at,
            },
        )
    })
}

// ============================================================================
// Trait
// ============================================================================

/// Write contract for phase storage.
///
/// Implementations must be thread-safe (Send + Sync) for shared access
/// across async tasks.
pub trait PersistenceSink: Send + Sync {
    /// Store every phase of one flight, row by row. A failing row aborts the
    /// call but leaves earlier rows in place.
    fn save(
        &self,
        identity: &FlightIdentity,
        batch: &PhaseBatch,
    ) -> Result<SaveReport, PersistenceError>;

    /// Stored rows of one aircraft, in key order.
    fn phases_for(&self, aircraft_id: &str) -> Result<Vec<StoredPhase>, PersistenceError>;

    /// Total stored rows.
    fn count(&self) -> Result<usize, PersistenceError>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

/// Persistence errors
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        PersistenceError::Serialization(err.to_string())
    }
}

// ============================================================================
// In-Memory Sink
// ============================================================================

/// In-memory phase store for tests and dry runs.
///
/// Thread-safe via `RwLock`. Not durable; data is lost on exit.
pub struct InMemorySink {
    rows: std::sync::RwLock<BTreeMap<Vec<u8>, StoredPhase>>,
    scope: KeyScope,
}

impl InMemorySink {
    pub fn new(scope: KeyScope) -> Self {
        Self {
            rows: std::sync::RwLock::new(BTreeMap::new()),
            scope,
        }
    }
}

impl Default for InMemorySink {
    fn default() -> Self {
        Self::new(KeyScope::default())
    }
}

impl PersistenceSink for InMemorySink {
    fn save(
        &self,
        identity: &FlightIdentity,
        batch: &PhaseBatch,
    ) -> Result<SaveReport, PersistenceError> {
        let mut store = self
            .rows
            .write()
            .map_err(|e| PersistenceError::Storage(e.to_string()))?;

        let mut report = SaveReport::default();
        for (key, row) in rows(self.scope, identity, batch, Utc::now()) {
            if store.contains_key(&key) {
                report.duplicates += 1;
            } else {
                store.insert(key, row);
                report.inserted += 1;
            }
        }
        Ok(report)
    }

    fn phases_for(&self, aircraft_id: &str) -> Result<Vec<StoredPhase>, PersistenceError> {
        let store = self
            .rows
            .read()
            .map_err(|e| PersistenceError::Storage(e.to_string()))?;

        let prefix = aircraft_prefix(aircraft_id);
        Ok(store
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .map(|(_, v)| v.clone())
            .collect())
    }

    fn count(&self) -> Result<usize, PersistenceError> {
        let store = self
            .rows
            .read()
            .map_err(|e| PersistenceError::Storage(e.to_string()))?;
        Ok(store.len())
    }

    fn backend_name(&self) -> &'static str {
        "InMemory"
    }
}
