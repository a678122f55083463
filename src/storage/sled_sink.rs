//! Durable phase storage on sled
//!
//! One tree, `flight_phases`. Keys come from [`phase_key`]; values are JSON
//! [`StoredPhase`] rows. Inserts use compare-and-swap against an absent
//! value, so an existing row is never overwritten.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use super::persistence::{
    aircraft_prefix, rows, KeyScope, PersistenceError, PersistenceSink, SaveReport, StoredPhase,
};
use crate::types::{FlightIdentity, PhaseBatch};

const TREE_NAME: &str = "flight_phases";

/// sled-backed [`PersistenceSink`].
#[derive(Clone)]
pub struct SledSink {
    db: Arc<sled::Db>,
    tree: sled::Tree,
    scope: KeyScope,
}

impl SledSink {
    /// Open or create the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P, scope: KeyScope) -> Result<Self, PersistenceError> {
        let path_ref = path.as_ref();
        let db = sled::open(path_ref).map_err(storage_error)?;
        let tree = db.open_tree(TREE_NAME).map_err(storage_error)?;

        info!(path = ?path_ref, rows = tree.len(), ?scope, "Phase storage opened");

        Ok(Self {
            db: Arc::new(db),
            tree,
            scope,
        })
    }

    /// Flush pending writes to disk.
    pub fn flush(&self) -> Result<(), PersistenceError> {
        self.db.flush().map_err(storage_error)?;
        Ok(())
    }
}

fn storage_error(err: sled::Error) -> PersistenceError {
    PersistenceError::Storage(err.to_string())
}

impl PersistenceSink for SledSink {
    fn save(
        &self,
        identity: &FlightIdentity,
        batch: &PhaseBatch,
    ) -> Result<SaveReport, PersistenceError> {
        let mut report = SaveReport::default();

        for (key, row) in rows(self.scope, identity, batch, Utc::now()) {
            let value = serde_json::to_vec(&row)?;
            let swapped = self
                .tree
                .compare_and_swap(key, None::<&[u8]>, Some(value))
                .map_err(storage_error)?;

            match swapped {
                Ok(()) => report.inserted += 1,
                Err(_) => {
                    debug!(
                        aircraft = %identity.aircraft_id,
                        phase = %row.phase.phase_type,
                        "Phase already stored, skipping"
                    );
                    report.duplicates += 1;
                }
            }
        }

        self.flush()?;
        Ok(report)
    }

    fn phases_for(&self, aircraft_id: &str) -> Result<Vec<StoredPhase>, PersistenceError> {
        self.tree
            .scan_prefix(aircraft_prefix(aircraft_id))
            .map(|entry| {
                let (_, value) = entry.map_err(storage_error)?;
                Ok(serde_json::from_slice(&value)?)
            })
            .collect()
    }

    fn count(&self) -> Result<usize, PersistenceError> {
        Ok(self.tree.len())
    }

    fn backend_name(&self) -> &'static str {
        "sled"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FlightPhase, PhaseType, Provenance};
    use chrono::{DateTime, TimeZone};

    fn t(minutes: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + minutes * 60, 0).unwrap()
    }

    fn batch() -> PhaseBatch {
        PhaseBatch::new(
            vec![
                FlightPhase::new(PhaseType::TaxiOut, t(0), t(16)).unwrap(),
                FlightPhase::new(PhaseType::Takeoff, t(16), t(60)).unwrap(),
                FlightPhase::new(PhaseType::Cruise, t(60), t(118)).unwrap(),
            ],
            Provenance::Synthetic,
        )
        .unwrap()
    }

    #[test]
    fn insert_if_absent() {
        let dir = tempfile::tempdir().unwrap();
        let sink = SledSink::open(dir.path().join("phases.db"), KeyScope::AircraftPhase).unwrap();
        let identity = FlightIdentity::new("F-GSQA").with_flight_number(Some("AF1234"));

        let first = sink.save(&identity, &batch()).unwrap();
        let second = sink.save(&identity, &batch()).unwrap();

        assert_eq!(first.inserted, 3);
        assert_eq!(second, SaveReport { inserted: 0, duplicates: 3 });
        assert_eq!(sink.count().unwrap(), 3);
    }

    #[test]
    fn rows_round_trip_with_provenance() {
        let dir = tempfile::tempdir().unwrap();
        let sink = SledSink::open(dir.path(), KeyScope::AircraftPhaseRange).unwrap();
        let identity = FlightIdentity::new("39856a");
        sink.save(&identity, &batch()).unwrap();

        let stored = sink.phases_for("39856a").unwrap();
        assert_eq!(stored.len(), 3);
        assert!(stored.iter().all(|s| s.provenance == Provenance::Synthetic));
        assert!(stored.iter().all(|s| s.identity == identity));
        assert!(sink.phases_for("39856").unwrap().is_empty());
    }

    #[test]
    fn rows_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("phases.db");
        {
            let sink = SledSink::open(&path, KeyScope::AircraftPhase).unwrap();
            sink.save(&FlightIdentity::new("F-GSQA"), &batch()).unwrap();
        }
        let reopened = SledSink::open(&path, KeyScope::AircraftPhase).unwrap();
        assert_eq!(reopened.count().unwrap(), 3);
    }
}
