//! Batch Runner
//!
//! Drives one run for one aircraft: list its flights, then for each flight
//! fetch the track, segment it (or its schedule), and persist the phases.
//! Flights are handled strictly one after another; a failing flight is
//! logged, counted, and skipped.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{error, info, warn};

use super::processor::{ErrorKind, FlightError, FlightProcessor};
use crate::acquisition::SourceSet;
use crate::storage::{PersistenceSink, SaveReport};
use crate::types::{FlightRef, PhaseBatch};

// ============================================================================
// Statistics
// ============================================================================

/// Counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub flights_seen: usize,
    pub flights_persisted: usize,
    pub phases_written: usize,
    pub duplicate_phases: usize,
    pub synthetic_batches: usize,
    /// The schedule itself could not be fetched
    pub schedule_failed: bool,
    pub skipped: BTreeMap<ErrorKind, usize>,
}

impl BatchStats {
    pub fn flights_skipped(&self) -> usize {
        self.skipped.values().sum()
    }

    fn record_persisted(&mut self, batch: &PhaseBatch, report: SaveReport) {
        self.flights_persisted += 1;
        self.phases_written += report.inserted;
        self.duplicate_phases += report.duplicates;
        if batch.is_synthetic() {
            self.synthetic_batches += 1;
        }
    }

    fn record_skip(&mut self, kind: ErrorKind) {
        *self.skipped.entry(kind).or_insert(0) += 1;
    }

    /// Multi-line summary in the log, one line per skip reason.
    pub fn log_summary(&self, aircraft_id: &str) {
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        info!("  Run complete for {}", aircraft_id);
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        if self.schedule_failed {
            warn!("  Schedule could not be fetched; nothing was processed");
        }
        info!(
            "  Flights:    {} seen, {} persisted, {} skipped",
            self.flights_seen,
            self.flights_persisted,
            self.flights_skipped()
        );
        info!(
            "  Phases:     {} written, {} already stored",
            self.phases_written, self.duplicate_phases
        );
        info!(
            "  Synthetic:  {} flight(s) from schedule data",
            self.synthetic_batches
        );
        for (kind, count) in &self.skipped {
            info!("  Skipped ({}): {}", kind, count);
        }
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }
}

impl std::fmt::Display for BatchStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Batch: {} flights ({} persisted, {} skipped), {} phases written, {} duplicates, {} synthetic",
            self.flights_seen,
            self.flights_persisted,
            self.flights_skipped(),
            self.phases_written,
            self.duplicate_phases,
            self.synthetic_batches
        )
    }
}

// ============================================================================
// Runner
// ============================================================================

pub struct BatchRunner {
    sources: SourceSet,
    sink: Arc<dyn PersistenceSink>,
    processor: FlightProcessor,
}

impl BatchRunner {
    pub fn new(
        sources: SourceSet,
        sink: Arc<dyn PersistenceSink>,
        processor: FlightProcessor,
    ) -> Self {
        Self {
            sources,
            sink,
            processor,
        }
    }

    /// Process every listed flight of `aircraft_id`.
    ///
    /// Never fails: per-flight problems end up in [`BatchStats::skipped`], a
    /// schedule failure in [`BatchStats::schedule_failed`].
    pub async fn run(&self, aircraft_id: &str) -> BatchStats {
        let mut stats = BatchStats::default();

        let flights = match self.sources.schedule.fetch_schedule(aircraft_id).await {
            Ok(flights) => flights,
            Err(e) => {
                error!(
                    aircraft = aircraft_id,
                    source = self.sources.schedule.source_name(),
                    error = %e,
                    "Failed to fetch flight schedule"
                );
                stats.schedule_failed = true;
                return stats;
            }
        };

        info!(aircraft = aircraft_id, flights = flights.len(), "Flights listed");

        for flight in &flights {
            stats.flights_seen += 1;
            match self.run_flight(flight).await {
                Ok((batch, report)) => {
                    info!(
                        flight = %flight.identity,
                        provenance = %batch.provenance(),
                        phases = %batch.summary(),
                        inserted = report.inserted,
                        duplicates = report.duplicates,
                        "Flight phases stored"
                    );
                    stats.record_persisted(&batch, report);
                }
                Err(e) => {
                    let kind = e.kind();
                    if kind == ErrorKind::Persistence {
                        error!(
                            flight = %flight.identity,
                            error = %e,
                            "Failed to store flight phases"
                        );
                    } else {
                        warn!(
                            flight = %flight.identity,
                            reason = %kind,
                            error = %e,
                            "Skipping flight"
                        );
                    }
                    stats.record_skip(kind);
                }
            }
        }

        stats
    }

    async fn run_flight(
        &self,
        flight: &FlightRef,
    ) -> Result<(PhaseBatch, SaveReport), FlightError> {
        let raw = match &self.sources.trajectory {
            Some(source) => Some(source.fetch_track(flight).await?),
            None => None,
        };

        let batch = self.processor.process_flight(flight, raw.as_deref())?;
        let report = self.sink.save(&flight.identity, &batch)?;
        Ok((batch, report))
    }
}
