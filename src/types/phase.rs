//! Flight phase types: PhaseType, FlightPhase, PhaseBatch

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::Provenance;

// ============================================================================
// Phase Type
// ============================================================================

/// The five canonical phases of a flight, in the only order they may occur.
///
/// `Ord` follows flight order, so `TaxiOut < Takeoff < ... < TaxiIn`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum PhaseType {
    TaxiOut,
    Takeoff,
    Cruise,
    Landing,
    TaxiIn,
}

impl PhaseType {
    /// All phases in flight order.
    pub const ALL: [PhaseType; 5] = [
        PhaseType::TaxiOut,
        PhaseType::Takeoff,
        PhaseType::Cruise,
        PhaseType::Landing,
        PhaseType::TaxiIn,
    ];

    /// Stable wire / storage name.
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseType::TaxiOut => "taxi-out",
            PhaseType::Takeoff => "takeoff",
            PhaseType::Cruise => "cruise",
            PhaseType::Landing => "landing",
            PhaseType::TaxiIn => "taxi-in",
        }
    }

    /// The phase that follows this one, `None` for taxi-in.
    pub fn next(&self) -> Option<PhaseType> {
        match self {
            PhaseType::TaxiOut => Some(PhaseType::Takeoff),
            PhaseType::Takeoff => Some(PhaseType::Cruise),
            PhaseType::Cruise => Some(PhaseType::Landing),
            PhaseType::Landing => Some(PhaseType::TaxiIn),
            PhaseType::TaxiIn => None,
        }
    }

    /// Parse the storage name (also accepts `taxi_out` / `taxiout` spellings).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace(['_', ' '], "-").as_str() {
            "taxi-out" | "taxiout" => Some(PhaseType::TaxiOut),
            "takeoff" | "take-off" => Some(PhaseType::Takeoff),
            "cruise" => Some(PhaseType::Cruise),
            "landing" => Some(PhaseType::Landing),
            "taxi-in" | "taxiin" => Some(PhaseType::TaxiIn),
            _ => None,
        }
    }
}

impl std::fmt::Display for PhaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Flight Phase
// ============================================================================

/// One closed phase interval. `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "UncheckedPhase")]
pub struct FlightPhase {
    #[serde(rename = "type")]
    pub phase_type: PhaseType,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl FlightPhase {
    /// Build a phase, rejecting inverted intervals.
    pub fn new(
        phase_type: PhaseType,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Self, crate::segmentation::PhaseInvariantError> {
        if start > end {
            return Err(crate::segmentation::PhaseInvariantError::InvertedInterval {
                phase: phase_type,
                start,
                end,
            });
        }
        Ok(Self {
            phase_type,
            start,
            end,
        })
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }
}

// Deserialized form, checked by `FlightPhase::new`
#[derive(Deserialize)]
struct UncheckedPhase {
    #[serde(rename = "type")]
    phase_type: PhaseType,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TryFrom<UncheckedPhase> for FlightPhase {
    type Error = crate::segmentation::PhaseInvariantError;

    fn try_from(raw: UncheckedPhase) -> Result<Self, Self::Error> {
        Self::new(raw.phase_type, raw.start, raw.end)
    }
}

impl std::fmt::Display for FlightPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}, {}]",
            self.phase_type,
            self.start.to_rfc3339(),
            self.end.to_rfc3339()
        )
    }
}

// ============================================================================
// Phase Batch
// ============================================================================

/// All phases of one flight plus the provenance of the trajectory they came from.
///
/// Construction validates the sequence: ordered by phase type, no repeats,
/// consecutive phases share their boundary instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "UncheckedBatch")]
pub struct PhaseBatch {
    phases: Vec<FlightPhase>,
    provenance: Provenance,
}

#[derive(Deserialize)]
struct UncheckedBatch {
    phases: Vec<FlightPhase>,
    provenance: Provenance,
}

impl TryFrom<UncheckedBatch> for PhaseBatch {
    type Error = crate::segmentation::PhaseInvariantError;

    fn try_from(raw: UncheckedBatch) -> Result<Self, Self::Error> {
        Self::new(raw.phases, raw.provenance)
    }
}

impl PhaseBatch {
    pub fn new(
        phases: Vec<FlightPhase>,
        provenance: Provenance,
    ) -> Result<Self, crate::segmentation::PhaseInvariantError> {
        crate::segmentation::check_sequence(&phases)?;
        Ok(Self { phases, provenance })
    }

    pub fn phases(&self) -> &[FlightPhase] {
        &self.phases
    }

    pub fn provenance(&self) -> Provenance {
        self.provenance
    }

    pub fn is_synthetic(&self) -> bool {
        self.provenance == Provenance::Synthetic
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    pub fn get(&self, phase_type: PhaseType) -> Option<&FlightPhase> {
        self.phases.iter().find(|p| p.phase_type == phase_type)
    }

    /// Phase types present, in order. Handy for logging.
    pub fn summary(&self) -> String {
        self.phases
            .iter()
            .map(|p| p.phase_type.as_str())
            .collect::<Vec<_>>()
            .join(" > ")
    }
}
