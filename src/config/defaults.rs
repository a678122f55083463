//! System-wide default constants.
//!
//! Centralises magic numbers used by the segmenter, synthesizer, sources and
//! storage. Grouped by subsystem for easy discovery.

// ============================================================================
// Segmentation
// ============================================================================

/// Points after a candidate top-of-climb that must not exceed the climb peak
/// before TAKEOFF hands over to CRUISE.
pub const CONFIRMATION_WINDOW: usize = 3;

/// Largest confirmation window the config accepts.
pub const MAX_CONFIRMATION_WINDOW: usize = 60;

// ============================================================================
// Synthetic Trajectory
// ============================================================================

/// Ground allowance before departure and before arrival (minutes).
pub const SYNTHETIC_GROUND_MINUTES: i64 = 15;

/// Altitude of the departure point (ft).
pub const SYNTHETIC_TAKEOFF_ALTITUDE_FT: f64 = 500.0;

/// Altitude of the mid-flight point (ft).
pub const SYNTHETIC_CRUISE_ALTITUDE_FT: f64 = 35_000.0;

/// Altitude of the point 15 minutes before arrival (ft).
pub const SYNTHETIC_APPROACH_ALTITUDE_FT: f64 = 1_000.0;

// ============================================================================
// Sources
// ============================================================================

/// Pause between successive requests to the same upstream API (ms).
pub const REQUEST_DELAY_MS: u64 = 1_000;

/// HTTP timeout for source requests (seconds).
pub const HTTP_TIMEOUT_SECS: u64 = 10;

/// Most recent flights processed per run.
pub const MAX_FLIGHTS: usize = 10;

/// OpenSky flight history window (days).
pub const OPENSKY_LOOKBACK_DAYS: i64 = 7;

/// Upper bound accepted for `opensky.lookback_days`.
pub const MAX_LOOKBACK_DAYS: i64 = 365;

/// OpenSky REST API root.
pub const OPENSKY_API_URL: &str = "https://opensky-network.org/api";

/// Flightradar24 flight list endpoint.
pub const FR24_LIST_URL: &str = "https://api.flightradar24.com/common/v1/flight/list.json";

/// Flightradar24 live trail endpoint.
pub const FR24_TRAIL_URL: &str = "https://data-live.flightradar24.com/clickhandler/";

/// Flightradar24 rejects requests without a browser-like agent.
pub const FR24_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// OpenSky reports barometric altitude in metres; phases are kept in feet.
pub const FEET_PER_METRE: f64 = 3.280_84;

// ============================================================================
// Storage
// ============================================================================

/// Default sled database location.
pub const STORAGE_PATH: &str = "./data/flight_phases.db";

/// Separator between key components in the phase store.
pub const KEY_SEPARATOR: u8 = 0x1f;

// ============================================================================
// Configuration
// ============================================================================

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "PHASETRACK_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "phasetrack.toml";
