//! AppConfig - every operator-tunable setting as a TOML value
//!
//! Each struct implements `Default` with the values from [`super::defaults`],
//! so a missing file or a missing section behaves exactly like the built-ins.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

use super::defaults;
use crate::storage::KeyScope;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a phasetrack run.
///
/// Load with `AppConfig::load()` which searches:
/// 1. `$PHASETRACK_CONFIG` env var
/// 2. `./phasetrack.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Which provider to query and how politely
    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub opensky: OpenSkyConfig,

    #[serde(default)]
    pub flightradar24: Flightradar24Config,

    /// Offline JSON replay file
    #[serde(default)]
    pub replay: ReplayConfig,

    /// Phase state machine tuning
    #[serde(default)]
    pub segmentation: SegmentationConfig,

    /// Schedule-based fallback when telemetry is missing
    #[serde(default)]
    pub synthesis: SynthesisConfig,

    /// Where phase rows end up
    #[serde(default)]
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Load configuration using the standard search order:
    /// 1. `$PHASETRACK_CONFIG` environment variable
    /// 2. `./phasetrack.toml` in the current working directory
    /// 3. Built-in defaults
    ///
    /// A broken file is reported and skipped, never fatal here.
    pub fn load() -> Self {
        // 1. Check env var
        if let Ok(path) = std::env::var(defaults::CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(
                            path = %p.display(),
                            source = %config.source.kind,
                            "Loaded config from PHASETRACK_CONFIG"
                        );
                        return config;
                    }
                    Err(e) => {
                        warn!(
                            path = %p.display(),
                            error = %e,
                            "Failed to load config from PHASETRACK_CONFIG, falling back"
                        );
                    }
                }
            } else {
                warn!(path = %path, "PHASETRACK_CONFIG points to non-existent file, falling back");
            }
        }

        // 2. Check ./phasetrack.toml
        let local = PathBuf::from(defaults::LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!(source = %config.source.kind, "Loaded config from ./phasetrack.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./phasetrack.toml, using defaults");
                }
            }
        }

        // 3. Defaults
        info!("No phasetrack.toml found, using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path. Unknown keys only warn; parse and
    /// validation failures are errors.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;

        // Two-pass: check for unknown keys first (warnings only)
        for w in super::validation::validate_unknown_keys(&contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(&contents)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty TOML (used to print an effective config).
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate cross-field and range constraints.
    ///
    /// Collects every problem before failing so an operator can fix a file
    /// in one pass.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (mut errors, warnings) = super::validation::validate_ranges(self);
        for w in &warnings {
            warn!("{}", w);
        }

        if self.source.kind == SourceKind::Replay && self.replay.path.is_none() {
            errors.push("source.kind = \"replay\" requires replay.path".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Source Selection
// ============================================================================

/// Flight data provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    OpenSky,
    Flightradar24,
    Replay,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::OpenSky => "opensky",
            SourceKind::Flightradar24 => "flightradar24",
            SourceKind::Replay => "replay",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "opensky" => Ok(SourceKind::OpenSky),
            "flightradar24" | "fr24" => Ok(SourceKind::Flightradar24),
            "replay" => Ok(SourceKind::Replay),
            other => Err(format!(
                "unknown source '{other}' (expected opensky, flightradar24 or replay)"
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub kind: SourceKind,

    /// Minimum pause between two requests to the provider (ms)
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// Per-request HTTP timeout (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Most recent flights processed per run
    #[serde(default = "default_max_flights")]
    pub max_flights: usize,
}

fn default_request_delay_ms() -> u64 {
    defaults::REQUEST_DELAY_MS
}
fn default_timeout_secs() -> u64 {
    defaults::HTTP_TIMEOUT_SECS
}
fn default_max_flights() -> usize {
    defaults::MAX_FLIGHTS
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::default(),
            request_delay_ms: default_request_delay_ms(),
            timeout_secs: default_timeout_secs(),
            max_flights: default_max_flights(),
        }
    }
}

// ============================================================================
// Provider Sections
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenSkyConfig {
    #[serde(default = "default_opensky_api_url")]
    pub api_url: String,

    /// How far back to look for flights (days)
    #[serde(default = "default_lookback_days")]
    pub lookback_days: i64,
}

fn default_opensky_api_url() -> String {
    defaults::OPENSKY_API_URL.to_string()
}
fn default_lookback_days() -> i64 {
    defaults::OPENSKY_LOOKBACK_DAYS
}

impl Default for OpenSkyConfig {
    fn default() -> Self {
        Self {
            api_url: default_opensky_api_url(),
            lookback_days: default_lookback_days(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flightradar24Config {
    #[serde(default = "default_fr24_list_url")]
    pub list_url: String,

    #[serde(default = "default_fr24_trail_url")]
    pub trail_url: String,

    /// Also fetch the live trail per flight instead of relying on
    /// schedule synthesis alone
    #[serde(default)]
    pub use_trail: bool,
}

fn default_fr24_list_url() -> String {
    defaults::FR24_LIST_URL.to_string()
}
fn default_fr24_trail_url() -> String {
    defaults::FR24_TRAIL_URL.to_string()
}

impl Default for Flightradar24Config {
    fn default() -> Self {
        Self {
            list_url: default_fr24_list_url(),
            trail_url: default_fr24_trail_url(),
            use_trail: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// JSON file with `{"flights": [...]}`
    #[serde(default)]
    pub path: Option<PathBuf>,
}

// ============================================================================
// Core Tuning
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentationConfig {
    /// Points that must stay at or below the climb peak before CRUISE
    #[serde(default = "default_confirmation_window")]
    pub confirmation_window: usize,
}

fn default_confirmation_window() -> usize {
    defaults::CONFIRMATION_WINDOW
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            confirmation_window: default_confirmation_window(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

// ============================================================================
// Storage
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sled,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// sled database directory
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,

    /// Conflict key: one row per phase type, or one per type and time range
    #[serde(default)]
    pub key_scope: KeyScope,
}

fn default_storage_path() -> PathBuf {
    PathBuf::from(defaults::STORAGE_PATH)
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_storage_path(),
            key_scope: KeyScope::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate_cleanly() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
[source]
kind = "flightradar24"
max_flights = 3
"#,
        )
        .unwrap();
        assert_eq!(config.source.kind, SourceKind::Flightradar24);
        assert_eq!(config.source.max_flights, 3);
        assert_eq!(config.source.request_delay_ms, 1000);
        assert_eq!(config.segmentation.confirmation_window, 3);
        assert!(config.synthesis.enabled);
        assert_eq!(config.storage.key_scope, KeyScope::AircraftPhase);
    }

    #[test]
    fn replay_without_path_is_rejected() {
        let mut config = AppConfig::default();
        config.source.kind = SourceKind::Replay;
        match config.validate() {
            Err(ConfigError::Validation(errors)) => {
                assert!(errors.iter().any(|e| e.contains("replay.path")));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn source_kind_parses_aliases() {
        assert_eq!("OpenSky".parse::<SourceKind>(), Ok(SourceKind::OpenSky));
        assert_eq!("fr24".parse::<SourceKind>(), Ok(SourceKind::Flightradar24));
        assert!("adsb-exchange".parse::<SourceKind>().is_err());
    }

    #[test]
    fn validation_error_lists_every_problem() {
        let err = ConfigError::Validation(vec!["a is bad".into(), "b is bad".into()]);
        let text = err.to_string();
        assert!(text.contains("  - a is bad"));
        assert!(text.contains("  - b is bad"));
    }

    #[test]
    fn toml_round_trip_keeps_storage_settings() {
        let mut config = AppConfig::default();
        config.storage.backend = StorageBackend::Memory;
        config.storage.key_scope = KeyScope::AircraftPhaseRange;
        let text = config.to_toml().unwrap();
        let back: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(back.storage.backend, StorageBackend::Memory);
        assert_eq!(back.storage.key_scope, KeyScope::AircraftPhaseRange);
    }
}
