//! Config Validation Tests
//!
//! Typo detection, range validation and strict file loading, exercised
//! through the public config API only.

use std::io::Write;

use phasetrack::config::validation::{known_config_keys, suggest_correction, validate_unknown_keys};
use phasetrack::config::{AppConfig, ConfigError, SourceKind, StorageBackend};
use phasetrack::storage::KeyScope;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

// ============================================================================
// Typo Detection
// ============================================================================

#[test]
fn typo_in_confirmation_window_warns_with_suggestion() {
    let toml_str = r#"
[segmentation]
confirmation_windw = 4
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1, "Expected exactly 1 warning");
    assert_eq!(warnings[0].field, "segmentation.confirmation_windw");
    assert_eq!(
        warnings[0].suggestion.as_deref(),
        Some("segmentation.confirmation_window")
    );
    assert!(warnings[0].to_string().contains("did you mean"));
}

#[test]
fn unknown_section_without_close_match_has_no_suggestion() {
    let warnings = validate_unknown_keys("[dashboard]\nport = 8080\n");
    assert_eq!(warnings.len(), 2);
    assert!(warnings.iter().all(|w| w.suggestion.is_none()));
}

#[test]
fn full_valid_config_produces_zero_warnings() {
    let toml_str = r#"
[source]
kind = "flightradar24"
request_delay_ms = 1500
timeout_secs = 20
max_flights = 5

[opensky]
api_url = "https://opensky-network.org/api"
lookback_days = 3

[flightradar24]
use_trail = true

[replay]
path = "flights.json"

[segmentation]
confirmation_window = 5

[synthesis]
enabled = false

[storage]
backend = "memory"
key_scope = "aircraft_phase_range"
"#;
    assert!(validate_unknown_keys(toml_str).is_empty());
}

#[test]
fn suggestions_are_limited_to_small_edit_distances() {
    let known = known_config_keys();
    assert_eq!(
        suggest_correction("storage.bakend", &known).as_deref(),
        Some("storage.backend")
    );
    assert_eq!(suggest_correction("completely.different", &known), None);
}

// ============================================================================
// File Loading
// ============================================================================

#[test]
fn file_values_override_defaults() {
    let file = write_config(
        r#"
[source]
kind = "replay"

[replay]
path = "recorded.json"

[segmentation]
confirmation_window = 6

[storage]
backend = "memory"
key_scope = "aircraft_phase_range"
"#,
    );
    let config = AppConfig::load_from_file(file.path()).unwrap();

    assert_eq!(config.source.kind, SourceKind::Replay);
    assert_eq!(config.segmentation.confirmation_window, 6);
    assert_eq!(config.storage.backend, StorageBackend::Memory);
    assert_eq!(config.storage.key_scope, KeyScope::AircraftPhaseRange);
    // Untouched sections keep their defaults
    assert_eq!(config.source.max_flights, 10);
    assert!(config.synthesis.enabled);
}

#[test]
fn unknown_keys_do_not_break_loading() {
    let file = write_config("[segmentation]\nconfirmation_windw = 9\n");
    let config = AppConfig::load_from_file(file.path()).unwrap();
    assert_eq!(config.segmentation.confirmation_window, 3);
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let file = write_config("[segmentation\nconfirmation_window = 3\n");
    assert!(matches!(
        AppConfig::load_from_file(file.path()),
        Err(ConfigError::Parse(..))
    ));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        AppConfig::load_from_file(&dir.path().join("absent.toml")),
        Err(ConfigError::Io(..))
    ));
}

// ============================================================================
// Range Validation
// ============================================================================

#[test]
fn every_range_error_is_reported_at_once() {
    let file = write_config(
        r#"
[source]
kind = "replay"
timeout_secs = 0
max_flights = 0

[opensky]
lookback_days = 0
api_url = "ftp://example.org"

[segmentation]
confirmation_window = 0
"#,
    );
    match AppConfig::load_from_file(file.path()) {
        Err(ConfigError::Validation(errors)) => {
            assert_eq!(errors.len(), 6, "{errors:?}");
            assert!(errors.iter().any(|e| e.contains("replay.path")));
            assert!(errors.iter().any(|e| e.contains("confirmation_window")));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn validation_display_lists_each_problem() {
    let err = ConfigError::Validation(vec!["first".to_string(), "second".to_string()]);
    let text = err.to_string();
    assert!(text.starts_with("Config validation failed:"));
    assert!(text.contains("  - first\n"));
    assert!(text.contains("  - second\n"));
}

#[test]
fn defaults_are_valid() {
    assert!(AppConfig::default().validate().is_ok());
}
