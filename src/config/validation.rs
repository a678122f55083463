//! Config validation: unknown-key detection with Levenshtein suggestions
//! and range checks.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Warnings never break existing configs.

use std::collections::HashSet;

use super::defaults::{MAX_CONFIRMATION_WINDOW, MAX_LOOKBACK_DAYS};

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Every valid dotted key path for `AppConfig`.
///
/// Maintained by hand alongside app_config.rs.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [source]
        "source",
        "source.kind",
        "source.request_delay_ms",
        "source.timeout_secs",
        "source.max_flights",
        // [opensky]
        "opensky",
        "opensky.api_url",
        "opensky.lookback_days",
        // [flightradar24]
        "flightradar24",
        "flightradar24.list_url",
        "flightradar24.trail_url",
        "flightradar24.use_trail",
        // [replay]
        "replay",
        "replay.path",
        // [segmentation]
        "segmentation",
        "segmentation.confirmation_window",
        // [synthesis]
        "synthesis",
        "synthesis.enabled",
        // [storage]
        "storage",
        "storage.backend",
        "storage.path",
        "storage.key_scope",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Closest known key within edit distance 3. Ties go to the
/// alphabetically first key so the hint is stable between runs.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|k| (levenshtein(unknown, k), *k))
        .filter(|(dist, _)| *dist <= 3)
        .min()
        .map(|(_, k)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// Never fails: a file that does not parse yields no warnings here and is
/// reported by the serde pass instead.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let Ok(value) = raw_toml.parse::<toml::Value>() else {
        return Vec::new();
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Range Validation
// ============================================================================

/// Range checks on a parsed config.
///
/// Returns (errors, warnings). Errors are values the pipeline cannot run
/// with; warnings are legal but probably unintended.
pub fn validate_ranges(config: &super::AppConfig) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let window = config.segmentation.confirmation_window;
    if window == 0 || window > MAX_CONFIRMATION_WINDOW {
        errors.push(format!(
            "segmentation.confirmation_window = {window} must be between 1 and {MAX_CONFIRMATION_WINDOW}"
        ));
    }

    if config.source.timeout_secs == 0 {
        errors.push("source.timeout_secs must be > 0".to_string());
    }
    if config.source.max_flights == 0 {
        errors.push("source.max_flights must be > 0".to_string());
    }
    let lookback = config.opensky.lookback_days;
    if !(1..=MAX_LOOKBACK_DAYS).contains(&lookback) {
        errors.push(format!(
            "opensky.lookback_days = {lookback} must be between 1 and {MAX_LOOKBACK_DAYS}"
        ));
    }

    for (field, url) in [
        ("opensky.api_url", &config.opensky.api_url),
        ("flightradar24.list_url", &config.flightradar24.list_url),
        ("flightradar24.trail_url", &config.flightradar24.trail_url),
    ] {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            errors.push(format!("{field} = '{url}' is not an http(s) URL"));
        }
    }

    // OpenSky rejects flight queries spanning more than 30 days
    if config.opensky.lookback_days > 30 {
        warnings.push(ValidationWarning {
            field: "opensky.lookback_days".to_string(),
            message: format!(
                "opensky.lookback_days = {} exceeds the 30-day window the API serves",
                config.opensky.lookback_days
            ),
            suggestion: None,
        });
    }

    if config.source.request_delay_ms == 0 && config.source.kind != super::SourceKind::Replay {
        warnings.push(ValidationWarning {
            field: "source.request_delay_ms".to_string(),
            message: "source.request_delay_ms = 0 disables request pacing; providers may rate-limit"
                .to_string(),
            suggestion: None,
        });
    }

    (errors, warnings)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn test_levenshtein_identical() {
        assert_eq!(levenshtein("window", "window"), 0);
    }

    #[test]
    fn test_levenshtein_one_edit() {
        assert_eq!(levenshtein("confirmaton_window", "confirmation_window"), 1);
    }

    #[test]
    fn test_levenshtein_empty() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }

    #[test]
    fn test_walk_toml_keys_nested() {
        let toml: toml::Value = r#"
            [storage]
            backend = "memory"
        "#
        .parse()
        .unwrap();
        let keys = walk_toml_keys(&toml, "");
        assert!(keys.contains(&"storage".to_string()));
        assert!(keys.contains(&"storage.backend".to_string()));
    }

    #[test]
    fn test_typo_key_produces_warning_with_suggestion() {
        let toml_str = r#"
[segmentation]
confirmaton_window = 5
"#;
        let warnings = validate_unknown_keys(toml_str);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "segmentation.confirmaton_window");
        assert_eq!(
            warnings[0].suggestion.as_deref(),
            Some("segmentation.confirmation_window")
        );
    }

    #[test]
    fn test_all_valid_keys_produce_zero_warnings() {
        let toml_str = r#"
[source]
kind = "opensky"
request_delay_ms = 500

[storage]
backend = "sled"
key_scope = "aircraft_phase_range"
"#;
        let warnings = validate_unknown_keys(toml_str);
        assert!(warnings.is_empty(), "Expected 0 warnings, got: {:?}", warnings);
    }

    #[test]
    fn test_garbage_key_has_no_suggestion() {
        let known = known_config_keys();
        assert!(suggest_correction("completely_unrelated_garbage_key_xyz", &known).is_none());
    }

    #[test]
    fn test_defaults_are_in_range() {
        let (errors, warnings) = validate_ranges(&AppConfig::default());
        assert!(errors.is_empty(), "{errors:?}");
        assert!(warnings.is_empty(), "{warnings:?}");
    }

    #[test]
    fn test_zero_confirmation_window_is_an_error() {
        let mut config = AppConfig::default();
        config.segmentation.confirmation_window = 0;
        let (errors, _) = validate_ranges(&config);
        assert!(errors.iter().any(|e| e.contains("confirmation_window")));
    }

    #[test]
    fn test_non_http_url_is_an_error() {
        let mut config = AppConfig::default();
        config.opensky.api_url = "opensky-network.org/api".to_string();
        let (errors, _) = validate_ranges(&config);
        assert!(errors.iter().any(|e| e.contains("opensky.api_url")));
    }

    #[test]
    fn test_huge_lookback_is_an_error() {
        for days in [MAX_LOOKBACK_DAYS + 1, 1_000_000_000_000_000, i64::MAX] {
            let mut config = AppConfig::default();
            config.opensky.lookback_days = days;
            let (errors, _) = validate_ranges(&config);
            assert_eq!(errors.len(), 1, "{days}: {errors:?}");
            assert!(errors[0].contains("opensky.lookback_days"));
        }

        let mut config = AppConfig::default();
        config.opensky.lookback_days = MAX_LOOKBACK_DAYS;
        assert!(validate_ranges(&config).0.is_empty());
    }

    #[test]
    fn test_long_lookback_only_warns() {
        let mut config = AppConfig::default();
        config.opensky.lookback_days = 45;
        let (errors, warnings) = validate_ranges(&config);
        assert!(errors.is_empty());
        assert!(warnings.iter().any(|w| w.field == "opensky.lookback_days"));
    }
}
