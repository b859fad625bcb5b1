// Unit tests for config validation and persistence

use crate::config::RelayConfig;
use crate::error::ConfigError;

use std::time::Duration;

use tempfile::TempDir;

/// **VALUE**: Verifies the defaults are valid and carry the documented timings.
///
/// **BUG THIS CATCHES**: Would catch a default drifting away from the 500 ms / 15 s poll
/// schedule or the 1 s client connect timeout.
#[test]
fn given_default_config_when_validated_then_ok_with_documented_timings() {
    // GIVEN: Defaults
    let config = RelayConfig::default();

    // WHEN/THEN: Valid, with the documented values
    assert!(config.validate().is_ok());
    let settings = config.resolver_settings();
    assert_eq!(settings.poll_interval, Duration::from_millis(500));
    assert_eq!(settings.poll_budget, Duration::from_secs(15));
    assert_eq!(config.connect_timeout(), Duration::from_millis(1000));
    assert_eq!(config.server_settings().retry_backoff, Duration::from_millis(250));
}

/// **VALUE**: Verifies each invalid value is rejected.
#[test]
fn given_invalid_values_when_validated_then_validation_error() {
    let mut cases = Vec::new();

    let mut config = RelayConfig::default();
    config.version = 0;
    cases.push(config);

    let mut config = RelayConfig::default();
    config.host.executable = "  ".to_string();
    cases.push(config);

    let mut config = RelayConfig::default();
    config.host.project_extensions = vec![".".to_string()];
    cases.push(config);

    let mut config = RelayConfig::default();
    config.resolver.poll_interval_ms = 0;
    cases.push(config);

    let mut config = RelayConfig::default();
    config.resolver.poll_interval_ms = 20_000;
    cases.push(config);

    for config in cases {
        let result = config.validate();
        assert!(
            matches!(result, Err(ConfigError::Validation { .. })),
            "Expected validation error for {config:?}"
        );
    }
}

/// **VALUE**: Verifies a saved config loads back unchanged.
#[test]
fn given_saved_config_when_loaded_then_values_match() {
    // GIVEN: A non-default config saved to disk
    let temp = TempDir::new().expect("tempdir");
    let mut config = RelayConfig::default();
    config.host.executable = "/opt/host/bin/host".to_string();
    config.resolver.poll_budget_ms = 3000;
    config.save(temp.path()).expect("save");

    // WHEN: Loading
    let loaded = RelayConfig::load(temp.path()).expect("load");

    // THEN: Same values, no temp file left behind
    assert_eq!(loaded, config);
    assert!(!temp.path().join("config.json.tmp").exists());
}

/// **VALUE**: Verifies missing fields fall back to defaults.
///
/// **WHY THIS MATTERS**: Users write partial config files by hand.
#[test]
fn given_partial_json_when_loaded_then_missing_fields_default() {
    // GIVEN: Only one field set
    let temp = TempDir::new().expect("tempdir");
    std::fs::write(
        temp.path().join("config.json"),
        r#"{ "host": { "executable": "code" } }"#,
    )
    .expect("write");

    // WHEN: Loading
    let loaded = RelayConfig::load(temp.path()).expect("load");

    // THEN: Field set, the rest default
    assert_eq!(loaded.host.executable, "code");
    assert_eq!(loaded.host.process_name, "devenv");
    assert_eq!(loaded.channel.name, "editor-relay");
}

/// **VALUE**: Verifies a corrupt file is an error from `load` but defaults from
/// `load_or_default`.
#[test]
fn given_corrupt_json_when_loaded_then_parse_error_or_defaults() {
    let temp = TempDir::new().expect("tempdir");
    std::fs::write(temp.path().join("config.json"), "{ not json").expect("write");

    assert!(matches!(
        RelayConfig::load(temp.path()),
        Err(ConfigError::Parse { .. })
    ));
    assert_eq!(RelayConfig::load_or_default(temp.path()), RelayConfig::default());
}

/// **VALUE**: Verifies a missing file is not an error.
#[test]
fn given_missing_file_when_loaded_then_defaults() {
    let temp = TempDir::new().expect("tempdir");

    let loaded = RelayConfig::load(temp.path()).expect("load");

    assert_eq!(loaded, RelayConfig::default());
}
