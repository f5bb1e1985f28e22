// SPDX-FileCopyrightText: 2026 Pitwall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Pitwall configuration system.

use pitwall_config::diagnostic::{ConfigError, suggest_key};
use pitwall_config::model::{CacheBackend, PitwallConfig};
use pitwall_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};

/// Valid TOML with every known section deserializes successfully.
#[test]
fn valid_toml_deserializes_into_pitwall_config() {
    let toml = r#"
[service]
log_level = "debug"

[storage]
database_path = "/tmp/pitwall-test.db"
wal_mode = false

[cache]
backend = "redis"
url = "redis://cache.internal:6379/2"
operation_timeout_ms = 150

[rate_limit]
fail_open = false
default_limit = 25
default_window_secs = 60

[memory]
retention_secs = 3600
recent_messages = 4
knowledge_results = 1
similar_contexts = 5
embedding_dimensions = 16
persona = "You are a pit crew chief."
apology = "Sorry, try again."
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.service.log_level, "debug");
    assert_eq!(config.storage.database_path, "/tmp/pitwall-test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.cache.backend, CacheBackend::Redis);
    assert_eq!(config.cache.url, "redis://cache.internal:6379/2");
    assert_eq!(config.cache.operation_timeout().as_millis(), 150);
    assert!(!config.rate_limit.fail_open);
    assert_eq!(config.rate_limit.default_limit, 25);
    assert_eq!(config.rate_limit.default_window_secs, 60);
    assert_eq!(config.memory.retention().as_secs(), 3600);
    assert_eq!(config.memory.recent_messages, 4);
    assert_eq!(config.memory.knowledge_results, 1);
    assert_eq!(config.memory.similar_contexts, 5);
    assert_eq!(config.memory.embedding_dimensions, 16);
    assert_eq!(config.memory.persona, "You are a pit crew chief.");
    assert_eq!(config.memory.apology, "Sorry, try again.");
}

/// Unknown field in [rate_limit] is rejected.
#[test]
fn unknown_field_in_rate_limit_produces_error() {
    let toml = r#"
[rate_limit]
fail_opn = true
"#;
    let err = load_config_from_str(toml).unwrap_err();
    assert!(err.to_string().contains("fail_opn"), "got: {err}");
}

/// Unknown top-level section is rejected.
#[test]
fn deny_unknown_fields_at_top_level() {
    let toml = r#"
[telemetry]
enabled = true
"#;
    assert!(load_config_from_str(toml).is_err());
}

/// Missing sections fall back to compiled defaults.
#[test]
fn missing_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML is valid");
    assert_eq!(config.service.log_level, "info");
    assert_eq!(config.cache.backend, CacheBackend::Memory);
    assert_eq!(config.cache.operation_timeout_ms, 200);
    assert!(config.rate_limit.fail_open);
    assert_eq!(config.memory.retention_secs, 604_800);
    assert_eq!(config.memory.recent_messages, 10);
    assert_eq!(config.memory.knowledge_results, 3);
    assert_eq!(config.memory.similar_contexts, 2);
    assert_eq!(config.memory.embedding_dimensions, 768);
    assert!(config.storage.database_path.ends_with("pitwall.db"));
}

/// A dotted override (what `PITWALL_RATE_LIMIT_FAIL_OPEN` maps to) wins over TOML.
#[test]
fn dotted_override_beats_toml() {
    use figment::{
        Figment,
        providers::{Format, Serialized, Toml},
    };

    let toml_content = r#"
[rate_limit]
fail_open = true
"#;

    let config: PitwallConfig = Figment::new()
        .merge(Serialized::defaults(PitwallConfig::default()))
        .merge(Toml::string(toml_content))
        .merge((
            pitwall_config::loader::map_env_key("rate_limit_fail_open"),
            false,
        ))
        .extract()
        .expect("should merge override");

    assert!(!config.rate_limit.fail_open);
}

#[test]
fn diagnostic_fail_opn_suggests_fail_open() {
    let valid = &["fail_open", "default_limit", "default_window_secs"];
    assert_eq!(suggest_key("fail_opn", valid), Some("fail_open".into()));
}

/// Figment unknown-field errors become UnknownKey diagnostics with a suggestion.
#[test]
fn unknown_key_diagnostic_carries_suggestion() {
    let toml = r#"
[memory]
retention_sec = 10
"#;
    let errors = load_and_validate_str(toml).unwrap_err();
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key,
            suggestion,
            valid_keys,
            ..
        } => {
            assert_eq!(key, "retention_sec");
            assert_eq!(suggestion.as_deref(), Some("retention_secs"));
            assert!(valid_keys.contains("embedding_dimensions"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

/// Wrong value types surface as InvalidType.
#[test]
fn invalid_type_diagnostic() {
    let toml = r#"
[cache]
operation_timeout_ms = "fast"
"#;
    let errors = load_and_validate_str(toml).unwrap_err();
    assert!(
        matches!(&errors[0], ConfigError::InvalidType { key, .. } if key.contains("operation_timeout_ms")),
        "got {:?}",
        errors[0]
    );
}

#[test]
fn config_error_renders_with_miette() {
    use miette::{Diagnostic, GraphicalReportHandler};

    let error = ConfigError::UnknownKey {
        key: "urll".to_string(),
        suggestion: Some("url".to_string()),
        valid_keys: "backend, url, operation_timeout_ms".to_string(),
        span: None,
        src: None,
    };
    assert!(error.code().is_some());
    let help = error.help().expect("help text").to_string();
    assert!(help.contains("did you mean `url`"), "got: {help}");

    let mut buf = String::new();
    GraphicalReportHandler::new()
        .render_report(&mut buf, &error)
        .expect("should render");
    assert!(buf.contains("urll"));
}

/// Semantic validation runs after a successful parse.
#[test]
fn validation_rejects_zero_window() {
    let toml = r#"
[rate_limit]
default_window_secs = 0
"#;
    let errors = load_and_validate_str(toml).unwrap_err();
    assert!(matches!(errors[0], ConfigError::Validation { .. }));
}

#[test]
fn load_from_explicit_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pitwall.toml");
    std::fs::write(
        &path,
        "[cache]\nbackend = \"memory\"\noperation_timeout_ms = 75\n",
    )
    .unwrap();

    let config = load_and_validate_path(&path).expect("file config should validate");
    assert_eq!(config.cache.operation_timeout_ms, 75);
}

/// A section parsed on its own fills unspecified keys from defaults.
#[test]
fn partial_section_falls_back_to_field_defaults() {
    let section: pitwall_config::model::RateLimitConfig =
        toml::from_str("fail_open = false").expect("partial section should parse");
    assert!(!section.fail_open);
    assert_eq!(section.default_limit, 10);
    assert_eq!(section.default_window_secs, 3600);

    let err = toml::from_str::<pitwall_config::model::RateLimitConfig>("fail_opn = false")
        .expect_err("unknown key must be rejected");
    assert!(err.to_string().contains("fail_opn"));
}
