// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Recall configuration system.

use recall_config::diagnostic::{ConfigError, suggest_key};
use recall_config::model::RecallConfig;
use recall_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};
use serial_test::serial;

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_recall_config() {
    let toml = r#"
[log]
level = "debug"

[storage]
database_path = "/tmp/test.db"
wal_mode = false
busy_timeout_ms = 250
query_timeout_secs = 5

[memory]
message_window = 20
page_size = 10
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.log.level, "debug");
    assert_eq!(config.storage.database_path, "/tmp/test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.storage.busy_timeout_ms, 250);
    assert_eq!(config.storage.query_timeout_secs, 5);
    assert_eq!(config.memory.message_window, 20);
    assert_eq!(config.memory.page_size, 10);
}

/// Sections left out of the file fall back to compiled defaults.
#[test]
fn missing_sections_use_defaults() {
    let toml = r#"
[memory]
message_window = 8
"#;

    let config = load_config_from_str(toml).expect("partial TOML should deserialize");
    assert_eq!(config.memory.message_window, 8);
    assert_eq!(config.log.level, "info");
    assert!(config.storage.wal_mode);
    assert_eq!(config.storage.query_timeout_secs, 30);
}

/// Serialized defaults provide sensible values for all fields.
#[test]
fn serialized_defaults_are_sensible() {
    let config = RecallConfig::default();

    assert_eq!(config.log.level, "info");
    assert!(config.storage.database_path.ends_with("recall.db"));
    assert!(config.storage.wal_mode);
    assert_eq!(config.storage.busy_timeout_ms, 5_000);
    assert_eq!(config.memory.message_window, 12);
    assert_eq!(config.memory.page_size, 50);
}

/// Unknown field in a section is rejected.
#[test]
fn unknown_field_in_storage_produces_error() {
    let toml = r#"
[storage]
databse_path = "/tmp/x.db"
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("databse_path"),
        "error should mention unknown field or the bad key, got: {err_str}"
    );
}

/// Unknown top-level sections are rejected too.
#[test]
fn deny_unknown_fields_at_top_level() {
    let toml = r#"
[telemetry]
enabled = true
"#;

    assert!(load_config_from_str(toml).is_err());
}

/// The diagnostic bridge reports the bad key, a suggestion, and the valid keys.
#[test]
fn diagnostic_error_includes_suggestion_and_valid_keys() {
    let toml = r#"
[memory]
message_windw = 5
"#;

    let errors = load_and_validate_str(toml).expect_err("should produce errors");
    let found = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { key, suggestion, valid_keys, .. } if {
            key == "message_windw"
                && suggestion.as_deref() == Some("message_window")
                && valid_keys.contains("page_size")
        })
    });
    assert!(found, "expected UnknownKey with suggestion, got: {errors:?}");
}

#[test]
fn diagnostic_no_suggestion_for_distant_typo() {
    assert!(suggest_key("qqqq", &["level"]).is_none());
}

/// Invalid type (string where number expected) produces clear message.
#[test]
fn diagnostic_invalid_type_message() {
    let toml = r#"
[memory]
message_window = "lots"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject invalid type");
    let bad_keys: Vec<&str> = errors
        .iter()
        .filter_map(|e| match e {
            ConfigError::InvalidType { key, .. } => Some(key.as_str()),
            _ => None,
        })
        .collect();
    assert!(
        bad_keys.iter().any(|k| k.contains("message_window")),
        "expected InvalidType for message_window, got: {errors:?}"
    );
}

/// ConfigError renders through miette's graphical handler.
#[test]
fn config_error_renders_with_miette() {
    use miette::{Diagnostic, GraphicalReportHandler};

    let error = ConfigError::UnknownKey {
        key: "message_windw".to_string(),
        suggestion: Some("message_window".to_string()),
        valid_keys: "message_window, page_size".to_string(),
        span: None,
        src: None,
    };

    assert!(error.code().is_some(), "should have diagnostic code");
    let help = error.help().expect("should have help text").to_string();
    assert!(help.contains("did you mean `message_window`"), "got: {help}");

    let mut buf = String::new();
    GraphicalReportHandler::new()
        .render_report(&mut buf, &error)
        .expect("should render without error");
    assert!(buf.contains("message_windw"));
}

/// Semantic validation runs after a successful parse.
#[test]
fn load_and_validate_rejects_zero_window() {
    let toml = r#"
[memory]
message_window = 0
"#;

    let errors = load_and_validate_str(toml).expect_err("zero window should fail");
    let messages: Vec<&str> = errors
        .iter()
        .filter_map(|e| match e {
            ConfigError::Validation { message } => Some(message.as_str()),
            _ => None,
        })
        .collect();
    assert!(messages.iter().any(|m| m.contains("message_window")), "got: {errors:?}");
}

/// `RECALL_*` env vars override values from the config file, and keys with
/// underscores map to the right field.
#[test]
#[serial]
fn env_vars_override_file_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("recall.toml");
    std::fs::write(
        &path,
        r#"
[storage]
database_path = "/tmp/from-file.db"

[memory]
message_window = 4
"#,
    )
    .unwrap();

    // SAFETY: serialized with other env-mutating tests via #[serial].
    unsafe {
        std::env::set_var("RECALL_STORAGE_DATABASE_PATH", "/tmp/from-env.db");
        std::env::set_var("RECALL_MEMORY_PAGE_SIZE", "7");
    }
    let result = load_and_validate_path(&path);
    unsafe {
        std::env::remove_var("RECALL_STORAGE_DATABASE_PATH");
        std::env::remove_var("RECALL_MEMORY_PAGE_SIZE");
    }

    let config = result.expect("config should load");
    assert_eq!(config.storage.database_path, "/tmp/from-env.db");
    assert_eq!(config.memory.page_size, 7);
    assert_eq!(config.memory.message_window, 4);
}

/// A single env var applies on top of defaults when no file exists.
#[test]
#[serial]
fn log_level_env_var_applies_without_config_file() {
    // SAFETY: serialized with other env-mutating tests via #[serial].
    unsafe {
        std::env::set_var("RECALL_LOG_LEVEL", "debug");
    }
    let result = load_and_validate_path(std::path::Path::new("/nonexistent/recall.toml"));
    unsafe {
        std::env::remove_var("RECALL_LOG_LEVEL");
    }

    let config = result.expect("env override should load");
    assert_eq!(config.log.level, "debug");
    assert_eq!(config.memory.message_window, 12);
}

/// A config path that does not exist is skipped, leaving defaults.
#[test]
#[serial]
fn missing_config_file_is_silently_skipped() {
    let config = load_and_validate_path(std::path::Path::new("/nonexistent/recall.toml"))
        .expect("missing file should fall back to defaults");
    assert_eq!(config.memory.message_window, 12);
}
