// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as non-empty paths, positive windows, and known log levels.

use crate::diagnostic::ConfigError;
use crate::model::RecallConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &RecallConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let level = config.log.level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "log.level `{}` is not one of: {}",
                config.log.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.storage.query_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "storage.query_timeout_secs must be greater than 0".to_string(),
        });
    }

    // The window bound is mandatory even for last-N reads.
    if config.memory.message_window == 0 {
        errors.push(ConfigError::Validation {
            message: "memory.message_window must be greater than 0".to_string(),
        });
    }

    if config.memory.page_size == 0 {
        errors.push(ConfigError::Validation {
            message: "memory.page_size must be greater than 0".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
