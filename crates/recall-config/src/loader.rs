// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./recall.toml` > `~/.config/recall/recall.toml` >
//! `/etc/recall/recall.toml`
//! with environment variable overrides via `RECALL_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::RecallConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/recall/recall.toml` (system-wide)
/// 3. `~/.config/recall/recall.toml` (user XDG config)
/// 4. `./recall.toml` (local directory)
/// 5. `RECALL_*` environment variables
pub fn load_config() -> Result<RecallConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<RecallConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RecallConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<RecallConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RecallConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(RecallConfig::default()))
        .merge(Toml::file("/etc/recall/recall.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("recall/recall.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("recall.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider, mapping sections to dots explicitly.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `RECALL_STORAGE_DATABASE_PATH` must map to
/// `storage.database_path`, not `storage.database.path`.
fn env_provider() -> Env {
    Env::prefixed("RECALL_").map(|key| {
        // `key` keeps the env var's original case, with the prefix stripped.
        let mapped = key
            .as_str()
            .to_ascii_lowercase()
            .replacen("log_", "log.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("memory_", "memory.", 1);
        mapped.into()
    })
}
