// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Recall message store.
//!
//! Provides TOML configuration parsing with strict validation (`deny_unknown_fields`),
//! XDG file hierarchy lookup, environment variable overrides, and diagnostic
//! error rendering with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use recall_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("Message window: {}", config.memory.message_window);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::RecallConfig;

/// Load configuration from the standard locations plus `RECALL_*` env vars,
/// then validate it.
///
/// Parse failures come back as miette diagnostics with typo suggestions;
/// semantic problems as [`ConfigError::Validation`]. All errors are
/// collected rather than stopping at the first.
pub fn load_and_validate() -> Result<RecallConfig, Vec<ConfigError>> {
    checked(loader::load_config(), collect_toml_sources)
}

/// Like [`load_and_validate`], but reads a single explicit file instead of
/// the standard locations. A missing file leaves the defaults in place.
pub fn load_and_validate_path(path: &Path) -> Result<RecallConfig, Vec<ConfigError>> {
    checked(loader::load_config_from_path(path), || {
        std::fs::read_to_string(path)
            .map(|content| vec![(path.display().to_string(), content)])
            .unwrap_or_default()
    })
}

/// Validate configuration given inline. No files or env vars are consulted.
pub fn load_and_validate_str(toml_content: &str) -> Result<RecallConfig, Vec<ConfigError>> {
    checked(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

/// Validate a loaded config, or convert the load error. `sources` is only
/// read on failure, to attach spans.
fn checked(
    loaded: Result<RecallConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Result<RecallConfig, Vec<ConfigError>> {
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err, &sources())),
    }
}

/// Contents of whichever standard config files exist, keyed by path.
fn collect_toml_sources() -> Vec<(String, String)> {
    let local = std::env::current_dir()
        .map(|d| d.join("recall.toml"))
        .unwrap_or_else(|_| "recall.toml".into());
    let user = dirs::config_dir().map(|d| d.join("recall/recall.toml"));
    let system = Some(std::path::PathBuf::from("/etc/recall/recall.toml"));

    [Some(local), user, system]
        .into_iter()
        .flatten()
        .filter_map(|path| {
            let content = std::fs::read_to_string(&path).ok()?;
            Some((path.display().to_string(), content))
        })
        .collect()
}
