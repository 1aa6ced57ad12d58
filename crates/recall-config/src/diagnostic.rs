// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns figment extraction failures into miette diagnostics.
//!
//! Unknown keys get a "did you mean" hint (Jaro-Winkler via `strsim`) and,
//! when the offending file is known, a label pointing at the key in
//! `recall.toml`.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use figment::error::Kind;
use miette::{Diagnostic, GraphicalReportHandler, NamedSource, SourceSpan};
use thiserror::Error;

/// Below this similarity no suggestion is offered.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration problem, ready for miette rendering.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(recall::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        /// Closest valid key, if any is close enough.
        suggestion: Option<String>,
        /// Comma-separated keys accepted at this position.
        valid_keys: String,
        #[label("this key is not recognized")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("invalid type for key `{key}`: {detail}")]
    #[diagnostic(code(recall::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        /// Dotted path, e.g. `memory.message_window`.
        key: String,
        detail: String,
        expected: String,
        #[label("wrong type here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(recall::config::missing_key),
        help("add `{key} = <value>` to your recall.toml")
    )]
    MissingKey { key: String },

    /// A value parsed but is not usable (see `validation`).
    #[error("validation error: {message}")]
    #[diagnostic(code(recall::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(recall::config::other))]
    Other(String),
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

/// Convert every error carried by `err` into a [`ConfigError`].
///
/// `toml_sources` pairs file paths with their contents and is used only to
/// attach source spans.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    err.into_iter()
        .map(|error| convert(&error, toml_sources))
        .collect()
}

fn convert(error: &figment::Error, toml_sources: &[(String, String)]) -> ConfigError {
    match &error.kind {
        Kind::UnknownField(field, expected) => {
            let suggestion = suggest_key(field, expected);
            let (span, src) = locate(error, &error.path, field, toml_sources);
            ConfigError::UnknownKey {
                key: field.clone(),
                suggestion,
                valid_keys: expected.join(", "),
                span,
                src,
            }
        }
        Kind::MissingField(field) => ConfigError::MissingKey {
            key: field.to_string(),
        },
        Kind::InvalidType(actual, expected) => {
            // The last path element is the key itself; the rest is its section.
            let (span, src) = match error.path.split_last() {
                Some((field, section)) => locate(error, section, field, toml_sources),
                None => (None, None),
            };
            ConfigError::InvalidType {
                key: error.path.join("."),
                detail: format!("found {actual}, expected {expected}"),
                expected: expected.to_string(),
                span,
                src,
            }
        }
        _ => ConfigError::Other(error.to_string()),
    }
}

/// Span of `field` under `section` in whichever file the error came from.
fn locate(
    error: &figment::Error,
    section: &[String],
    field: &str,
    toml_sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let Some(figment::Source::File(file)) = error.metadata.as_ref().and_then(|m| m.source.as_ref())
    else {
        return (None, None);
    };
    let file = file.display().to_string();
    let Some((path, content)) = toml_sources.iter().find(|(p, _)| *p == file) else {
        return (None, None);
    };
    match find_key_offset(content, section, field) {
        Some(offset) => (
            Some(SourceSpan::new(offset.into(), field.len())),
            Some(NamedSource::new(path, content.clone())),
        ),
        None => (None, None),
    }
}

/// Byte offset of the key `field` inside the table `section` of a TOML
/// document. An empty `section` means the top level, before any header.
///
/// Only keys at the start of a line are considered, so values and comments
/// that merely mention the key are skipped.
pub fn find_key_offset(content: &str, section: &[String], field: &str) -> Option<usize> {
    let wanted = section.join(".");
    let mut current = String::new();
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        let indent = line.len() - line.trim_start().len();
        let trimmed = line.trim();

        if let Some(header) = trimmed.strip_prefix('[').and_then(|h| h.strip_suffix(']')) {
            current = header.trim().to_string();
        } else if current == wanted {
            let is_key = trimmed
                .strip_prefix(field)
                .and_then(|rest| rest.trim_start().strip_prefix('='))
                .is_some();
            if is_key {
                return Some(offset + indent);
            }
        }
        offset += line.len();
    }
    None
}

/// Closest entry of `valid_keys` to `unknown`, if any clears the threshold.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Render one error with miette's graphical handler.
pub fn render_error(error: &ConfigError) -> String {
    let mut buf = String::new();
    match GraphicalReportHandler::new().render_report(&mut buf, error) {
        Ok(()) => buf,
        Err(_) => format!("Error: {error}\n"),
    }
}

/// Render every error to stderr.
pub fn render_errors(errors: &[ConfigError]) {
    for error in errors {
        eprint!("{}", render_error(error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(name: &str) -> Vec<String> {
        vec![name.to_string()]
    }

    #[test]
    fn suggests_close_keys() {
        assert_eq!(
            suggest_key("message_windw", &["message_window", "page_size"]),
            Some("message_window".to_string())
        );
        let storage_keys = ["database_path", "wal_mode", "busy_timeout_ms", "query_timeout_secs"];
        assert_eq!(suggest_key("databse_path", &storage_keys), Some("database_path".to_string()));
        assert_eq!(suggest_key("zzzzzz", &["message_window", "page_size"]), None);
    }

    #[test]
    fn finds_key_in_its_own_section_only() {
        let content = "[log]\nlevel = \"info\"\n\n[memory]\n# level is not here\n  page_size = 3\n";
        let o = find_key_offset(content, &section("memory"), "page_size").unwrap();
        assert_eq!(&content[o..o + 9], "page_size");
        assert_eq!(find_key_offset(content, &section("memory"), "level"), None);
        assert_eq!(find_key_offset(content, &section("storage"), "level"), None);
    }

    #[test]
    fn key_prefix_does_not_match_longer_key() {
        let content = "[storage]\nwal_mode_x = true\nwal_mode = false\n";
        let o = find_key_offset(content, &section("storage"), "wal_mode").unwrap();
        assert_eq!(&content[o..], "wal_mode = false\n");
    }

    #[test]
    fn handles_crlf_line_endings() {
        let content = "[storage]\r\ndatabse_path = \"x\"\r\n";
        let o = find_key_offset(content, &section("storage"), "databse_path").unwrap();
        assert_eq!(o, "[storage]\r\n".len());
    }

    #[test]
    fn rendered_unknown_key_mentions_suggestion() {
        let error = ConfigError::UnknownKey {
            key: "pagesize".into(),
            suggestion: Some("page_size".into()),
            valid_keys: "message_window, page_size".into(),
            span: None,
            src: None,
        };
        let out = render_error(&error);
        assert!(out.contains("pagesize"), "got: {out}");
        assert!(out.contains("recall::config::unknown_key"), "got: {out}");
    }
}
