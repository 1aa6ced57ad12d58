// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Recall message store.

use thiserror::Error;

/// Boxed error used as the `source` of wrapped lower-level failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The primary error type used across all Recall adapter traits and core operations.
#[derive(Debug, Error)]
pub enum RecallError {
    /// Configuration errors surfaced at runtime (bad paths, unusable settings).
    #[error("configuration error: {0}")]
    Config(String),

    /// Invalid arguments, rejected before any query is issued.
    #[error("validation error: {0}")]
    Validation(String),

    /// A requested entity does not exist and no fallback applies.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A write was attempted against a session that has been soft-deleted.
    #[error("session {session_id} is deleted")]
    SessionDeleted { session_id: String },

    /// Storage backend errors (connection, query failure, constraint, serialization).
    #[error("storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RecallError {
    /// Wrap an underlying store failure with a context message.
    pub fn storage(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Storage {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// A storage error with no underlying cause.
    pub fn storage_msg(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            source: None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
