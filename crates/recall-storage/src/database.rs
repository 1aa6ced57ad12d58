// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All statements are serialized through tokio-rusqlite's single background
//! thread. Do NOT create additional Connection instances for writes.

use std::path::Path;

use recall_config::model::StorageConfig;
use recall_core::RecallError;
use tokio_rusqlite::Connection;
use tracing::info;

use crate::migrations;

/// Handle to the message database.
///
/// Cloning is cheap; every clone talks to the same background connection.
#[derive(Clone)]
pub struct Database {
    conn: Connection,
    path: String,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").field("path", &self.path).finish()
    }
}

impl Database {
    /// Open (or create) the database at `path` with default storage settings.
    pub async fn open(path: &str) -> Result<Self, RecallError> {
        let config = StorageConfig {
            database_path: path.to_string(),
            ..StorageConfig::default()
        };
        Self::open_with_config(&config).await
    }

    /// Open (or create) the database described by `config`, apply PRAGMAs,
    /// and run pending migrations.
    pub async fn open_with_config(config: &StorageConfig) -> Result<Self, RecallError> {
        let path = config.database_path.clone();
        if let Some(parent) = Path::new(&path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    RecallError::storage(
                        format!("failed to create database directory {}", parent.display()),
                        e,
                    )
                })?;
            }
        }

        let conn = Connection::open(&path)
            .await
            .map_err(|e| RecallError::storage(format!("failed to open database at {path}"), e))?;

        let pragmas = pragmas(config.wal_mode, config.busy_timeout_ms);
        conn.call(move |conn| -> Result<(), RecallError> {
            conn.execute_batch(&pragmas)
                .map_err(|e| RecallError::storage("failed to apply pragmas", e))?;
            migrations::run_migrations(conn)
        })
        .await
        .map_err(flatten_call_err)?;

        info!(path = %path, wal_mode = config.wal_mode, "database opened");
        Ok(Self { conn, path })
    }

    /// The background connection all queries go through.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Fold the WAL back into the main database file.
    pub async fn checkpoint(&self) -> Result<(), RecallError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err("failed to checkpoint WAL"))
    }

    /// Checkpoint the WAL and close the background connection.
    pub async fn close(self) -> Result<(), RecallError> {
        self.checkpoint().await?;
        self.conn
            .close()
            .await
            .map_err(|e| RecallError::storage("failed to close database", e))?;
        info!(path = %self.path, "database closed");
        Ok(())
    }
}

fn pragmas(wal_mode: bool, busy_timeout_ms: u64) -> String {
    let journal = if wal_mode { "WAL" } else { "DELETE" };
    format!(
        "PRAGMA journal_mode = {journal};
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = {busy_timeout_ms};
         PRAGMA synchronous = NORMAL;"
    )
}

/// Build a mapper from tokio-rusqlite errors to `RecallError::Storage` with context.
pub(crate) fn map_tr_err(
    message: &'static str,
) -> impl FnOnce(tokio_rusqlite::Error<rusqlite::Error>) -> RecallError {
    move |e| RecallError::storage(message, e)
}

/// Unwrap a `RecallError` raised inside a connection closure.
pub(crate) fn flatten_call_err(e: tokio_rusqlite::Error<RecallError>) -> RecallError {
    match e {
        tokio_rusqlite::Error::Error(inner) => inner,
        other => RecallError::storage_msg(format!("database connection failed: {other}")),
    }
}
