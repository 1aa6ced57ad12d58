// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;
use uuid::Uuid;

use recall_config::model::StorageConfig;
use recall_core::types::{Message, MessageListResponse, Session, Summary};
use recall_core::{
    AdapterType, HealthStatus, MetadataWriter, PluginAdapter, RecallError, SessionStore,
    StorageAdapter,
};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is lazily initialized on the first
/// call to [`StorageAdapter::initialize`].
///
/// The adapter is its own [`SessionStore`], and its own [`MetadataWriter`]
/// unless another one is supplied with [`SqliteStorage::with_metadata_writer`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
    metadata_writer: Option<Arc<dyn MetadataWriter>>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until [`initialize`] is called.
    ///
    /// [`initialize`]: StorageAdapter::initialize
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
            metadata_writer: None,
        }
    }

    /// Route message metadata through `writer` instead of this adapter.
    pub fn with_metadata_writer(mut self, writer: Arc<dyn MetadataWriter>) -> Self {
        self.metadata_writer = Some(writer);
        self
    }

    /// Returns a reference to the underlying Database, or an error if not initialized.
    pub fn database(&self) -> Result<&Database, RecallError> {
        const NOT_INITIALIZED: &str = "storage not initialized, call initialize() first";
        self.db.get().ok_or_else(|| RecallError::storage_msg(NOT_INITIALIZED))
    }

    fn metadata_writer(&self) -> &dyn MetadataWriter {
        match &self.metadata_writer {
            Some(writer) => writer.as_ref(),
            None => self,
        }
    }

    fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.config.query_timeout_secs)
    }

    /// Run `fut` under the configured query timeout.
    async fn bounded<T, F>(&self, fut: F) -> Result<T, RecallError>
    where
        F: Future<Output = Result<T, RecallError>>,
    {
        let duration = self.query_timeout();
        tokio::time::timeout(duration, fut)
            .await
            .map_err(|_| RecallError::Timeout { duration })?
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, RecallError> {
        let Some(db) = self.db.get() else {
            return Ok(HealthStatus::Unhealthy("storage not initialized".to_string()));
        };
        let probe = db
            .connection()
            .call(|conn| -> Result<String, rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))
            })
            .await
            .map_err(map_tr_err("health check failed"));

        match probe {
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
            // Still serving, but without the concurrency WAL was asked for.
            Ok(mode) if self.config.wal_mode && !mode.eq_ignore_ascii_case("wal") => {
                Ok(HealthStatus::Degraded(format!("journal_mode is {mode}, expected wal")))
            }
            Ok(_) => Ok(HealthStatus::Healthy),
        }
    }

    async fn shutdown(&self) -> Result<(), RecallError> {
        // Nothing to flush if the database was never opened.
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), RecallError> {
        let db = Database::open_with_config(&self.config).await?;
        self.db
            .set(db)
            .map_err(|_| RecallError::storage_msg("storage already initialized"))?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), RecallError> {
        let db = self.database()?;
        db.clone().close().await?;
        debug!("storage closed");
        Ok(())
    }

    async fn put_messages(
        &self,
        session_id: &str,
        messages: Vec<Message>,
    ) -> Result<Vec<Message>, RecallError> {
        let db = self.database()?;
        self.bounded(queries::messages::put_messages(
            db,
            self,
            self.metadata_writer(),
            session_id,
            messages,
        ))
        .await
    }

    async fn get_message_list(
        &self,
        session_id: &str,
        page: usize,
        page_size: usize,
    ) -> Result<Option<MessageListResponse>, RecallError> {
        let db = self.database()?;
        let list = queries::messages::get_message_list(db, session_id, page, page_size);
        self.bounded(list).await
    }

    async fn get_messages_by_uuid(
        &self,
        session_id: &str,
        uuids: &[Uuid],
    ) -> Result<Vec<Message>, RecallError> {
        let db = self.database()?;
        let lookup = queries::messages::get_messages_by_uuid(db, session_id, uuids);
        self.bounded(lookup).await
    }

    async fn get_messages(
        &self,
        session_id: &str,
        memory_window: usize,
        summary: Option<&Summary>,
        last_n: usize,
    ) -> Result<Option<Vec<Message>>, RecallError> {
        let db = self.database()?;
        let read = queries::messages::get_messages(db, session_id, memory_window, summary, last_n);
        self.bounded(read).await
    }
}

#[async_trait]
impl SessionStore for SqliteStorage {
    async fn create_session(&self, session_id: &str) -> Result<Session, RecallError> {
        queries::sessions::create_session(self.database()?, session_id).await
    }

    async fn update_session(&self, session_id: &str) -> Result<Option<Session>, RecallError> {
        queries::sessions::update_session(self.database()?, session_id).await
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<Session>, RecallError> {
        queries::sessions::get_session(self.database()?, session_id).await
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), RecallError> {
        queries::sessions::delete_session(self.database()?, session_id).await
    }
}

#[async_trait]
impl MetadataWriter for SqliteStorage {
    async fn put_message_metadata(
        &self,
        session_id: &str,
        messages: Vec<Message>,
        is_privileged: bool,
    ) -> Result<Vec<Message>, RecallError> {
        queries::metadata::put_message_metadata(
            self.database()?,
            session_id,
            messages,
            is_privileged,
        )
        .await
    }
}
