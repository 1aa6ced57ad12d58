// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` opens a fully initialized [`SqliteStorage`] in a temp
//! directory and offers helpers to seed sessions with predictable content.

use std::path::PathBuf;
use std::sync::Arc;

use recall_config::model::{RecallConfig, StorageConfig};
use recall_core::types::Message;
use recall_core::{MetadataWriter, RecallError, StorageAdapter};
use recall_storage::SqliteStorage;

use crate::mock_metadata::MockMetadataWriter;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    mock_metadata: bool,
    wal_mode: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            mock_metadata: false,
            wal_mode: true,
        }
    }

    /// Route metadata through a [`MockMetadataWriter`] instead of SQLite.
    pub fn with_mock_metadata(mut self) -> Self {
        self.mock_metadata = true;
        self
    }

    /// Use a rollback journal instead of WAL.
    pub fn with_wal_mode(mut self, enabled: bool) -> Self {
        self.wal_mode = enabled;
        self
    }

    /// Build the test harness, creating and initializing the database.
    pub async fn build(self) -> Result<TestHarness, RecallError> {
        // Create temp directory for SQLite
        let temp_dir = tempfile::TempDir::new()
            .map_err(|e| RecallError::storage("failed to create temp dir", e))?;
        let db_path = temp_dir.path().join("test.db");

        let storage_config = StorageConfig {
            database_path: db_path.to_string_lossy().into_owned(),
            wal_mode: self.wal_mode,
            ..StorageConfig::default()
        };

        let mock_metadata = self.mock_metadata.then(MockMetadataWriter::new);
        let mut storage = SqliteStorage::new(storage_config.clone());
        if let Some(writer) = &mock_metadata {
            let writer: Arc<dyn MetadataWriter> = Arc::new(writer.clone());
            storage = storage.with_metadata_writer(writer);
        }
        storage.initialize().await?;

        let config = RecallConfig {
            storage: storage_config,
            ..RecallConfig::default()
        };

        Ok(TestHarness {
            storage: Arc::new(storage),
            mock_metadata,
            config,
            db_path,
            _temp_dir: temp_dir,
        })
    }
}

/// An initialized message store on a throwaway database.
pub struct TestHarness {
    /// SQLite storage adapter (temp DB, cleaned up on drop).
    pub storage: Arc<SqliteStorage>,
    /// Present when built with [`TestHarnessBuilder::with_mock_metadata`].
    pub mock_metadata: Option<MockMetadataWriter>,
    /// Configuration pointing at the temp database.
    pub config: RecallConfig,
    db_path: PathBuf,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// A harness with default settings.
    pub async fn new() -> Result<Self, RecallError> {
        Self::builder().build().await
    }

    pub fn db_path(&self) -> &std::path::Path {
        &self.db_path
    }

    /// Write `count` messages "msg 0".."msg N-1" to `session_id` in one batch,
    /// alternating user and assistant roles. Returns them with uuids assigned.
    pub async fn seed(&self, session_id: &str, count: usize) -> Result<Vec<Message>, RecallError> {
        self.storage
            .put_messages(session_id, numbered_messages(0..count))
            .await
    }

    /// Like [`TestHarness::seed`] but one write per message.
    pub async fn seed_one_by_one(
        &self,
        session_id: &str,
        count: usize,
    ) -> Result<Vec<Message>, RecallError> {
        let mut written = Vec::with_capacity(count);
        for i in 0..count {
            let batch = numbered_messages(i..i + 1);
            written.extend(self.storage.put_messages(session_id, batch).await?);
        }
        Ok(written)
    }

    /// Checkpoint and close the database.
    pub async fn close(self) -> Result<(), RecallError> {
        self.storage.close().await
    }
}

/// Messages "msg i" for each `i` in `range`, alternating user and assistant.
pub fn numbered_messages(range: std::ops::Range<usize>) -> Vec<Message> {
    range
        .map(|i| {
            let role = if i % 2 == 0 { "user" } else { "assistant" };
            Message::new(role, format!("msg {i}"))
        })
        .collect()
}

/// The contents of `messages`, in order.
pub fn contents(messages: &[Message]) -> Vec<String> {
    messages.iter().map(|m| m.content.clone()).collect()
}
