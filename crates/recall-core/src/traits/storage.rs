// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for message-history backends.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::RecallError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Message, MessageListResponse, Summary};

/// Adapter for message-history persistence.
///
/// Messages are ordered per session by a store-assigned sequence number.
/// Every read returns messages in ascending sequence order unless noted.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), RecallError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), RecallError>;

    /// Upserts a batch of messages, creating the session if needed.
    ///
    /// Returns the batch with identifiers resolved and metadata applied.
    /// An empty batch is a no-op.
    async fn put_messages(
        &self,
        session_id: &str,
        messages: Vec<Message>,
    ) -> Result<Vec<Message>, RecallError>;

    /// Returns one page of the session's history plus the total count.
    ///
    /// `Ok(None)` means the page is empty.
    async fn get_message_list(
        &self,
        session_id: &str,
        page: usize,
        page_size: usize,
    ) -> Result<Option<MessageListResponse>, RecallError>;

    /// Fetches specific messages of a session. Order is unspecified.
    async fn get_messages_by_uuid(
        &self,
        session_id: &str,
        uuids: &[Uuid],
    ) -> Result<Vec<Message>, RecallError>;

    /// Returns a bounded window of recent messages.
    ///
    /// With `last_n > 0` the last `last_n` messages are returned. Otherwise
    /// up to `memory_window` messages following the summary point (or from
    /// the start of the session) are returned. `Ok(None)` means no messages.
    async fn get_messages(
        &self,
        session_id: &str,
        memory_window: usize,
        summary: Option<&Summary>,
        last_n: usize,
    ) -> Result<Option<Vec<Message>>, RecallError>;
}
