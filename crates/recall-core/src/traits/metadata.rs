// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-message metadata persistence.

use async_trait::async_trait;

use crate::error::RecallError;
use crate::traits::adapter::PluginAdapter;
use crate::types::Message;

/// Persists and enriches per-message metadata after messages are written.
///
/// Non-privileged callers may not set the reserved `system` metadata key.
#[async_trait]
pub trait MetadataWriter: PluginAdapter {
    /// Stores the metadata carried on `messages` and returns the messages
    /// with their resulting metadata.
    ///
    /// Every message must already carry its identifier.
    async fn put_message_metadata(
        &self,
        session_id: &str,
        messages: Vec<Message>,
        is_privileged: bool,
    ) -> Result<Vec<Message>, RecallError>;
}
