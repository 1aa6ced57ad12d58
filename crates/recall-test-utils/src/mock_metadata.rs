// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock metadata writer for deterministic testing.
//!
//! `MockMetadataWriter` implements `MetadataWriter` without touching the
//! database, recording every call so tests can assert on how the message
//! store delegates to it.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use recall_core::RecallError;
use recall_core::traits::adapter::PluginAdapter;
use recall_core::traits::metadata::MetadataWriter;
use recall_core::types::{AdapterType, HealthStatus, Message};

/// One recorded `put_message_metadata` call.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataCall {
    pub session_id: String,
    pub messages: Vec<Message>,
    pub is_privileged: bool,
}

/// A metadata writer that returns messages unchanged and records each call.
///
/// Failures are popped from a FIFO queue; while it is empty every call
/// succeeds.
#[derive(Clone, Default)]
pub struct MockMetadataWriter {
    calls: Arc<Mutex<Vec<MetadataCall>>>,
    failures: Arc<Mutex<VecDeque<String>>>,
}

impl MockMetadataWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call fail with `RecallError::Internal(message)`.
    pub async fn fail_next(&self, message: impl Into<String>) {
        self.failures.lock().await.push_back(message.into());
    }

    /// All calls received so far, in order.
    pub async fn calls(&self) -> Vec<MetadataCall> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }
}

#[async_trait]
impl PluginAdapter for MockMetadataWriter {
    fn name(&self) -> &str {
        "mock-metadata"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Metadata
    }

    async fn health_check(&self) -> Result<HealthStatus, RecallError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), RecallError> {
        Ok(())
    }
}

#[async_trait]
impl MetadataWriter for MockMetadataWriter {
    async fn put_message_metadata(
        &self,
        session_id: &str,
        messages: Vec<Message>,
        is_privileged: bool,
    ) -> Result<Vec<Message>, RecallError> {
        self.calls.lock().await.push(MetadataCall {
            session_id: session_id.to_string(),
            messages: messages.clone(),
            is_privileged,
        });
        if let Some(message) = self.failures.lock().await.pop_front() {
            return Err(RecallError::Internal(message));
        }
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_calls_and_passes_messages_through() {
        let writer = MockMetadataWriter::new();
        let out = writer
            .put_message_metadata("s", vec![Message::new("user", "hi")], false)
            .await
            .unwrap();
        assert_eq!(out, vec![Message::new("user", "hi")]);

        let calls = writer.calls().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].session_id, "s");
        assert!(!calls[0].is_privileged);
    }

    #[tokio::test]
    async fn queued_failure_fires_once() {
        let writer = MockMetadataWriter::new();
        writer.fail_next("boom").await;

        let err = writer.put_message_metadata("s", vec![], false).await.unwrap_err();
        assert!(matches!(err, RecallError::Internal(ref m) if m == "boom"));
        assert!(writer.put_message_metadata("s", vec![], false).await.is_ok());
        assert_eq!(writer.call_count().await, 2);
    }

    #[test]
    fn identifies_as_metadata_adapter() {
        let writer = MockMetadataWriter::new();
        assert_eq!(writer.name(), "mock-metadata");
        assert_eq!(writer.adapter_type(), AdapterType::Metadata);
    }
}
