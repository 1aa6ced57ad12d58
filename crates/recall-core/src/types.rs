// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the adapter traits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Free-form JSON object attached to messages and sessions.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A single conversational turn.
///
/// `uuid` is `None` on input when the store should assign the identifier.
/// Every message read back from the store carries `Some`. The store-owned
/// sequence number is not exposed here; ordering is implied by position in
/// the returned list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub token_count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl Message {
    /// A new message with no identifier, leaving assignment to the store.
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_uuid(mut self, uuid: Uuid) -> Self {
        self.uuid = Some(uuid);
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// A prior summarization of a session, produced outside this crate.
///
/// Only `summary_point_uuid` is consumed by the message store: it marks the
/// last message already folded into the summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub content: String,
    pub summary_point_uuid: Uuid,
    #[serde(default)]
    pub token_count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl Summary {
    /// A summary whose summary point is the given message.
    pub fn at(summary_point_uuid: Uuid) -> Self {
        Self {
            uuid: None,
            created_at: None,
            content: String::new(),
            summary_point_uuid,
            token_count: 0,
            metadata: None,
        }
    }
}

/// A conversation thread owning an ordered message log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// One page of a session's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageListResponse {
    pub messages: Vec<Message>,
    /// Messages in the session at the time of the count query.
    pub total_count: i64,
    /// Messages in this page.
    pub row_count: usize,
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Metadata,
}
