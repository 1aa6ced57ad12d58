// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session DAO consumed by the message writer.

use async_trait::async_trait;

use crate::error::RecallError;
use crate::types::Session;

/// Minimal session persistence needed before messages can be written.
///
/// Absence is reported as `Ok(None)` rather than an error so that each
/// caller decides its own fallback.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Creates a session. Fails if the key is already taken.
    async fn create_session(&self, session_id: &str) -> Result<Session, RecallError>;

    /// Touches a session's `updated_at`.
    ///
    /// Returns `Ok(None)` when no such session exists and
    /// [`RecallError::SessionDeleted`] when it exists but is soft-deleted.
    async fn update_session(&self, session_id: &str) -> Result<Option<Session>, RecallError>;

    /// Fetches a session, including soft-deleted ones.
    async fn get_session(&self, session_id: &str) -> Result<Option<Session>, RecallError>;

    /// Soft-deletes a session.
    async fn delete_session(&self, session_id: &str) -> Result<(), RecallError>;
}
