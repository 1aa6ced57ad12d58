// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage row types and column decoding.
//!
//! The canonical domain types live in `recall-core::types`; this module
//! adds the row shape of the `messages` table, which carries the
//! store-assigned sequence number the domain type does not expose.

use chrono::{DateTime, Utc};
use rusqlite::Row;
use rusqlite::types::Type;
use uuid::Uuid;

pub use recall_core::types::{Message, MessageListResponse, Metadata, Session, Summary};

/// Column list matching [`MessageRow::from_row`].
pub(crate) const MESSAGE_COLUMNS: &str = "id, uuid, session_id, role, content, token_count, \
     metadata, created_at, updated_at, deleted_at";

/// Column list matching [`session_from_row`].
pub(crate) const SESSION_COLUMNS: &str =
    "session_id, metadata, created_at, updated_at, deleted_at";

/// One row of the `messages` table.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageRow {
    /// Store-assigned sequence number; the ordering key for all windows.
    pub id: i64,
    pub uuid: Uuid,
    pub session_id: String,
    pub role: String,
    pub content: String,
    pub token_count: i64,
    pub metadata: Option<Metadata>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl MessageRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            uuid: uuid_column(row, 1)?,
            session_id: row.get(2)?,
            role: row.get(3)?,
            content: row.get(4)?,
            token_count: row.get(5)?,
            metadata: metadata_column(row, 6)?,
            created_at: timestamp_column(row, 7)?,
            updated_at: timestamp_column(row, 8)?,
            deleted_at: optional_timestamp_column(row, 9)?,
        })
    }
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Self {
            uuid: Some(row.uuid),
            created_at: Some(row.created_at),
            role: row.role,
            content: row.content,
            token_count: row.token_count,
            metadata: row.metadata,
        }
    }
}

pub(crate) fn session_from_row(row: &Row<'_>) -> rusqlite::Result<Session> {
    Ok(Session {
        session_id: row.get(0)?,
        metadata: metadata_column(row, 1)?,
        created_at: timestamp_column(row, 2)?,
        updated_at: timestamp_column(row, 3)?,
        deleted_at: optional_timestamp_column(row, 4)?,
    })
}

fn conversion_err(
    idx: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

fn uuid_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw).map_err(|e| conversion_err(idx, e))
}

pub(crate) fn parse_metadata(raw: Option<&str>) -> Result<Option<Metadata>, serde_json::Error> {
    match raw {
        None | Some("") => Ok(None),
        Some(text) => serde_json::from_str(text).map(Some),
    }
}

fn metadata_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Metadata>> {
    let raw: Option<String> = row.get(idx)?;
    parse_metadata(raw.as_deref()).map_err(|e| conversion_err(idx, e))
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|ts| ts.with_timezone(&Utc))
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_timestamp(&raw).map_err(|e| conversion_err(idx, e))
}

fn optional_timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.as_deref()
        .map(parse_timestamp)
        .transpose()
        .map_err(|e| conversion_err(idx, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_timestamps_parse() {
        let ts = parse_timestamp("2026-01-01T00:00:01.250Z").unwrap();
        assert_eq!(ts.timestamp_millis() % 1000, 250);
    }

    #[test]
    fn empty_metadata_is_none() {
        assert_eq!(parse_metadata(None).unwrap(), None);
        assert_eq!(parse_metadata(Some("")).unwrap(), None);
        let parsed = parse_metadata(Some(r#"{"a":1}"#)).unwrap().unwrap();
        assert_eq!(parsed["a"], 1);
        assert!(parse_metadata(Some("[1,2]")).is_err());
    }

    #[test]
    fn row_converts_to_message() {
        let uuid = Uuid::new_v4();
        let now = Utc::now();
        let row = MessageRow {
            id: 7,
            uuid,
            session_id: "s".into(),
            role: "user".into(),
            content: "hi".into(),
            token_count: 3,
            metadata: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let msg = Message::from(row);
        assert_eq!(msg.uuid, Some(uuid));
        assert_eq!(msg.created_at, Some(now));
        assert_eq!(msg.token_count, 3);
    }
}
