// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message writes and the three read paths: paged history, identifier
//! lookup, and bounded windows (last N, or everything after the summary
//! point).
//!
//! The `messages.id` sequence number is the only ordering key. Reads make no
//! attempt at snapshot consistency across statements: the total count and the
//! page in [`get_message_list`] are separate round trips, as are the session
//! check and the upsert in [`put_messages`].

use recall_core::{MetadataWriter, RecallError, SessionStore};
use rusqlite::types::Value;
use rusqlite::{OptionalExtension, params, params_from_iter};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::database::{Database, map_tr_err};
use crate::models::{MESSAGE_COLUMNS, Message, MessageListResponse, MessageRow, Summary};

/// Rows per INSERT statement; keeps bound parameters well under SQLite's limit.
const UPSERT_CHUNK_ROWS: usize = 500;
const UPSERT_COLUMNS: usize = 5;

/// A message ready to be written, with its identifier resolved.
struct PendingRow {
    uuid: Uuid,
    role: String,
    content: String,
    token_count: i64,
}

/// Store new messages or update existing ones for a session.
///
/// Existing messages are matched by uuid. The session is created if it does
/// not exist; a soft-deleted session fails the whole write before any
/// message is touched. Metadata is handed to `metadata_writer` after the
/// upsert, and its result is returned.
pub async fn put_messages(
    db: &Database,
    sessions: &dyn SessionStore,
    metadata_writer: &dyn MetadataWriter,
    session_id: &str,
    mut messages: Vec<Message>,
) -> Result<Vec<Message>, RecallError> {
    if messages.is_empty() {
        warn!(session_id, "put_messages called with no messages");
        return Ok(Vec::new());
    }
    require_session_id(session_id)?;
    debug!(session_id, count = messages.len(), "putting messages");

    ensure_session(sessions, session_id).await?;

    let rows: Vec<PendingRow> = messages
        .iter()
        .map(|msg| PendingRow {
            uuid: msg.uuid.unwrap_or_else(Uuid::new_v4),
            role: msg.role.clone(),
            content: msg.content.clone(),
            token_count: msg.token_count,
        })
        .collect();
    let uuids: Vec<Uuid> = rows.iter().map(|row| row.uuid).collect();

    upsert_rows(db, session_id, rows).await?;

    // New messages only learn their identifier here.
    for (msg, uuid) in messages.iter_mut().zip(uuids) {
        msg.uuid = Some(uuid);
    }

    // Called on behalf of an ordinary writer, never with elevated rights.
    let messages = metadata_writer
        .put_message_metadata(session_id, messages, false)
        .await?;

    debug!(session_id, count = messages.len(), "put_messages completed");
    Ok(messages)
}

/// Touch the session, creating it when the touch finds nothing.
async fn ensure_session(sessions: &dyn SessionStore, session_id: &str) -> Result<(), RecallError> {
    match sessions.update_session(session_id).await? {
        Some(_) => Ok(()),
        None => {
            debug!(session_id, "session not found, creating");
            sessions.create_session(session_id).await?;
            Ok(())
        }
    }
}

async fn upsert_rows(
    db: &Database,
    session_id: &str,
    rows: Vec<PendingRow>,
) -> Result<(), RecallError> {
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            for chunk in rows.chunks(UPSERT_CHUNK_ROWS) {
                let mut values = Vec::with_capacity(chunk.len() * UPSERT_COLUMNS);
                for row in chunk {
                    values.push(Value::Text(row.uuid.to_string()));
                    values.push(Value::Text(session_id.clone()));
                    values.push(Value::Text(row.role.clone()));
                    values.push(Value::Text(row.content.clone()));
                    values.push(Value::Integer(row.token_count));
                }
                tx.execute(&upsert_sql(chunk.len()), params_from_iter(values))?;
            }
            tx.commit()
        })
        .await
        .map_err(map_tr_err("failed to create messages"))
}

/// Multi-row upsert keyed on uuid. Metadata is deliberately absent from the
/// column list; it is owned by the metadata writer.
fn upsert_sql(rows: usize) -> String {
    let placeholders = (0..rows)
        .map(|i| {
            let base = i * UPSERT_COLUMNS;
            format!(
                "(?{}, ?{}, ?{}, ?{}, ?{})",
                base + 1,
                base + 2,
                base + 3,
                base + 4,
                base + 5
            )
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO messages (uuid, session_id, role, content, token_count)
         VALUES {placeholders}
         ON CONFLICT (uuid) DO UPDATE SET
             session_id = excluded.session_id,
             role = excluded.role,
             content = excluded.content,
             token_count = excluded.token_count,
             updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')"
    )
}

/// Get one page of a session's messages in ascending order, plus the
/// session's total message count.
///
/// `Ok(None)` when the requested page holds no messages. Pages are 1-based;
/// page 0 is treated as page 1.
pub async fn get_message_list(
    db: &Database,
    session_id: &str,
    page: usize,
    page_size: usize,
) -> Result<Option<MessageListResponse>, RecallError> {
    require_session_id(session_id)?;
    if page_size < 1 {
        return Err(RecallError::Validation(
            "page_size must be greater than 0".to_string(),
        ));
    }

    debug!(session_id, page, page_size, "getting message list");

    let total_count = count_messages(db, session_id).await?;

    let offset = to_sql_int(page.saturating_sub(1).saturating_mul(page_size));
    let limit = to_sql_int(page_size);
    let key = session_id.to_string();
    let rows = db
        .connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages
                 WHERE session_id = ?1
                 ORDER BY id ASC
                 LIMIT ?2 OFFSET ?3"
            ))?;
            let rows = stmt
                .query_map(params![key, limit, offset], MessageRow::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
        .map_err(map_tr_err("failed to get messages"))?;

    if rows.is_empty() {
        return Ok(None);
    }

    let messages: Vec<Message> = rows.into_iter().map(Message::from).collect();
    Ok(Some(MessageListResponse {
        row_count: messages.len(),
        total_count,
        messages,
    }))
}

async fn count_messages(db: &Database, session_id: &str) -> Result<i64, RecallError> {
    let key = session_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM messages WHERE session_id = ?1",
                params![key],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err("failed to get message count"))
}

/// Get the messages of a session with the given uuids. Order is unspecified
/// and uuids belonging to other sessions are ignored.
pub async fn get_messages_by_uuid(
    db: &Database,
    session_id: &str,
    uuids: &[Uuid],
) -> Result<Vec<Message>, RecallError> {
    require_session_id(session_id)?;
    if uuids.is_empty() {
        return Ok(Vec::new());
    }

    let mut values = Vec::with_capacity(uuids.len() + 1);
    values.push(Value::Text(session_id.to_string()));
    values.extend(uuids.iter().map(|uuid| Value::Text(uuid.to_string())));

    let rows = db
        .connection()
        .call(move |conn| {
            let placeholders: Vec<String> = (2..=values.len()).map(|i| format!("?{i}")).collect();
            let sql = format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages WHERE session_id = ?1 AND uuid IN ({})",
                placeholders.join(", ")
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(values), MessageRow::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
        .map_err(map_tr_err("unable to retrieve messages"))?;

    Ok(rows.into_iter().map(Message::from).collect())
}

/// Get a bounded window of a session's messages in ascending order.
///
/// With `last_n > 0` this is the last `last_n` messages. Otherwise it is up
/// to `memory_window` messages after the summary point, or from the start of
/// the session when there is no summary or its summary point no longer
/// exists. `memory_window` must be positive in both modes.
///
/// `Ok(None)` when no messages match.
pub async fn get_messages(
    db: &Database,
    session_id: &str,
    memory_window: usize,
    summary: Option<&Summary>,
    last_n: usize,
) -> Result<Option<Vec<Message>>, RecallError> {
    require_session_id(session_id)?;
    if memory_window == 0 {
        return Err(RecallError::Validation(
            "memory.message_window must be greater than 0".to_string(),
        ));
    }

    debug!(session_id, memory_window, last_n, has_summary = summary.is_some(), "getting messages");

    let rows = if last_n > 0 {
        fetch_last_n_messages(db, session_id, last_n).await?
    } else {
        fetch_messages_after_summary_point(db, session_id, summary, memory_window).await?
    };
    if rows.is_empty() {
        return Ok(None);
    }

    Ok(Some(rows.into_iter().map(Message::from).collect()))
}

/// Up to `memory_window` messages following the summary point, ascending.
async fn fetch_messages_after_summary_point(
    db: &Database,
    session_id: &str,
    summary: Option<&Summary>,
    memory_window: usize,
) -> Result<Vec<MessageRow>, RecallError> {
    let summary_point_index = match summary {
        Some(summary) => {
            get_summary_point_index(db, session_id, summary.summary_point_uuid).await?
        }
        None => 0,
    };

    let key = session_id.to_string();
    let limit = to_sql_int(memory_window);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages
                 WHERE session_id = ?1 AND id > ?2
                 ORDER BY id ASC
                 LIMIT ?3"
            ))?;
            let rows = stmt
                .query_map(
                    params![key, summary_point_index, limit],
                    MessageRow::from_row,
                )?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
        .map_err(map_tr_err("failed to get messages"))
}

/// The last `last_n` messages, read newest-first and flipped to ascending.
async fn fetch_last_n_messages(
    db: &Database,
    session_id: &str,
    last_n: usize,
) -> Result<Vec<MessageRow>, RecallError> {
    let key = session_id.to_string();
    let limit = to_sql_int(last_n);
    let mut rows = db
        .connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages
                 WHERE session_id = ?1
                 ORDER BY id DESC
                 LIMIT ?2"
            ))?;
            let rows = stmt
                .query_map(params![key, limit], MessageRow::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
        .map_err(map_tr_err("failed to get messages"))?;
    rows.reverse();
    Ok(rows)
}

/// Resolve the sequence number of a session's summary point.
///
/// Message uuids are not orderable, so windows are cut on the sequence
/// number of the marked message instead. A marker that no longer exists
/// (for example, because the message was deleted) resolves to 0, which reads
/// from the start of the session.
pub async fn get_summary_point_index(
    db: &Database,
    session_id: &str,
    summary_point_uuid: Uuid,
) -> Result<i64, RecallError> {
    let key = session_id.to_string();
    let marker = summary_point_uuid.to_string();
    let index: Option<i64> = db
        .connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT id FROM messages WHERE session_id = ?1 AND uuid = ?2",
                params![key, marker],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err("unable to retrieve last summary point"))?;

    match index {
        Some(index) => Ok(index),
        None => {
            warn!(
                session_id,
                summary_point_uuid = %summary_point_uuid,
                "unable to retrieve last summary point, reading from start of session"
            );
            Ok(0)
        }
    }
}

fn require_session_id(session_id: &str) -> Result<(), RecallError> {
    if session_id.is_empty() {
        return Err(RecallError::Validation(
            "session_id cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn to_sql_int(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
