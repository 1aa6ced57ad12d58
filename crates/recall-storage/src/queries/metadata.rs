// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-message metadata writes.

use recall_core::RecallError;
use rusqlite::{OptionalExtension, Transaction, params};
use serde_json::Value;
use tracing::debug;

use crate::database::{Database, flatten_call_err};
use crate::models::{Message, Metadata, parse_metadata};

/// Top-level metadata key reserved for privileged writers.
pub const SYSTEM_KEY: &str = "system";

/// Merge each message's metadata into what is stored for it.
///
/// Runs in a single transaction: either every message's metadata is written
/// or none is. Messages with no metadata pass through untouched. Unless
/// `is_privileged`, the reserved [`SYSTEM_KEY`] is dropped from the incoming
/// metadata before merging.
pub async fn put_message_metadata(
    db: &Database,
    session_id: &str,
    messages: Vec<Message>,
    is_privileged: bool,
) -> Result<Vec<Message>, RecallError> {
    let key = session_id.to_string();
    let messages = db
        .connection()
        .call(move |conn| -> Result<Vec<Message>, RecallError> {
            let tx = conn
                .transaction()
                .map_err(|e| RecallError::storage("failed to begin metadata transaction", e))?;
            let mut out = Vec::with_capacity(messages.len());
            for mut msg in messages {
                if msg.metadata.as_ref().is_none_or(|m| m.is_empty()) {
                    out.push(msg);
                    continue;
                }
                let incoming = msg.metadata.take().unwrap_or_default();
                msg.metadata = Some(merge_into_row(&tx, &key, &msg, incoming, is_privileged)?);
                out.push(msg);
            }
            tx.commit()
                .map_err(|e| RecallError::storage("failed to commit message metadata", e))?;
            Ok(out)
        })
        .await
        .map_err(flatten_call_err)?;
    debug!(session_id, count = messages.len(), is_privileged, "message metadata stored");
    Ok(messages)
}

fn merge_into_row(
    tx: &Transaction<'_>,
    session_id: &str,
    msg: &Message,
    mut incoming: Metadata,
    is_privileged: bool,
) -> Result<Metadata, RecallError> {
    let Some(uuid) = msg.uuid else {
        return Err(RecallError::Validation(
            "message uuid is required to store metadata".into(),
        ));
    };
    let uuid = uuid.to_string();

    if !is_privileged {
        incoming.remove(SYSTEM_KEY);
    }

    let stored: Option<Option<String>> = tx
        .query_row(
            "SELECT metadata FROM messages WHERE session_id = ?1 AND uuid = ?2",
            params![session_id, uuid],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| RecallError::storage("failed to read message metadata", e))?;
    let Some(stored) = stored else {
        return Err(RecallError::NotFound {
            entity: "message",
            id: uuid,
        });
    };

    let mut merged = parse_metadata(stored.as_deref())
        .map_err(|e| RecallError::storage("stored message metadata is not a JSON object", e))?
        .unwrap_or_default();
    merge_metadata(&mut merged, incoming);

    let encoded = serde_json::to_string(&merged)
        .map_err(|e| RecallError::storage("failed to encode message metadata", e))?;
    tx.execute(
        "UPDATE messages
         SET metadata = ?1, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
         WHERE session_id = ?2 AND uuid = ?3",
        params![encoded, session_id, uuid],
    )
    .map_err(|e| RecallError::storage("failed to update message metadata", e))?;
    Ok(merged)
}

/// Deep-merge `patch` over `base`: objects merge key by key, anything else
/// replaces.
pub fn merge_metadata(base: &mut Metadata, patch: Metadata) {
    for (key, value) in patch {
        if let (Some(Value::Object(existing)), Value::Object(nested)) = (base.get_mut(&key), &value)
        {
            merge_metadata(existing, nested.clone());
            continue;
        }
        base.insert(key, value);
    }
}
