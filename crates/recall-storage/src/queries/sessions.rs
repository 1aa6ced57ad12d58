// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session operations backing the [`SessionStore`](recall_core::SessionStore) DAO.

use recall_core::RecallError;
use rusqlite::{OptionalExtension, params};
use tracing::debug;

use crate::database::{Database, map_tr_err};
use crate::models::{SESSION_COLUMNS, Session, session_from_row};

/// Outcome of a touch on a session row.
enum Touch {
    Updated(Session),
    Deleted,
    Missing,
}

/// Create a new session. Fails if the session key is already taken.
pub async fn create_session(db: &Database, session_id: &str) -> Result<Session, RecallError> {
    let session_id = session_id.to_string();
    let session = db
        .connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "INSERT INTO sessions (session_id) VALUES (?1)
                     RETURNING {SESSION_COLUMNS}"
                ),
                params![session_id],
                session_from_row,
            )
        })
        .await
        .map_err(map_tr_err("failed to create session"))?;
    debug!(session_id = %session.session_id, "session created");
    Ok(session)
}

/// Get a session by key, including soft-deleted sessions.
pub async fn get_session(db: &Database, session_id: &str) -> Result<Option<Session>, RecallError> {
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE session_id = ?1"),
                params![session_id],
                session_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err("failed to get session"))
}

/// Touch a live session's `updated_at`.
///
/// `Ok(None)` when the session does not exist; [`RecallError::SessionDeleted`]
/// when it exists but has been soft-deleted.
pub async fn update_session(
    db: &Database,
    session_id: &str,
) -> Result<Option<Session>, RecallError> {
    let key = session_id.to_string();
    let touch = db
        .connection()
        .call(move |conn| {
            let updated = conn
                .query_row(
                    &format!(
                        "UPDATE sessions SET updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                         WHERE session_id = ?1 AND deleted_at IS NULL
                         RETURNING {SESSION_COLUMNS}"
                    ),
                    params![key],
                    session_from_row,
                )
                .optional()?;
            if let Some(session) = updated {
                return Ok(Touch::Updated(session));
            }
            let exists = conn
                .query_row(
                    "SELECT 1 FROM sessions WHERE session_id = ?1",
                    params![key],
                    |_| Ok(()),
                )
                .optional()?;
            Ok(match exists {
                Some(()) => Touch::Deleted,
                None => Touch::Missing,
            })
        })
        .await
        .map_err(map_tr_err("failed to update session"))?;

    match touch {
        Touch::Updated(session) => Ok(Some(session)),
        Touch::Missing => Ok(None),
        Touch::Deleted => Err(RecallError::SessionDeleted {
            session_id: session_id.to_string(),
        }),
    }
}

/// Soft-delete a live session.
pub async fn delete_session(db: &Database, session_id: &str) -> Result<(), RecallError> {
    let key = session_id.to_string();
    let affected = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE sessions
                 SET deleted_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now'),
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE session_id = ?1 AND deleted_at IS NULL",
                params![key],
            )
        })
        .await
        .map_err(map_tr_err("failed to delete session"))?;
    if affected == 0 {
        return Err(RecallError::NotFound {
            entity: "session",
            id: session_id.to_string(),
        });
    }
    debug!(session_id, "session deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn create_and_get_session_roundtrips() {
        let (db, _dir) = setup_db().await;

        let created = create_session(&db, "sess-1").await.unwrap();
        assert_eq!(created.session_id, "sess-1");
        assert!(!created.is_deleted());

        let retrieved = get_session(&db, "sess-1").await.unwrap().unwrap();
        assert_eq!(retrieved, created);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn duplicate_create_is_storage_error() {
        let (db, _dir) = setup_db().await;
        create_session(&db, "dup").await.unwrap();
        let err = create_session(&db, "dup").await.unwrap_err();
        assert!(matches!(err, RecallError::Storage { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn get_nonexistent_session_returns_none() {
        let (db, _dir) = setup_db().await;
        assert!(get_session(&db, "no-such-session").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_missing_session_returns_none() {
        let (db, _dir) = setup_db().await;
        assert!(update_session(&db, "ghost").await.unwrap().is_none());
        assert!(get_session(&db, "ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_touches_updated_at() {
        let (db, _dir) = setup_db().await;
        let created = create_session(&db, "s-upd").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        let touched = update_session(&db, "s-upd").await.unwrap().unwrap();
        assert_eq!(touched.created_at, created.created_at);
        assert!(touched.updated_at > created.updated_at);
    }

    #[tokio::test]
    async fn update_deleted_session_fails() {
        let (db, _dir) = setup_db().await;
        create_session(&db, "s-del").await.unwrap();
        delete_session(&db, "s-del").await.unwrap();

        let err = update_session(&db, "s-del").await.unwrap_err();
        assert!(
            matches!(err, RecallError::SessionDeleted { ref session_id } if session_id == "s-del"),
            "got {err:?}"
        );
        let stored = get_session(&db, "s-del").await.unwrap().unwrap();
        assert!(stored.is_deleted());
    }

    #[tokio::test]
    async fn delete_missing_session_is_not_found() {
        let (db, _dir) = setup_db().await;
        let err = delete_session(&db, "ghost").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
