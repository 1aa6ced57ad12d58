// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subcommand implementations.
//!
//! Each command talks to a [`StorageAdapter`] and writes pretty JSON to the
//! given writer, so tests can run them against a temp database and a buffer.

use std::io::{Read, Write};

use recall_config::model::MemoryConfig;
use recall_core::types::{Message, Summary};
use recall_core::{RecallError, StorageAdapter};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

/// `recall put`: upsert a JSON array of messages read from `input`.
pub async fn run_put(
    storage: &dyn StorageAdapter,
    session_id: &str,
    input: impl Read,
    out: &mut dyn Write,
) -> Result<(), RecallError> {
    let messages: Vec<Message> = serde_json::from_reader(input)
        .map_err(|e| RecallError::Validation(format!("invalid message JSON: {e}")))?;
    let written = storage.put_messages(session_id, messages).await?;
    info!(session_id, count = written.len(), "messages written");
    write_json(out, &written)
}

/// `recall list`: one page of history, or `null` past the last page.
pub async fn run_list(
    storage: &dyn StorageAdapter,
    memory: &MemoryConfig,
    session_id: &str,
    page: usize,
    page_size: Option<usize>,
    out: &mut dyn Write,
) -> Result<(), RecallError> {
    let page_size = page_size.unwrap_or(memory.page_size);
    let list = storage.get_message_list(session_id, page, page_size).await?;
    write_json(out, &list)
}

/// `recall window`: the last N messages, or the window after a summary point.
pub async fn run_window(
    storage: &dyn StorageAdapter,
    memory: &MemoryConfig,
    session_id: &str,
    window: Option<usize>,
    last_n: usize,
    summary_point: Option<Uuid>,
    out: &mut dyn Write,
) -> Result<(), RecallError> {
    let window = window.unwrap_or(memory.message_window);
    let summary = summary_point.map(Summary::at);
    let messages = storage
        .get_messages(session_id, window, summary.as_ref(), last_n)
        .await?;
    write_json(out, &messages)
}

/// `recall lookup`: the session's messages with the given uuids.
pub async fn run_lookup(
    storage: &dyn StorageAdapter,
    session_id: &str,
    uuids: &[Uuid],
    out: &mut dyn Write,
) -> Result<(), RecallError> {
    let messages = storage.get_messages_by_uuid(session_id, uuids).await?;
    write_json(out, &messages)
}

fn write_json<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> Result<(), RecallError> {
    serde_json::to_writer_pretty(&mut *out, value)
        .map_err(|e| RecallError::Internal(format!("failed to write JSON output: {e}")))?;
    writeln!(out).map_err(|e| RecallError::Internal(format!("failed to write output: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use recall_test_utils::TestHarness;

    fn parse(buf: &[u8]) -> serde_json::Value {
        serde_json::from_slice(buf).unwrap()
    }

    #[tokio::test]
    async fn put_reads_json_and_echoes_written_messages() {
        let harness = TestHarness::new().await.unwrap();
        let input = br#"[{"role":"user","content":"hi"},{"role":"assistant","content":"hello"}]"#;
        let mut out = Vec::new();

        run_put(harness.storage.as_ref(), "cli", &input[..], &mut out)
            .await
            .unwrap();

        let written = parse(&out);
        let arr = written.as_array().unwrap();
        assert_eq!(arr.len(), 2);
        assert!(arr.iter().all(|m| m["uuid"].is_string()));
        assert_eq!(arr[1]["content"], "hello");
    }

    #[tokio::test]
    async fn put_rejects_malformed_input() {
        let harness = TestHarness::new().await.unwrap();
        let mut out = Vec::new();
        let err = run_put(harness.storage.as_ref(), "cli", &b"{not json"[..], &mut out)
            .await
            .unwrap_err();
        assert!(matches!(err, RecallError::Validation(_)), "got {err:?}");
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn list_uses_configured_page_size() {
        let harness = TestHarness::new().await.unwrap();
        harness.seed("cli", 5).await.unwrap();
        let memory = MemoryConfig {
            page_size: 2,
            ..MemoryConfig::default()
        };
        let mut out = Vec::new();

        run_list(harness.storage.as_ref(), &memory, "cli", 1, None, &mut out)
            .await
            .unwrap();

        let page = parse(&out);
        assert_eq!(page["total_count"], 5);
        assert_eq!(page["row_count"], 2);
    }

    #[tokio::test]
    async fn list_past_end_prints_null() {
        let harness = TestHarness::new().await.unwrap();
        let mut out = Vec::new();
        run_list(
            harness.storage.as_ref(),
            &MemoryConfig::default(),
            "empty",
            1,
            Some(10),
            &mut out,
        )
        .await
        .unwrap();
        assert_eq!(parse(&out), serde_json::Value::Null);
    }

    #[tokio::test]
    async fn window_after_summary_point() {
        let harness = TestHarness::new().await.unwrap();
        let written = harness.seed("cli", 6).await.unwrap();
        let mut out = Vec::new();

        run_window(
            harness.storage.as_ref(),
            &MemoryConfig::default(),
            "cli",
            Some(2),
            0,
            written[1].uuid,
            &mut out,
        )
        .await
        .unwrap();

        let window = parse(&out);
        let contents: Vec<_> = window
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["content"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(contents, vec!["msg 2", "msg 3"]);
    }

    #[tokio::test]
    async fn lookup_prints_matches() {
        let harness = TestHarness::new().await.unwrap();
        let written = harness.seed("cli", 3).await.unwrap();
        let mut out = Vec::new();

        run_lookup(
            harness.storage.as_ref(),
            "cli",
            &[written[2].uuid.unwrap()],
            &mut out,
        )
        .await
        .unwrap();

        let found = parse(&out);
        assert_eq!(found.as_array().unwrap().len(), 1);
        assert_eq!(found[0]["content"], "msg 2");
    }
}
