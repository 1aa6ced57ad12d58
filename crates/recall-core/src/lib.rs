// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Recall message store.
//!
//! This crate provides the trait definitions, error type, and domain types
//! used throughout the Recall workspace. Storage backends and metadata
//! writers implement the traits defined here.

pub mod error;
pub mod traits;
pub mod types;

pub use error::RecallError;
pub use types::{
    AdapterType, HealthStatus, Message, MessageListResponse, Metadata, Session, Summary,
};

pub use traits::{MetadataWriter, PluginAdapter, SessionStore, StorageAdapter};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_error_keeps_source() {
        let err = RecallError::storage(
            "failed to get messages",
            std::io::Error::other("disk gone"),
        );
        assert_eq!(err.to_string(), "storage error: failed to get messages");
        let source = std::error::Error::source(&err).expect("source should be kept");
        assert_eq!(source.to_string(), "disk gone");

        let bare = RecallError::storage_msg("no cause");
        assert!(std::error::Error::source(&bare).is_none());
    }

    #[test]
    fn not_found_is_detectable() {
        let err = RecallError::NotFound {
            entity: "session",
            id: "s1".into(),
        };
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "session not found: s1");
        assert!(!RecallError::Validation("x".into()).is_not_found());
    }

    #[test]
    fn adapter_type_display_round_trips() {
        use std::str::FromStr;

        for variant in [AdapterType::Storage, AdapterType::Metadata] {
            let parsed = AdapterType::from_str(&variant.to_string()).expect("should parse back");
            assert_eq!(variant, parsed);
        }
    }

    #[test]
    fn message_without_uuid_omits_it_in_json() {
        let msg = Message::new("user", "hello");
        let json = serde_json::to_value(&msg).unwrap();
        assert!(json.get("uuid").is_none());
        assert_eq!(json["role"], "user");
        assert_eq!(json["token_count"], 0);
    }

    #[test]
    fn message_deserializes_with_defaults() {
        let msg: Message =
            serde_json::from_str(r#"{"role":"assistant","content":"hi"}"#).unwrap();
        assert_eq!(msg.uuid, None);
        assert_eq!(msg.token_count, 0);
        assert_eq!(msg.metadata, None);
    }

    #[test]
    fn session_deleted_flag() {
        let now = chrono::Utc::now();
        let mut session = Session {
            session_id: "s".into(),
            metadata: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        assert!(!session.is_deleted());
        session.deleted_at = Some(now);
        assert!(session.is_deleted());
    }

    #[test]
    fn all_traits_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_storage_adapter<T: StorageAdapter>() {}
        fn _assert_session_store<T: SessionStore>() {}
        fn _assert_metadata_writer<T: MetadataWriter>() {}
    }
}
