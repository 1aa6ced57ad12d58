// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! Backends extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod metadata;
pub mod session;
pub mod storage;

pub use adapter::PluginAdapter;
pub use metadata::MetadataWriter;
pub use session::SessionStore;
pub use storage::StorageAdapter;
