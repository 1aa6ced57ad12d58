// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Recall integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests against a throwaway SQLite database.
//!
//! # Components
//!
//! - [`TestHarness`] - Initialized storage in a temp directory, with seeding helpers
//! - [`MockMetadataWriter`] - Metadata writer that records calls and can inject failures

pub mod harness;
pub mod mock_metadata;

pub use harness::TestHarness;
pub use mock_metadata::{MetadataCall, MockMetadataWriter};
