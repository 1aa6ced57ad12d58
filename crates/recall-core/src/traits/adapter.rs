// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base adapter trait that all pluggable backends implement.

use async_trait::async_trait;

use crate::error::RecallError;
use crate::types::{AdapterType, HealthStatus};

/// The base trait for all Recall adapters.
///
/// Provides identity, lifecycle, and health check capabilities shared by
/// storage backends and metadata writers.
#[async_trait]
pub trait PluginAdapter: Send + Sync + 'static {
    /// Returns the human-readable name of this adapter instance.
    fn name(&self) -> &str;

    /// Returns the semantic version of this adapter.
    fn version(&self) -> semver::Version;

    /// Returns the kind of adapter.
    fn adapter_type(&self) -> AdapterType;

    /// Performs a health check and returns the adapter's current status.
    async fn health_check(&self) -> Result<HealthStatus, RecallError>;

    /// Gracefully shuts down the adapter, releasing any held resources.
    async fn shutdown(&self) -> Result<(), RecallError>;
}
