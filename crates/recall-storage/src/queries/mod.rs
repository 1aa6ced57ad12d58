// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query functions. Each takes a [`Database`](crate::Database) and
//! runs its statements on the shared background connection.

pub mod messages;
pub mod metadata;
pub mod sessions;
