// SPDX-FileCopyrightText: 2026 Pitwall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite durable store for Pitwall.
//!
//! Holds the usage event log that rate limiting treats as its source of
//! truth, plus the persistent copy of the knowledge corpus. WAL-mode SQLite
//! with embedded migrations and a single-writer model via `tokio-rusqlite`.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use adapter::SqliteStore;
pub use database::Database;
