// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Vigil backend.
//!
//! Provides WAL-mode SQLite storage with embedded migrations and a
//! single-writer concurrency model via `tokio-rusqlite`. All writes are
//! serialized through one background thread, so counter and badge updates
//! are single SQL statements and the daily-quote dedup runs as one
//! transaction.

pub mod adapter;
pub mod database;
mod migrations;
pub mod queries;

pub use adapter::SqliteStore;
pub use database::Database;
