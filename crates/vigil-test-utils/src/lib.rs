// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Vigil integration tests.
//!
//! Provides mock collaborators and a temp-database harness for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockCompletion`] - scripted text-completion provider with a call counter
//! - [`MockPushSender`] - push sender that captures messages and fails chosen tokens
//! - [`FaultyStore`] - store wrapper that injects failures into chosen operations
//! - [`TestStore`] - SQLite store in a temp directory with seeding helpers

pub mod faulty_store;
pub mod harness;
pub mod mock_completion;
pub mod mock_push;

pub use faulty_store::{FaultyStore, StoreOp};
pub use harness::TestStore;
pub use mock_completion::MockCompletion;
pub use mock_push::MockPushSender;
