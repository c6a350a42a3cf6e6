// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scheduled daily-notification dispatch for Vigil.
//!
//! [`Dispatcher`] performs one run over every user; [`DispatchScheduler`]
//! drives it from a cron expression evaluated in UTC and refuses to start a
//! run while the previous one is still executing.

pub mod dispatcher;
pub mod scheduler;
pub mod window;

pub use dispatcher::{DispatchReport, Dispatcher};
pub use scheduler::DispatchScheduler;
