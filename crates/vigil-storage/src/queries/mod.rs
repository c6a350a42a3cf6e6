// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules, one per table.

pub mod conversations;
pub mod customers;
pub mod devices;
pub mod quotes;
pub mod users;
