// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request-path services for the Vigil backend.
//!
//! Everything a client call touches lives here: the premium entitlement
//! check, the free-tier message gate, the quote generator shared with the
//! dispatcher, the chat processor, the history reader and the device
//! registry. Services hold `Arc`s to their collaborators and are cheap to
//! share across request handlers.

pub mod devices;
pub mod entitlement;
pub mod history;
pub mod limits;
pub mod processor;
pub mod quote;

pub use devices::DeviceRegistry;
pub use entitlement::EntitlementChecker;
pub use history::HistoryReader;
pub use limits::MessageLimiter;
pub use processor::{ChatProcessor, ChatReply, RATE_LIMIT_MESSAGE};
pub use quote::{FALLBACK_QUOTE, QuoteGenerator};
