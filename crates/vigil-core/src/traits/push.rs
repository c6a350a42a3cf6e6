// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Push notification sender trait.

use async_trait::async_trait;

use crate::error::PushError;
use crate::types::PushMessage;

/// Delivers a single push notification to one device.
#[async_trait]
pub trait PushSender: Send + Sync {
    /// Sends `message` and returns the provider's message id.
    ///
    /// A permanently invalid token must surface as
    /// [`PushError::TokenNotRegistered`] so callers can prune the device.
    async fn send(&self, message: &PushMessage) -> Result<String, PushError>;
}
