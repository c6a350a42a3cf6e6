// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Free-tier message gate.

use std::sync::Arc;

use tracing::warn;
use vigil_core::{DocumentStore, UserId};

pub struct MessageLimiter {
    store: Arc<dyn DocumentStore>,
    limit: u64,
}

impl MessageLimiter {
    pub fn new(store: Arc<dyn DocumentStore>, limit: u64) -> Self {
        Self { store, limit }
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// True while the user's counter is below the limit.
    ///
    /// A user with no record is within the limit. A failed read also counts
    /// as within the limit, so a storage outage never locks users out.
    pub async fn within_limit(&self, user: &UserId) -> bool {
        match self.store.get_user(user).await {
            Ok(Some(record)) => record.message_count < self.limit,
            Ok(None) => true,
            Err(e) => {
                warn!(user = %user, error = %e, "message count read failed; allowing message");
                true
            }
        }
    }
}
