// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Device registration and badge reset.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use vigil_core::types::token_prefix;
use vigil_core::{DeviceRegistration, DocumentStore, Identity, VigilError};

pub struct DeviceRegistry {
    store: Arc<dyn DocumentStore>,
}

impl DeviceRegistry {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Registers or refreshes a device.
    ///
    /// Creates the user record on first contact, removes older tokens that
    /// belong to the same physical device, then upserts the record with a
    /// zero badge count.
    pub async fn register_device(
        &self,
        caller: &Identity,
        token: &str,
        registration: &DeviceRegistration,
    ) -> Result<(), VigilError> {
        if token.trim().is_empty() {
            return Err(VigilError::InvalidArgument("device token is required".into()));
        }
        let user = &caller.user_id;
        let now = Utc::now();

        if self
            .store
            .ensure_user(user, caller.email.as_deref(), now)
            .await?
        {
            info!(user = %user, "user record created");
        }

        if let (Some(platform), Some(device_id)) =
            (registration.platform.as_deref(), registration.device_id.as_deref())
        {
            let removed = self
                .store
                .remove_stale_tokens(user, token, platform, device_id)
                .await?;
            if removed > 0 {
                info!(user = %user, removed, platform, "stale device tokens removed");
            }
        }

        self.store
            .upsert_device(user, token, registration, now)
            .await?;
        debug!(
            user = %user,
            token = token_prefix(token),
            enabled = registration.notifications_enabled,
            "device registered"
        );
        Ok(())
    }

    /// Sets the badge count to zero. `NotFound` for an unknown device.
    pub async fn reset_badge(&self, caller: &Identity, token: &str) -> Result<(), VigilError> {
        self.store
            .reset_badge(&caller.user_id, token, Utc::now())
            .await?;
        debug!(user = %caller.user_id, token = token_prefix(token), "badge reset");
        Ok(())
    }
}
