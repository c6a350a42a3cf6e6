// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Premium entitlement check.

use std::sync::Arc;

use tracing::{debug, warn};
use vigil_config::model::EntitlementConfig;
use vigil_core::{DocumentStore, UserId};

/// Decides whether a user has unlimited messaging.
///
/// Two sources are OR-ed: the mirrored billing record and the profile
/// premium flag. A failed lookup counts as "not premium" for that source
/// only, so the check itself never fails.
pub struct EntitlementChecker {
    store: Arc<dyn DocumentStore>,
    product_id: String,
    entitlement_id: String,
}

impl EntitlementChecker {
    pub fn new(store: Arc<dyn DocumentStore>, config: &EntitlementConfig) -> Self {
        Self {
            store,
            product_id: config.product_id.clone(),
            entitlement_id: config.entitlement_id.clone(),
        }
    }

    pub async fn is_premium(&self, user: &UserId) -> bool {
        let (billing, profile) = tokio::join!(
            self.store
                .billing_entitlement_active(user, &self.product_id, &self.entitlement_id),
            self.store.profile_premium(user),
        );

        let billing = billing.unwrap_or_else(|e| {
            warn!(user = %user, error = %e, "billing entitlement lookup failed");
            false
        });
        let profile = profile.unwrap_or_else(|e| {
            warn!(user = %user, error = %e, "profile premium lookup failed");
            false
        });

        debug!(user = %user, billing, profile, "entitlement evaluated");
        billing || profile
    }
}
