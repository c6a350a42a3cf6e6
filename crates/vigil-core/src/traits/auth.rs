// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Caller identity verification.

use async_trait::async_trait;

use crate::error::VigilError;
use crate::types::Identity;

/// Resolves a bearer credential to a verified identity.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verifies `token`. Any failure is reported as [`VigilError::Unauthenticated`].
    async fn verify(&self, token: &str) -> Result<Identity, VigilError>;
}
