// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Side-effect reporting for operations whose primary outcome can succeed
//! while secondary writes fail.

use strum::Display;

use crate::error::VigilError;

/// A secondary write attached to a primary operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SideEffect {
    /// Merge-write of the conversation sequence.
    ConversationWrite,
    /// Message counter increment and last-active stamp.
    CounterIncrement,
    /// Daily-quote audit entry.
    QuoteAudit,
    /// Device record deletion after an invalid-token report.
    DeviceCleanup,
    /// User record creation on first contact.
    ProfileBootstrap,
}

/// A failed side effect with its error text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideEffectFailure {
    pub effect: SideEffect,
    pub error: String,
}

/// Collects side-effect failures alongside a successful primary outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SideEffects {
    failures: Vec<SideEffectFailure>,
}

impl SideEffects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the result of a side effect, logging failures at warn.
    pub fn record<T>(&mut self, effect: SideEffect, result: Result<T, VigilError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(effect = %effect, error = %e, "side effect failed");
                self.failures.push(SideEffectFailure {
                    effect,
                    error: e.to_string(),
                });
                None
            }
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failures(&self) -> &[SideEffectFailure] {
        &self.failures
    }

    pub fn failed(&self, effect: SideEffect) -> bool {
        self.failures.iter().any(|f| f.effect == effect)
    }
}
