// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for Vigil.

use thiserror::Error;

/// The primary error type used across Vigil operations and collaborator traits.
///
/// The first six variants form the caller-facing taxonomy. The remaining
/// variants describe infrastructure failures; request handlers collapse them
/// into a generic internal error so no infrastructure detail reaches clients.
#[derive(Debug, Error)]
pub enum VigilError {
    /// No identity, or the presented credential could not be verified.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// The request was malformed (e.g. an empty chat message).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The free-tier message quota is exhausted. Carries a user-facing message.
    #[error("{0}")]
    RateLimited(String),

    /// The text-completion or push provider failed in a way that blocks the operation.
    #[error("upstream unavailable: {message}")]
    UpstreamUnavailable {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A record that had to exist was absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),

    /// Configuration errors (invalid TOML, missing secrets, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Text-completion provider errors (HTTP failure, bad response shape).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Push delivery errors.
    #[error("push error: {0}")]
    Push(#[from] PushError),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },
}

impl VigilError {
    /// Wraps any error as a storage failure.
    pub fn storage(e: impl std::error::Error + Send + Sync + 'static) -> Self {
        VigilError::Storage {
            source: Box::new(e),
        }
    }

    /// Whether this error may be shown to the caller verbatim.
    pub fn is_caller_facing(&self) -> bool {
        matches!(
            self,
            VigilError::Unauthenticated(_)
                | VigilError::InvalidArgument(_)
                | VigilError::RateLimited(_)
                | VigilError::NotFound(_)
        )
    }
}

/// Errors reported by a push provider for a single send.
#[derive(Debug, Error)]
pub enum PushError {
    /// The device token is permanently invalid; the device record should be pruned.
    #[error("registration token is no longer registered")]
    TokenNotRegistered,

    /// The provider rejected the request with a status and provider error code.
    #[error("push provider returned {status}: {message}")]
    Rejected {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// The request never produced a provider response (network, timeout, auth setup).
    #[error("push transport failure: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl PushError {
    /// True when the device token should be deleted.
    pub fn is_token_invalid(&self) -> bool {
        matches!(self, PushError::TokenNotRegistered)
    }
}
