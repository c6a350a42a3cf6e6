// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Vigil backend.
//!
//! This crate provides the collaborator trait definitions, error types, and
//! domain types used throughout the Vigil workspace. Concrete backends
//! (SQLite, Gemini, FCM) implement the traits defined here.

pub mod error;
pub mod outcome;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{PushError, VigilError};
pub use outcome::{SideEffect, SideEffects};
pub use types::{
    AdapterType, ChatMessage, ChatRole, Conversation, ConversationId, ConversationSummary,
    DailyQuote, DeviceRecord, DeviceRegistration, HealthStatus, Identity, NewDailyQuote,
    PushMessage, QuoteChannel, UserId, UserRecord,
};

pub use traits::{
    CompletionProvider, ConversationStore, DeviceStore, DocumentStore, EntitlementStore,
    IdentityVerifier, PluginAdapter, PushSender, QuoteStore, UserStore,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vigil_error_has_all_variants() {
        let _unauth = VigilError::Unauthenticated("test".into());
        let _invalid = VigilError::InvalidArgument("test".into());
        let _limited = VigilError::RateLimited("test".into());
        let _upstream = VigilError::UpstreamUnavailable {
            message: "test".into(),
            source: None,
        };
        let _not_found = VigilError::NotFound("test".into());
        let _internal = VigilError::Internal("test".into());
        let _config = VigilError::Config("test".into());
        let _storage = VigilError::storage(std::io::Error::other("test"));
        let _provider = VigilError::Provider {
            message: "test".into(),
            source: None,
        };
        let _push = VigilError::Push(PushError::TokenNotRegistered);
        let _timeout = VigilError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
    }

    #[test]
    fn rate_limited_displays_message_verbatim() {
        let err = VigilError::RateLimited("Message limit exceeded.".into());
        assert_eq!(err.to_string(), "Message limit exceeded.");
    }

    #[test]
    fn only_caller_facing_variants_are_exposed() {
        assert!(VigilError::InvalidArgument("x".into()).is_caller_facing());
        assert!(VigilError::RateLimited("x".into()).is_caller_facing());
        assert!(!VigilError::Internal("x".into()).is_caller_facing());
        assert!(!VigilError::storage(std::io::Error::other("disk")).is_caller_facing());
        assert!(
            !VigilError::UpstreamUnavailable {
                message: "x".into(),
                source: None
            }
            .is_caller_facing()
        );
    }

    #[test]
    fn push_error_token_invalid() {
        assert!(PushError::TokenNotRegistered.is_token_invalid());
        let rejected = PushError::Rejected {
            status: 400,
            code: Some("INVALID_ARGUMENT".into()),
            message: "bad".into(),
        };
        assert!(!rejected.is_token_invalid());
    }

    #[test]
    fn adapter_type_round_trips() {
        use std::str::FromStr;

        let variants = [
            AdapterType::Storage,
            AdapterType::Completion,
            AdapterType::Push,
            AdapterType::Identity,
            AdapterType::Observability,
        ];
        for variant in &variants {
            let s = variant.to_string();
            let parsed = AdapterType::from_str(&s).expect("should parse back");
            assert_eq!(*variant, parsed);
        }
    }

    #[test]
    fn traits_are_object_safe() {
        fn _assert_store(_: &dyn DocumentStore) {}
        fn _assert_completion(_: &dyn CompletionProvider) {}
        fn _assert_push(_: &dyn PushSender) {}
        fn _assert_identity(_: &dyn IdentityVerifier) {}
        fn _assert_adapter(_: &dyn PluginAdapter) {}
    }
}
