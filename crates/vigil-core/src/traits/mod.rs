// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions.
//!
//! Every external dependency of the chat and dispatch pipelines sits behind
//! one of these traits so the core can be exercised against mocks. All async
//! traits use `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod auth;
pub mod provider;
pub mod push;
pub mod store;

pub use adapter::PluginAdapter;
pub use auth::IdentityVerifier;
pub use provider::CompletionProvider;
pub use push::PushSender;
pub use store::{
    ConversationStore, DeviceStore, DocumentStore, EntitlementStore, QuoteStore, UserStore,
};
