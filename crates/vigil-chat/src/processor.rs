// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat message processing.
//!
//! One call validates the message, applies the free-tier gate, threads the
//! message into its conversation, asks the completion provider for a reply
//! and persists the exchange. Persistence failures after a successful reply
//! are reported as side effects instead of failing the call.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use vigil_config::model::{ChatConfig, EntitlementConfig};
use vigil_core::{
    ChatMessage, CompletionProvider, Conversation, ConversationId, DocumentStore, Identity,
    SideEffect, SideEffects, VigilError,
};

use crate::entitlement::EntitlementChecker;
use crate::limits::MessageLimiter;

/// Caller-facing text of the free-tier rejection.
pub const RATE_LIMIT_MESSAGE: &str =
    "Message limit exceeded. Please upgrade to premium for unlimited messages.";

/// Result of a processed chat message.
#[derive(Debug)]
pub struct ChatReply {
    pub reply: String,
    pub conversation_id: ConversationId,
    /// Secondary writes that failed after the reply was produced.
    pub side_effects: SideEffects,
}

pub struct ChatProcessor {
    store: Arc<dyn DocumentStore>,
    provider: Arc<dyn CompletionProvider>,
    entitlement: EntitlementChecker,
    limiter: MessageLimiter,
}

impl ChatProcessor {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        provider: Arc<dyn CompletionProvider>,
        chat: &ChatConfig,
        entitlement: &EntitlementConfig,
    ) -> Self {
        Self {
            entitlement: EntitlementChecker::new(store.clone(), entitlement),
            limiter: MessageLimiter::new(store.clone(), chat.free_tier_limit),
            store,
            provider,
        }
    }

    #[instrument(skip_all, fields(user = caller.map(|c| c.user_id.as_str()).unwrap_or("-")))]
    pub async fn process_message(
        &self,
        caller: Option<&Identity>,
        message: &str,
        conversation_id: Option<ConversationId>,
    ) -> Result<ChatReply, VigilError> {
        let caller = caller
            .ok_or_else(|| VigilError::Unauthenticated("authentication required".into()))?;
        let user = &caller.user_id;

        if message.is_empty() {
            vigil_prometheus::record_chat_message("invalid");
            return Err(VigilError::InvalidArgument("message is required".into()));
        }

        let mut side_effects = SideEffects::new();
        side_effects.record(
            SideEffect::ProfileBootstrap,
            self.store
                .ensure_user(user, caller.email.as_deref(), Utc::now())
                .await,
        );

        if !self.entitlement.is_premium(user).await && !self.limiter.within_limit(user).await {
            info!(limit = self.limiter.limit(), "free-tier limit reached");
            vigil_prometheus::record_chat_message("rate_limited");
            return Err(VigilError::RateLimited(RATE_LIMIT_MESSAGE.into()));
        }

        let conversation_id = conversation_id.unwrap_or_else(ConversationId::generate);
        let mut conversation = match self.store.get_conversation(user, &conversation_id).await {
            Ok(Some(conversation)) => conversation,
            Ok(None) => Conversation::empty(conversation_id.clone()),
            Err(e) => {
                warn!(conversation = %conversation_id, error = %e, "conversation unreadable; starting empty");
                Conversation::empty(conversation_id.clone())
            }
        };

        conversation
            .messages
            .push(ChatMessage::user(message, Utc::now()));

        let reply = match self.provider.complete(message).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "completion failed");
                vigil_prometheus::record_chat_message("upstream_error");
                return Err(VigilError::UpstreamUnavailable {
                    message: "completion service unavailable".into(),
                    source: Some(Box::new(e)),
                });
            }
        };

        let now = Utc::now();
        conversation
            .messages
            .push(ChatMessage::assistant(reply.clone(), now));

        side_effects.record(
            SideEffect::ConversationWrite,
            self.store
                .save_messages(user, &conversation_id, &conversation.messages, now)
                .await,
        );
        side_effects.record(
            SideEffect::CounterIncrement,
            self.store.record_message_sent(user, now).await,
        );

        debug!(
            conversation = %conversation_id,
            messages = conversation.messages.len(),
            clean = side_effects.is_clean(),
            "chat message processed"
        );
        vigil_prometheus::record_chat_message("ok");

        Ok(ChatReply {
            reply,
            conversation_id,
            side_effects,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::{ChatRole, ConversationStore, UserId, UserStore};
    use vigil_test_utils::{FaultyStore, MockCompletion, StoreOp, TestStore};

    fn identity(user: &str) -> Identity {
        Identity {
            user_id: UserId::from(user),
            email: Some(format!("{user}@example.com")),
        }
    }

    fn processor(store: Arc<dyn DocumentStore>, provider: Arc<MockCompletion>) -> ChatProcessor {
        ChatProcessor::new(
            store,
            provider,
            &ChatConfig::default(),
            &EntitlementConfig::default(),
        )
    }

    #[tokio::test]
    async fn missing_caller_is_unauthenticated() {
        let harness = TestStore::new().await.unwrap();
        let provider = Arc::new(MockCompletion::new());
        let chat = processor(harness.documents(), provider.clone());

        let err = chat.process_message(None, "hi", None).await.unwrap_err();
        assert!(matches!(err, VigilError::Unauthenticated(_)));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn empty_message_is_invalid() {
        let harness = TestStore::new().await.unwrap();
        let provider = Arc::new(MockCompletion::new());
        let chat = processor(harness.documents(), provider.clone());

        let err = chat
            .process_message(Some(&identity("u1")), "", None)
            .await
            .unwrap_err();
        assert!(matches!(err, VigilError::InvalidArgument(_)));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn whitespace_message_is_sent_verbatim() {
        let harness = TestStore::new().await.unwrap();
        let provider = Arc::new(MockCompletion::with_responses(vec!["I am here.".into()]));
        let chat = processor(harness.documents(), provider.clone());

        let reply = chat
            .process_message(Some(&identity("u1")), "   ", None)
            .await
            .unwrap();
        assert_eq!(reply.reply, "I am here.");
        assert_eq!(provider.calls(), 1);
        assert_eq!(provider.prompts().await, vec!["   ".to_string()]);
    }

    #[tokio::test]
    async fn first_message_creates_conversation_and_profile() {
        let harness = TestStore::new().await.unwrap();
        let provider = Arc::new(MockCompletion::with_responses(vec!["Go in peace.".into()]));
        let chat = processor(harness.documents(), provider.clone());
        let caller = identity("u1");

        let reply = chat
            .process_message(Some(&caller), "I need guidance", None)
            .await
            .unwrap();

        assert_eq!(reply.reply, "Go in peace.");
        assert!(reply.side_effects.is_clean());
        assert_eq!(provider.prompts().await, vec!["I need guidance".to_string()]);

        let stored = harness
            .store
            .get_conversation(&caller.user_id, &reply.conversation_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.messages.len(), 2);
        assert_eq!(stored.messages[0].role, ChatRole::User);
        assert_eq!(stored.messages[1].role, ChatRole::Assistant);

        let profile = harness.store.get_user(&caller.user_id).await.unwrap().unwrap();
        assert_eq!(profile.message_count, 1);
        assert_eq!(profile.email.as_deref(), Some("u1@example.com"));
    }

    #[tokio::test]
    async fn upstream_failure_persists_nothing() {
        let harness = TestStore::new().await.unwrap();
        let provider = Arc::new(MockCompletion::failing());
        let chat = processor(harness.documents(), provider);
        let caller = identity("u1");
        let id = ConversationId::from("c1");

        let err = chat
            .process_message(Some(&caller), "hello", Some(id.clone()))
            .await
            .unwrap_err();
        assert!(matches!(err, VigilError::UpstreamUnavailable { .. }));

        assert!(
            harness
                .store
                .get_conversation(&caller.user_id, &id)
                .await
                .unwrap()
                .is_none()
        );
        let profile = harness.store.get_user(&caller.user_id).await.unwrap().unwrap();
        assert_eq!(profile.message_count, 0);
    }

    #[tokio::test]
    async fn write_failures_are_side_effects() {
        let harness = TestStore::new().await.unwrap();
        let faulty = Arc::new(FaultyStore::new(harness.documents()));
        faulty.fail(StoreOp::SaveMessages).await;
        faulty.fail(StoreOp::RecordMessage).await;

        let chat = processor(faulty, Arc::new(MockCompletion::new()));
        let reply = chat
            .process_message(Some(&identity("u1")), "hello", None)
            .await
            .unwrap();

        assert_eq!(reply.reply, "mock response");
        assert!(reply.side_effects.failed(SideEffect::ConversationWrite));
        assert!(reply.side_effects.failed(SideEffect::CounterIncrement));
    }

    #[tokio::test]
    async fn unreadable_conversation_starts_empty() {
        let harness = TestStore::new().await.unwrap();
        let faulty = Arc::new(FaultyStore::new(harness.documents()));
        faulty.fail(StoreOp::GetConversation).await;

        let chat = processor(faulty.clone(), Arc::new(MockCompletion::new()));
        let caller = identity("u1");
        let reply = chat
            .process_message(Some(&caller), "hello", Some(ConversationId::from("c9")))
            .await
            .unwrap();

        faulty.heal(StoreOp::GetConversation).await;
        let stored = faulty
            .get_conversation(&caller.user_id, &reply.conversation_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.messages.len(), 2);
    }
}
