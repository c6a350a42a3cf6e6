// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end chat behavior against a real SQLite store.

use std::sync::Arc;

use chrono::Utc;
use vigil_chat::{ChatProcessor, HistoryReader, RATE_LIMIT_MESSAGE};
use vigil_config::model::{ChatConfig, EntitlementConfig};
use vigil_core::{ChatRole, ConversationStore, Identity, UserId, UserStore, VigilError};
use vigil_test_utils::{MockCompletion, TestStore};

fn identity(user: &str) -> Identity {
    Identity {
        user_id: UserId::from(user),
        email: None,
    }
}

fn processor(harness: &TestStore, provider: Arc<MockCompletion>) -> ChatProcessor {
    ChatProcessor::new(
        harness.documents(),
        provider,
        &ChatConfig::default(),
        &EntitlementConfig::default(),
    )
}

#[tokio::test]
async fn follow_up_messages_thread_into_one_conversation() {
    let harness = TestStore::new().await.unwrap();
    let provider = Arc::new(MockCompletion::with_responses(vec![
        "first reply".into(),
        "second reply".into(),
    ]));
    let chat = processor(&harness, provider);
    let caller = identity("u1");

    let first = chat
        .process_message(Some(&caller), "first", None)
        .await
        .unwrap();
    let second = chat
        .process_message(Some(&caller), "second", Some(first.conversation_id.clone()))
        .await
        .unwrap();
    assert_eq!(first.conversation_id, second.conversation_id);

    let stored = harness
        .store
        .get_conversation(&caller.user_id, &first.conversation_id)
        .await
        .unwrap()
        .unwrap();
    let roles: Vec<ChatRole> = stored.messages.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![
            ChatRole::User,
            ChatRole::Assistant,
            ChatRole::User,
            ChatRole::Assistant
        ]
    );
    assert_eq!(stored.messages[2].content, "second");
    assert_eq!(stored.messages[3].content, "second reply");

    let profile = harness.store.get_user(&caller.user_id).await.unwrap().unwrap();
    assert_eq!(profile.message_count, 2);

    let history = HistoryReader::new(harness.documents(), 50)
        .get_history(Some(&caller))
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].messages.len(), 4);
}

#[tokio::test]
async fn exhausted_free_tier_makes_no_completion_call() {
    let harness = TestStore::new().await.unwrap();
    let now = Utc::now();
    let user = harness.add_user("u1", now).await.unwrap();
    harness.bump_message_count(&user, 30, now).await.unwrap();

    let provider = Arc::new(MockCompletion::new());
    let chat = processor(&harness, provider.clone());

    let err = chat
        .process_message(Some(&identity("u1")), "one more", None)
        .await
        .unwrap_err();
    match err {
        VigilError::RateLimited(message) => assert_eq!(message, RATE_LIMIT_MESSAGE),
        other => panic!("expected RateLimited, got {other:?}"),
    }
    assert_eq!(provider.calls(), 0);

    let profile = harness.store.get_user(&user).await.unwrap().unwrap();
    assert_eq!(profile.message_count, 30);
}

#[tokio::test]
async fn premium_user_ignores_the_limit() {
    let harness = TestStore::new().await.unwrap();
    let now = Utc::now();
    let user = harness.add_user("u1", now).await.unwrap();
    harness.bump_message_count(&user, 45, now).await.unwrap();
    harness
        .store
        .put_billing_record(
            &user,
            &serde_json::json!({
                "com.hunyhun.aisaint.premium.monthly": {
                    "entitlements": {"Monthly Premium": {"active": true}}
                }
            }),
        )
        .await
        .unwrap();

    let provider = Arc::new(MockCompletion::new());
    let chat = processor(&harness, provider.clone());
    chat.process_message(Some(&identity("u1")), "still here", None)
        .await
        .unwrap();
    assert_eq!(provider.calls(), 1);
}
