// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Store wrapper that fails selected operations.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::Mutex;

use vigil_core::{
    ChatMessage, Conversation, ConversationId, ConversationStore, DailyQuote, DeviceRecord,
    DeviceRegistration, DeviceStore, DocumentStore, EntitlementStore, NewDailyQuote, QuoteChannel,
    QuoteStore, UserId, UserRecord, UserStore, VigilError,
};

/// One store operation that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    ListUsers,
    GetUser,
    EnsureUser,
    RecordMessage,
    GetConversation,
    SaveMessages,
    RecentConversations,
    EnabledDevices,
    GetDevice,
    IncrementBadge,
    ResetBadge,
    UpsertDevice,
    RemoveStaleTokens,
    DeleteDevice,
    LatestQuote,
    AppendQuote,
    BillingEntitlement,
    ProfilePremium,
}

/// Delegates to an inner store, failing every operation in the fault set
/// with a storage error.
pub struct FaultyStore {
    inner: Arc<dyn DocumentStore>,
    faults: Mutex<HashSet<StoreOp>>,
}

impl FaultyStore {
    pub fn new(inner: Arc<dyn DocumentStore>) -> Self {
        Self {
            inner,
            faults: Mutex::new(HashSet::new()),
        }
    }

    pub async fn fail(&self, op: StoreOp) {
        self.faults.lock().await.insert(op);
    }

    pub async fn heal(&self, op: StoreOp) {
        self.faults.lock().await.remove(&op);
    }

    async fn check(&self, op: StoreOp) -> Result<(), VigilError> {
        if self.faults.lock().await.contains(&op) {
            return Err(VigilError::storage(std::io::Error::other(format!(
                "injected failure: {op:?}"
            ))));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for FaultyStore {
    async fn list_user_ids(&self) -> Result<Vec<UserId>, VigilError> {
        self.check(StoreOp::ListUsers).await?;
        self.inner.list_user_ids().await
    }

    async fn get_user(&self, user: &UserId) -> Result<Option<UserRecord>, VigilError> {
        self.check(StoreOp::GetUser).await?;
        self.inner.get_user(user).await
    }

    async fn ensure_user(
        &self,
        user: &UserId,
        email: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<bool, VigilError> {
        self.check(StoreOp::EnsureUser).await?;
        self.inner.ensure_user(user, email, now).await
    }

    async fn record_message_sent(
        &self,
        user: &UserId,
        now: DateTime<Utc>,
    ) -> Result<(), VigilError> {
        self.check(StoreOp::RecordMessage).await?;
        self.inner.record_message_sent(user, now).await
    }
}

#[async_trait]
impl ConversationStore for FaultyStore {
    async fn get_conversation(
        &self,
        user: &UserId,
        id: &ConversationId,
    ) -> Result<Option<Conversation>, VigilError> {
        self.check(StoreOp::GetConversation).await?;
        self.inner.get_conversation(user, id).await
    }

    async fn save_messages(
        &self,
        user: &UserId,
        id: &ConversationId,
        messages: &[ChatMessage],
        updated: DateTime<Utc>,
    ) -> Result<(), VigilError> {
        self.check(StoreOp::SaveMessages).await?;
        self.inner.save_messages(user, id, messages, updated).await
    }

    async fn recent_conversations(
        &self,
        user: &UserId,
        limit: usize,
    ) -> Result<Vec<Conversation>, VigilError> {
        self.check(StoreOp::RecentConversations).await?;
        self.inner.recent_conversations(user, limit).await
    }
}

#[async_trait]
impl DeviceStore for FaultyStore {
    async fn enabled_devices(&self, user: &UserId) -> Result<Vec<DeviceRecord>, VigilError> {
        self.check(StoreOp::EnabledDevices).await?;
        self.inner.enabled_devices(user).await
    }

    async fn get_device(
        &self,
        user: &UserId,
        token: &str,
    ) -> Result<Option<DeviceRecord>, VigilError> {
        self.check(StoreOp::GetDevice).await?;
        self.inner.get_device(user, token).await
    }

    async fn increment_badge(
        &self,
        user: &UserId,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<(), VigilError> {
        self.check(StoreOp::IncrementBadge).await?;
        self.inner.increment_badge(user, token, now).await
    }

    async fn reset_badge(
        &self,
        user: &UserId,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<(), VigilError> {
        self.check(StoreOp::ResetBadge).await?;
        self.inner.reset_badge(user, token, now).await
    }

    async fn upsert_device(
        &self,
        user: &UserId,
        token: &str,
        registration: &DeviceRegistration,
        now: DateTime<Utc>,
    ) -> Result<(), VigilError> {
        self.check(StoreOp::UpsertDevice).await?;
        self.inner.upsert_device(user, token, registration, now).await
    }

    async fn remove_stale_tokens(
        &self,
        user: &UserId,
        keep_token: &str,
        platform: &str,
        device_id: &str,
    ) -> Result<usize, VigilError> {
        self.check(StoreOp::RemoveStaleTokens).await?;
        self.inner
            .remove_stale_tokens(user, keep_token, platform, device_id)
            .await
    }

    async fn delete_device(&self, user: &UserId, token: &str) -> Result<(), VigilError> {
        self.check(StoreOp::DeleteDevice).await?;
        self.inner.delete_device(user, token).await
    }
}

#[async_trait]
impl QuoteStore for FaultyStore {
    async fn latest_quote(
        &self,
        user: &UserId,
        channel: QuoteChannel,
    ) -> Result<Option<DailyQuote>, VigilError> {
        self.check(StoreOp::LatestQuote).await?;
        self.inner.latest_quote(user, channel).await
    }

    async fn append_quote(
        &self,
        user: &UserId,
        quote: &NewDailyQuote,
    ) -> Result<DailyQuote, VigilError> {
        self.check(StoreOp::AppendQuote).await?;
        self.inner.append_quote(user, quote).await
    }

    async fn append_quote_if_not_sent_on(
        &self,
        user: &UserId,
        quote: &NewDailyQuote,
        day: NaiveDate,
    ) -> Result<Option<DailyQuote>, VigilError> {
        self.check(StoreOp::AppendQuote).await?;
        self.inner.append_quote_if_not_sent_on(user, quote, day).await
    }
}

#[async_trait]
impl EntitlementStore for FaultyStore {
    async fn billing_entitlement_active(
        &self,
        user: &UserId,
        product: &str,
        entitlement: &str,
    ) -> Result<bool, VigilError> {
        self.check(StoreOp::BillingEntitlement).await?;
        self.inner
            .billing_entitlement_active(user, product, entitlement)
            .await
    }

    async fn profile_premium(&self, user: &UserId) -> Result<bool, VigilError> {
        self.check(StoreOp::ProfilePremium).await?;
        self.inner.profile_premium(user).await
    }
}
