// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence traits for users, conversations, devices, quotes, and billing.
//!
//! The store is key-addressed per user. Counter and badge updates must be
//! atomic at the store (no read-modify-write in the caller), and
//! [`QuoteStore::append_quote_if_not_sent_on`] must check and insert within a
//! single transaction.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::VigilError;
use crate::types::{
    ChatMessage, Conversation, ConversationId, DailyQuote, DeviceRecord, DeviceRegistration,
    NewDailyQuote, QuoteChannel, UserId, UserRecord,
};

/// User profile records.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// All user ids in store enumeration order.
    async fn list_user_ids(&self) -> Result<Vec<UserId>, VigilError>;

    /// Reads a user profile. `Ok(None)` when the user has no record.
    async fn get_user(&self, user: &UserId) -> Result<Option<UserRecord>, VigilError>;

    /// Creates the user record if absent. Returns `true` when a record was created.
    async fn ensure_user(
        &self,
        user: &UserId,
        email: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<bool, VigilError>;

    /// Atomically increments the message counter and sets last-active,
    /// creating the record when missing.
    async fn record_message_sent(&self, user: &UserId, now: DateTime<Utc>)
    -> Result<(), VigilError>;
}

/// Per-user conversation documents.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Reads one conversation. `Ok(None)` when it was never written.
    async fn get_conversation(
        &self,
        user: &UserId,
        id: &ConversationId,
    ) -> Result<Option<Conversation>, VigilError>;

    /// Merge-writes the full message sequence and last-updated timestamp.
    async fn save_messages(
        &self,
        user: &UserId,
        id: &ConversationId,
        messages: &[ChatMessage],
        updated: DateTime<Utc>,
    ) -> Result<(), VigilError>;

    /// Up to `limit` conversations, most recently updated first.
    async fn recent_conversations(
        &self,
        user: &UserId,
        limit: usize,
    ) -> Result<Vec<Conversation>, VigilError>;
}

/// Per-user push device records, keyed by token.
#[async_trait]
pub trait DeviceStore: Send + Sync {
    /// Devices with notifications enabled, in store enumeration order.
    async fn enabled_devices(&self, user: &UserId) -> Result<Vec<DeviceRecord>, VigilError>;

    async fn get_device(
        &self,
        user: &UserId,
        token: &str,
    ) -> Result<Option<DeviceRecord>, VigilError>;

    /// Atomically adds one to the badge count and stamps last-notified and
    /// last-updated. [`VigilError::NotFound`] when the device is absent.
    async fn increment_badge(
        &self,
        user: &UserId,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<(), VigilError>;

    /// Sets the badge count to zero. [`VigilError::NotFound`] when the device is absent.
    async fn reset_badge(
        &self,
        user: &UserId,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<(), VigilError>;

    /// Inserts or merge-updates a device. A newly registered device starts
    /// with a zero badge count.
    async fn upsert_device(
        &self,
        user: &UserId,
        token: &str,
        registration: &DeviceRegistration,
        now: DateTime<Utc>,
    ) -> Result<(), VigilError>;

    /// Deletes every device for `user` with the same platform and device id
    /// as `keep_token`, other than `keep_token` itself. Returns the number removed.
    async fn remove_stale_tokens(
        &self,
        user: &UserId,
        keep_token: &str,
        platform: &str,
        device_id: &str,
    ) -> Result<usize, VigilError>;

    /// Deletes one device record. Deleting a missing device is not an error.
    async fn delete_device(&self, user: &UserId, token: &str) -> Result<(), VigilError>;
}

/// Append-only daily-quote history.
#[async_trait]
pub trait QuoteStore: Send + Sync {
    /// The newest entry on `channel`, by timestamp.
    async fn latest_quote(
        &self,
        user: &UserId,
        channel: QuoteChannel,
    ) -> Result<Option<DailyQuote>, VigilError>;

    /// Appends an entry unconditionally.
    async fn append_quote(
        &self,
        user: &UserId,
        quote: &NewDailyQuote,
    ) -> Result<DailyQuote, VigilError>;

    /// Appends an entry unless the latest entry on the same channel was sent
    /// on `day`. The check and insert happen in one transaction. Returns
    /// `Ok(None)` when an entry for `day` already exists.
    async fn append_quote_if_not_sent_on(
        &self,
        user: &UserId,
        quote: &NewDailyQuote,
        day: NaiveDate,
    ) -> Result<Option<DailyQuote>, VigilError>;
}

/// Read-only entitlement sources.
#[async_trait]
pub trait EntitlementStore: Send + Sync {
    /// Whether the mirrored billing record marks `entitlement` of `product` active.
    /// `Ok(false)` when there is no billing record.
    async fn billing_entitlement_active(
        &self,
        user: &UserId,
        product: &str,
        entitlement: &str,
    ) -> Result<bool, VigilError>;

    /// Whether the user profile carries the premium flag or tier.
    /// `Ok(false)` when the user has no record.
    async fn profile_premium(&self, user: &UserId) -> Result<bool, VigilError>;
}

/// A single backend implementing every store trait.
pub trait DocumentStore:
    UserStore + ConversationStore + DeviceStore + QuoteStore + EntitlementStore
{
}

impl<T> DocumentStore for T where
    T: UserStore + ConversationStore + DeviceStore + QuoteStore + EntitlementStore
{
}
