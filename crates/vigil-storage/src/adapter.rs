// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the store traits.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::OnceCell;
use tracing::debug;

use vigil_config::model::StorageConfig;
use vigil_core::{
    AdapterType, ChatMessage, Conversation, ConversationId, ConversationStore, DailyQuote,
    DeviceRecord, DeviceRegistration, DeviceStore, EntitlementStore, HealthStatus, NewDailyQuote,
    PluginAdapter, QuoteChannel, QuoteStore, UserId, UserRecord, UserStore, VigilError,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed document store.
///
/// Wraps a [`Database`] handle and delegates to the per-table query modules.
/// The database is opened on the first call to [`SqliteStore::initialize`].
pub struct SqliteStore {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStore {
    /// Create a new store. The database is not opened until [`initialize`](Self::initialize).
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Create and initialize a store in one step.
    pub async fn open(config: StorageConfig) -> Result<Self, VigilError> {
        let store = Self::new(config);
        store.initialize().await?;
        Ok(store)
    }

    /// Opens the database and runs migrations.
    pub async fn initialize(&self) -> Result<(), VigilError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db
            .set(db)
            .map_err(|_| VigilError::storage(std::io::Error::other("storage already initialized")))?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    /// Returns the underlying Database, or an error if not initialized.
    pub fn db(&self) -> Result<&Database, VigilError> {
        self.db.get().ok_or_else(|| {
            VigilError::storage(std::io::Error::other(
                "storage not initialized -- call initialize() first",
            ))
        })
    }

    /// Replaces the mirrored billing document for a user.
    pub async fn put_billing_record(
        &self,
        user: &UserId,
        subscriptions: &serde_json::Value,
    ) -> Result<(), VigilError> {
        queries::customers::put_subscriptions(self.db()?, user, subscriptions).await
    }

    /// Sets the profile premium flag and tier.
    pub async fn set_premium(
        &self,
        user: &UserId,
        is_premium: bool,
        tier: Option<&str>,
    ) -> Result<(), VigilError> {
        queries::users::set_premium(self.db()?, user, is_premium, tier).await
    }

    async fn checkpoint(&self) -> Result<(), VigilError> {
        if let Some(db) = self.db.get() {
            db.connection()
                .call(|conn| -> Result<(), rusqlite::Error> {
                    conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                    Ok(())
                })
                .await
                .map_err(crate::database::map_tr_err)?;
            debug!("WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl PluginAdapter for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, VigilError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), VigilError> {
        self.checkpoint().await
    }
}

#[async_trait]
impl UserStore for SqliteStore {
    async fn list_user_ids(&self) -> Result<Vec<UserId>, VigilError> {
        queries::users::list_user_ids(self.db()?).await
    }

    async fn get_user(&self, user: &UserId) -> Result<Option<UserRecord>, VigilError> {
        queries::users::get_user(self.db()?, user).await
    }

    async fn ensure_user(
        &self,
        user: &UserId,
        email: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<bool, VigilError> {
        queries::users::ensure_user(self.db()?, user, email, now).await
    }

    async fn record_message_sent(
        &self,
        user: &UserId,
        now: DateTime<Utc>,
    ) -> Result<(), VigilError> {
        queries::users::record_message_sent(self.db()?, user, now).await
    }
}

#[async_trait]
impl ConversationStore for SqliteStore {
    async fn get_conversation(
        &self,
        user: &UserId,
        id: &ConversationId,
    ) -> Result<Option<Conversation>, VigilError> {
        queries::conversations::get_conversation(self.db()?, user, id).await
    }

    async fn save_messages(
        &self,
        user: &UserId,
        id: &ConversationId,
        messages: &[ChatMessage],
        updated: DateTime<Utc>,
    ) -> Result<(), VigilError> {
        queries::conversations::save_messages(self.db()?, user, id, messages, updated).await
    }

    async fn recent_conversations(
        &self,
        user: &UserId,
        limit: usize,
    ) -> Result<Vec<Conversation>, VigilError> {
        queries::conversations::recent_conversations(self.db()?, user, limit).await
    }
}

#[async_trait]
impl DeviceStore for SqliteStore {
    async fn enabled_devices(&self, user: &UserId) -> Result<Vec<DeviceRecord>, VigilError> {
        queries::devices::enabled_devices(self.db()?, user).await
    }

    async fn get_device(
        &self,
        user: &UserId,
        token: &str,
    ) -> Result<Option<DeviceRecord>, VigilError> {
        queries::devices::get_device(self.db()?, user, token).await
    }

    async fn increment_badge(
        &self,
        user: &UserId,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<(), VigilError> {
        queries::devices::increment_badge(self.db()?, user, token, now).await
    }

    async fn reset_badge(
        &self,
        user: &UserId,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<(), VigilError> {
        queries::devices::reset_badge(self.db()?, user, token, now).await
    }

    async fn upsert_device(
        &self,
        user: &UserId,
        token: &str,
        registration: &DeviceRegistration,
        now: DateTime<Utc>,
    ) -> Result<(), VigilError> {
        queries::devices::upsert_device(self.db()?, user, token, registration, now).await
    }

    async fn remove_stale_tokens(
        &self,
        user: &UserId,
        keep_token: &str,
        platform: &str,
        device_id: &str,
    ) -> Result<usize, VigilError> {
        queries::devices::remove_stale_tokens(self.db()?, user, keep_token, platform, device_id)
            .await
    }

    async fn delete_device(&self, user: &UserId, token: &str) -> Result<(), VigilError> {
        queries::devices::delete_device(self.db()?, user, token).await
    }
}

#[async_trait]
impl QuoteStore for SqliteStore {
    async fn latest_quote(
        &self,
        user: &UserId,
        channel: QuoteChannel,
    ) -> Result<Option<DailyQuote>, VigilError> {
        queries::quotes::latest_quote(self.db()?, user, channel).await
    }

    async fn append_quote(
        &self,
        user: &UserId,
        quote: &NewDailyQuote,
    ) -> Result<DailyQuote, VigilError> {
        queries::quotes::append_quote(self.db()?, user, quote).await
    }

    async fn append_quote_if_not_sent_on(
        &self,
        user: &UserId,
        quote: &NewDailyQuote,
        day: NaiveDate,
    ) -> Result<Option<DailyQuote>, VigilError> {
        queries::quotes::append_quote_if_not_sent_on(self.db()?, user, quote, day).await
    }
}

#[async_trait]
impl EntitlementStore for SqliteStore {
    async fn billing_entitlement_active(
        &self,
        user: &UserId,
        product: &str,
        entitlement: &str,
    ) -> Result<bool, VigilError> {
        queries::customers::entitlement_active(self.db()?, user, product, entitlement).await
    }

    async fn profile_premium(&self, user: &UserId) -> Result<bool, VigilError> {
        Ok(queries::users::get_user(self.db()?, user)
            .await?
            .is_some_and(|u| u.profile_premium()))
    }
}
