// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Temp-directory SQLite store for integration tests.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use vigil_config::model::StorageConfig;
use vigil_core::{DeviceRegistration, DeviceStore, DocumentStore, UserId, UserStore, VigilError};
use vigil_storage::SqliteStore;

/// A fully migrated store backed by a database in a temp directory.
///
/// The directory is removed when the harness is dropped.
pub struct TestStore {
    pub store: Arc<SqliteStore>,
    _temp_dir: tempfile::TempDir,
}

impl TestStore {
    pub async fn new() -> Result<Self, VigilError> {
        let temp_dir = tempfile::TempDir::new().map_err(VigilError::storage)?;
        let config = StorageConfig {
            database_path: temp_dir.path().join("test.db").to_string_lossy().to_string(),
            wal_mode: true,
        };
        let store = SqliteStore::open(config).await?;
        Ok(Self {
            store: Arc::new(store),
            _temp_dir: temp_dir,
        })
    }

    /// The store as a trait object, the way services receive it.
    pub fn documents(&self) -> Arc<dyn DocumentStore> {
        self.store.clone()
    }

    /// Creates a user record.
    pub async fn add_user(&self, user: &str, now: DateTime<Utc>) -> Result<UserId, VigilError> {
        let id = UserId::from(user);
        self.store.ensure_user(&id, None, now).await?;
        Ok(id)
    }

    /// Registers a notification-enabled device with an optional UTC offset.
    pub async fn add_device(
        &self,
        user: &UserId,
        token: &str,
        offset: Option<i32>,
        now: DateTime<Utc>,
    ) -> Result<(), VigilError> {
        let registration = DeviceRegistration {
            notifications_enabled: true,
            time_zone_offset: offset,
            ..DeviceRegistration::default()
        };
        self.store.upsert_device(user, token, &registration, now).await
    }

    /// Records `count` sent messages on top of the current counter.
    pub async fn bump_message_count(
        &self,
        user: &UserId,
        count: u64,
        now: DateTime<Utc>,
    ) -> Result<(), VigilError> {
        for _ in 0..count {
            self.store.record_message_sent(user, now).await?;
        }
        Ok(())
    }
}
