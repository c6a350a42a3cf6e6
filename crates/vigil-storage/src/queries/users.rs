// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User profile operations.

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, params};
use vigil_core::{UserId, UserRecord, VigilError};

use crate::database::{Database, format_ts, opt_ts_column, ts_column};

/// All user ids in insertion order.
pub async fn list_user_ids(db: &Database) -> Result<Vec<UserId>, VigilError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare("SELECT id FROM users ORDER BY rowid ASC")?;
            let rows = stmt.query_map([], |row| Ok(UserId(row.get(0)?)))?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn get_user(db: &Database, user: &UserId) -> Result<Option<UserRecord>, VigilError> {
    let id = user.0.clone();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT id, email, message_count, is_premium, subscription_tier,
                        last_active, last_seen, created_at
                 FROM users WHERE id = ?1",
                params![id],
                |row| {
                    let count: i64 = row.get(2)?;
                    Ok(UserRecord {
                        id: UserId(row.get(0)?),
                        email: row.get(1)?,
                        message_count: count.max(0) as u64,
                        is_premium: row.get(3)?,
                        subscription_tier: row.get(4)?,
                        last_active: opt_ts_column(row, 5)?,
                        last_seen: opt_ts_column(row, 6)?,
                        created_at: ts_column(row, 7)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Creates the user if missing and stamps last-seen either way.
/// Returns `true` when a new record was inserted.
pub async fn ensure_user(
    db: &Database,
    user: &UserId,
    email: Option<&str>,
    now: DateTime<Utc>,
) -> Result<bool, VigilError> {
    let id = user.0.clone();
    let email = email.map(str::to_string);
    let now = format_ts(now);
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let inserted = tx.execute(
                "INSERT INTO users (id, email, created_at, last_seen)
                 VALUES (?1, ?2, ?3, ?3)
                 ON CONFLICT(id) DO NOTHING",
                params![id, email, now],
            )?;
            if inserted == 0 {
                tx.execute(
                    "UPDATE users SET last_seen = ?2, email = COALESCE(email, ?3) WHERE id = ?1",
                    params![id, now, email],
                )?;
            }
            tx.commit()?;
            Ok(inserted == 1)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Adds one to the message counter and stamps last-active, as a single upsert.
pub async fn record_message_sent(
    db: &Database,
    user: &UserId,
    now: DateTime<Utc>,
) -> Result<(), VigilError> {
    let id = user.0.clone();
    let now = format_ts(now);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO users (id, message_count, last_active, created_at)
                 VALUES (?1, 1, ?2, ?2)
                 ON CONFLICT(id) DO UPDATE SET
                     message_count = message_count + 1,
                     last_active = excluded.last_active",
                params![id, now],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Sets the profile premium flag and tier.
///
/// Nothing in the request path writes this; it exists for seeding and
/// administration of the profile-side entitlement.
pub async fn set_premium(
    db: &Database,
    user: &UserId,
    is_premium: bool,
    tier: Option<&str>,
) -> Result<(), VigilError> {
    let id = user.0.clone();
    let tier = tier.map(str::to_string);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO users (id, is_premium, subscription_tier) VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET
                     is_premium = excluded.is_premium,
                     subscription_tier = excluded.subscription_tier",
                params![id, is_premium, tier],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn ts(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 1, h, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn ensure_user_inserts_once() {
        let (db, _dir) = setup_db().await;
        let u = UserId::from("alice");

        assert!(ensure_user(&db, &u, Some("a@example.com"), ts(1)).await.unwrap());
        assert!(!ensure_user(&db, &u, None, ts(2)).await.unwrap());

        let record = get_user(&db, &u).await.unwrap().unwrap();
        assert_eq!(record.email.as_deref(), Some("a@example.com"));
        assert_eq!(record.message_count, 0);
        assert_eq!(record.created_at, ts(1));
        assert_eq!(record.last_seen, Some(ts(2)));
        assert_eq!(record.last_active, None);
    }

    #[tokio::test]
    async fn record_message_sent_creates_then_increments() {
        let (db, _dir) = setup_db().await;
        let u = UserId::from("bob");

        record_message_sent(&db, &u, ts(3)).await.unwrap();
        record_message_sent(&db, &u, ts(4)).await.unwrap();

        let record = get_user(&db, &u).await.unwrap().unwrap();
        assert_eq!(record.message_count, 2);
        assert_eq!(record.last_active, Some(ts(4)));
    }

    #[tokio::test]
    async fn list_user_ids_in_insertion_order() {
        let (db, _dir) = setup_db().await;
        for name in ["zed", "amy", "kai"] {
            ensure_user(&db, &UserId::from(name), None, ts(0)).await.unwrap();
        }
        let ids = list_user_ids(&db).await.unwrap();
        let names: Vec<&str> = ids.iter().map(UserId::as_str).collect();
        assert_eq!(names, vec!["zed", "amy", "kai"]);
    }

    #[tokio::test]
    async fn missing_user_reads_as_none() {
        let (db, _dir) = setup_db().await;
        assert!(get_user(&db, &UserId::from("ghost")).await.unwrap().is_none());
    }
}
