// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Push device records.

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Row, params};
use vigil_core::{DeviceRecord, DeviceRegistration, UserId, VigilError};

use crate::database::{Database, format_ts, opt_ts_column};

const DEVICE_COLUMNS: &str = "user_id, token, notifications_enabled, time_zone, utc_offset_hours,
     badge_count, platform, device_id, device_model, device_name, last_notified, last_updated";

fn device_from_row(row: &Row<'_>) -> rusqlite::Result<DeviceRecord> {
    let badge: i64 = row.get(5)?;
    Ok(DeviceRecord {
        user_id: UserId(row.get(0)?),
        token: row.get(1)?,
        notifications_enabled: row.get(2)?,
        time_zone: row.get(3)?,
        utc_offset_hours: row.get(4)?,
        badge_count: u32::try_from(badge).unwrap_or(0),
        platform: row.get(6)?,
        device_id: row.get(7)?,
        device_model: row.get(8)?,
        device_name: row.get(9)?,
        last_notified: opt_ts_column(row, 10)?,
        last_updated: opt_ts_column(row, 11)?,
    })
}

/// Devices with notifications enabled, in insertion order.
pub async fn enabled_devices(db: &Database, user: &UserId) -> Result<Vec<DeviceRecord>, VigilError> {
    let user = user.0.clone();
    db.connection()
        .call(move |conn| {
            let sql = format!(
                "SELECT {DEVICE_COLUMNS} FROM devices
                 WHERE user_id = ?1 AND notifications_enabled = 1
                 ORDER BY rowid ASC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![user], device_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn get_device(
    db: &Database,
    user: &UserId,
    token: &str,
) -> Result<Option<DeviceRecord>, VigilError> {
    let user = user.0.clone();
    let token = token.to_string();
    db.connection()
        .call(move |conn| {
            let sql = format!("SELECT {DEVICE_COLUMNS} FROM devices WHERE user_id = ?1 AND token = ?2");
            conn.query_row(&sql, params![user, token], device_from_row)
                .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// `badge_count = badge_count + 1` in a single statement. `NotFound` when no row matched.
pub async fn increment_badge(
    db: &Database,
    user: &UserId,
    token: &str,
    now: DateTime<Utc>,
) -> Result<(), VigilError> {
    let (u, t) = (user.0.clone(), token.to_string());
    let now = format_ts(now);
    let changed = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE devices SET
                     badge_count = badge_count + 1,
                     last_notified = ?3,
                     last_updated = ?3
                 WHERE user_id = ?1 AND token = ?2",
                params![u, t, now],
            )
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    if changed == 0 {
        return Err(device_not_found(user, token));
    }
    Ok(())
}

pub async fn reset_badge(
    db: &Database,
    user: &UserId,
    token: &str,
    now: DateTime<Utc>,
) -> Result<(), VigilError> {
    let (u, t) = (user.0.clone(), token.to_string());
    let now = format_ts(now);
    let changed = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE devices SET badge_count = 0, last_updated = ?3
                 WHERE user_id = ?1 AND token = ?2",
                params![u, t, now],
            )
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    if changed == 0 {
        return Err(device_not_found(user, token));
    }
    Ok(())
}

/// Inserts or merge-updates a device; registration always resets the badge.
/// Optional fields left unset by the client keep their stored value.
pub async fn upsert_device(
    db: &Database,
    user: &UserId,
    token: &str,
    reg: &DeviceRegistration,
    now: DateTime<Utc>,
) -> Result<(), VigilError> {
    let (u, t) = (user.0.clone(), token.to_string());
    let reg = reg.clone();
    let now = format_ts(now);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO devices (user_id, token, notifications_enabled, time_zone,
                     utc_offset_hours, badge_count, platform, device_id, device_model,
                     device_name, last_updated)
                 VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?7, ?8, ?9, ?10)
                 ON CONFLICT(user_id, token) DO UPDATE SET
                     notifications_enabled = excluded.notifications_enabled,
                     time_zone = COALESCE(excluded.time_zone, devices.time_zone),
                     utc_offset_hours = COALESCE(excluded.utc_offset_hours, devices.utc_offset_hours),
                     badge_count = 0,
                     platform = COALESCE(excluded.platform, devices.platform),
                     device_id = COALESCE(excluded.device_id, devices.device_id),
                     device_model = COALESCE(excluded.device_model, devices.device_model),
                     device_name = COALESCE(excluded.device_name, devices.device_name),
                     last_updated = excluded.last_updated",
                params![
                    u,
                    t,
                    reg.notifications_enabled,
                    reg.time_zone,
                    reg.time_zone_offset,
                    reg.platform,
                    reg.device_id,
                    reg.device_model,
                    reg.device_name,
                    now,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Removes other tokens registered for the same physical device.
pub async fn remove_stale_tokens(
    db: &Database,
    user: &UserId,
    keep_token: &str,
    platform: &str,
    device_id: &str,
) -> Result<usize, VigilError> {
    let (u, keep) = (user.0.clone(), keep_token.to_string());
    let (platform, device_id) = (platform.to_string(), device_id.to_string());
    db.connection()
        .call(move |conn| {
            conn.execute(
                "DELETE FROM devices
                 WHERE user_id = ?1 AND platform = ?2 AND device_id = ?3 AND token <> ?4",
                params![u, platform, device_id, keep],
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn delete_device(db: &Database, user: &UserId, token: &str) -> Result<(), VigilError> {
    let (u, t) = (user.0.clone(), token.to_string());
    db.connection()
        .call(move |conn| {
            conn.execute(
                "DELETE FROM devices WHERE user_id = ?1 AND token = ?2",
                params![u, t],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

fn device_not_found(user: &UserId, token: &str) -> VigilError {
    VigilError::NotFound(format!(
        "device {} for user {user}",
        vigil_core::types::token_prefix(token)
    ))
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

    fn registration(enabled: bool, offset: Option<i32>) -> DeviceRegistration {
        DeviceRegistration {
            notifications_enabled: enabled,
            time_zone: Some("Europe/Berlin".into()),
            time_zone_offset: offset,
            platform: Some("ios".into()),
            device_id: Some("hw-1".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn enabled_devices_filters_and_keeps_order() {
        let (db, _dir) = setup_db().await;
        let u = UserId::from("u1");
        upsert_device(&db, &u, "tok-b", &registration(true, Some(2)), ts(1)).await.unwrap();
        upsert_device(&db, &u, "tok-off", &registration(false, None), ts(1)).await.unwrap();
        upsert_device(&db, &u, "tok-a", &registration(true, None), ts(1)).await.unwrap();

        let devices = enabled_devices(&db, &u).await.unwrap();
        let tokens: Vec<&str> = devices.iter().map(|d| d.token.as_str()).collect();
        assert_eq!(tokens, vec!["tok-b", "tok-a"]);
        assert_eq!(devices[0].utc_offset_hours, Some(2));
        assert_eq!(devices[1].utc_offset_hours, None);
    }

    #[tokio::test]
    async fn increment_and_reset_badge() {
        let (db, _dir) = setup_db().await;
        let u = UserId::from("u1");
        upsert_device(&db, &u, "tok", &registration(true, None), ts(1)).await.unwrap();

        increment_badge(&db, &u, "tok", ts(2)).await.unwrap();
        increment_badge(&db, &u, "tok", ts(3)).await.unwrap();
        let d = get_device(&db, &u, "tok").await.unwrap().unwrap();
        assert_eq!(d.badge_count, 2);
        assert_eq!(d.last_notified, Some(ts(3)));

        reset_badge(&db, &u, "tok", ts(4)).await.unwrap();
        let d = get_device(&db, &u, "tok").await.unwrap().unwrap();
        assert_eq!(d.badge_count, 0);
    }

    #[tokio::test]
    async fn badge_ops_on_missing_device_are_not_found() {
        let (db, _dir) = setup_db().await;
        let u = UserId::from("u1");
        let err = increment_badge(&db, &u, "nope", ts(1)).await.unwrap_err();
        assert!(matches!(err, VigilError::NotFound(_)));
        let err = reset_badge(&db, &u, "nope", ts(1)).await.unwrap_err();
        assert!(matches!(err, VigilError::NotFound(_)));
    }

    #[tokio::test]
    async fn reregistration_keeps_unset_fields_and_resets_badge() {
        let (db, _dir) = setup_db().await;
        let u = UserId::from("u1");
        upsert_device(&db, &u, "tok", &registration(true, Some(-5)), ts(1)).await.unwrap();
        increment_badge(&db, &u, "tok", ts(2)).await.unwrap();

        let update = DeviceRegistration {
            notifications_enabled: true,
            ..Default::default()
        };
        upsert_device(&db, &u, "tok", &update, ts(3)).await.unwrap();

        let d = get_device(&db, &u, "tok").await.unwrap().unwrap();
        assert_eq!(d.badge_count, 0);
        assert_eq!(d.utc_offset_hours, Some(-5));
        assert_eq!(d.platform.as_deref(), Some("ios"));
    }

    #[tokio::test]
    async fn remove_stale_tokens_keeps_current() {
        let (db, _dir) = setup_db().await;
        let u = UserId::from("u1");
        upsert_device(&db, &u, "old", &registration(true, None), ts(1)).await.unwrap();
        upsert_device(&db, &u, "new", &registration(true, None), ts(2)).await.unwrap();

        let removed = remove_stale_tokens(&db, &u, "new", "ios", "hw-1").await.unwrap();
        assert_eq!(removed, 1);
        assert!(get_device(&db, &u, "old").await.unwrap().is_none());
        assert!(get_device(&db, &u, "new").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn delete_missing_device_is_ok() {
        let (db, _dir) = setup_db().await;
        delete_device(&db, &UserId::from("u1"), "ghost").await.unwrap();
    }
}
