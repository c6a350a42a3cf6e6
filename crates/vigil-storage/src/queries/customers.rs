// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Billing mirror records.
//!
//! The `subscriptions` column holds the billing provider's JSON document as
//! mirrored, keyed by product id:
//! `{ "<product>": { "entitlements": { "<name>": { "active": true } } } }`.

use rusqlite::{OptionalExtension, params};
use vigil_core::{UserId, VigilError};

use crate::database::Database;

/// Whether `subscriptions[product].entitlements[entitlement].active` is `true`.
pub async fn entitlement_active(
    db: &Database,
    user: &UserId,
    product: &str,
    entitlement: &str,
) -> Result<bool, VigilError> {
    let id = user.0.clone();
    let raw: Option<String> = db
        .connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT subscriptions FROM customers WHERE user_id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)?;

    let Some(raw) = raw else {
        return Ok(false);
    };
    let doc: serde_json::Value = serde_json::from_str(&raw).map_err(VigilError::storage)?;
    Ok(doc
        .get(product)
        .and_then(|p| p.get("entitlements"))
        .and_then(|e| e.get(entitlement))
        .and_then(|e| e.get("active"))
        .and_then(serde_json::Value::as_bool)
        == Some(true))
}

/// Replaces the mirrored subscriptions document.
pub async fn put_subscriptions(
    db: &Database,
    user: &UserId,
    subscriptions: &serde_json::Value,
) -> Result<(), VigilError> {
    let id = user.0.clone();
    let doc = serde_json::to_string(subscriptions).map_err(VigilError::storage)?;
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO customers (user_id, subscriptions) VALUES (?1, ?2)
                 ON CONFLICT(user_id) DO UPDATE SET
                     subscriptions = excluded.subscriptions,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![id, doc],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn active_entitlement_is_detected() {
        let (db, _dir) = setup_db().await;
        let u = UserId::from("u1");
        put_subscriptions(
            &db,
            &u,
            &json!({"prod": {"entitlements": {"Premium": {"active": true}}}}),
        )
        .await
        .unwrap();

        assert!(entitlement_active(&db, &u, "prod", "Premium").await.unwrap());
        assert!(!entitlement_active(&db, &u, "prod", "Other").await.unwrap());
        assert!(!entitlement_active(&db, &u, "other", "Premium").await.unwrap());
    }

    #[tokio::test]
    async fn truthy_but_not_true_is_inactive() {
        let (db, _dir) = setup_db().await;
        let u = UserId::from("u1");
        put_subscriptions(
            &db,
            &u,
            &json!({"prod": {"entitlements": {"Premium": {"active": "yes"}}}}),
        )
        .await
        .unwrap();
        assert!(!entitlement_active(&db, &u, "prod", "Premium").await.unwrap());
    }

    #[tokio::test]
    async fn missing_customer_is_inactive() {
        let (db, _dir) = setup_db().await;
        assert!(
            !entitlement_active(&db, &UserId::from("nobody"), "prod", "Premium")
                .await
                .unwrap()
        );
    }
}
