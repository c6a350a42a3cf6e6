// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation documents.
//!
//! Messages are stored as a JSON array per conversation. Reads decode that
//! array leniently: entries with an unknown role are dropped, a missing
//! timestamp falls back to the conversation's last-updated time, and a
//! document that is not valid JSON reads as an empty sequence.

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, params};
use serde::Deserialize;
use tracing::warn;
use vigil_core::{ChatMessage, ChatRole, Conversation, ConversationId, UserId, VigilError};

use crate::database::{Database, format_ts, parse_ts};

/// Raw row: id, messages JSON, last_updated.
type RawConversation = (String, String, Option<String>);

/// Loosely shaped message as found in stored documents.
#[derive(Deserialize)]
struct StoredMessage {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
}

/// Decodes a stored message array into the tagged schema.
pub fn decode_messages(
    raw: &str,
    fallback_ts: DateTime<Utc>,
    conversation: &str,
) -> Vec<ChatMessage> {
    let stored: Vec<StoredMessage> = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            warn!(conversation, error = %e, "conversation document is not a message array; reading as empty");
            return Vec::new();
        }
    };

    stored
        .into_iter()
        .filter_map(|m| {
            let role = match m.role.as_deref().map(str::parse::<ChatRole>) {
                Some(Ok(role)) => role,
                _ => {
                    warn!(conversation, role = ?m.role, "dropping message with unknown role");
                    return None;
                }
            };
            Some(ChatMessage {
                role,
                content: m.content.unwrap_or_default(),
                timestamp: m.timestamp.as_deref().and_then(parse_ts).unwrap_or(fallback_ts),
            })
        })
        .collect()
}

fn encode_messages(messages: &[ChatMessage]) -> Result<String, VigilError> {
    let values: Vec<serde_json::Value> = messages
        .iter()
        .map(|m| {
            serde_json::json!({
                "role": m.role.to_string(),
                "content": m.content,
                "timestamp": format_ts(m.timestamp),
            })
        })
        .collect();
    serde_json::to_string(&values).map_err(VigilError::storage)
}

fn into_conversation((id, messages, last_updated): RawConversation) -> Conversation {
    let last_updated = last_updated.as_deref().and_then(parse_ts);
    let fallback = last_updated.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    Conversation {
        messages: decode_messages(&messages, fallback, &id),
        id: ConversationId(id),
        last_updated,
    }
}

pub async fn get_conversation(
    db: &Database,
    user: &UserId,
    id: &ConversationId,
) -> Result<Option<Conversation>, VigilError> {
    let user = user.0.clone();
    let id = id.0.clone();
    let raw: Option<RawConversation> = db
        .connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT id, messages, last_updated FROM conversations
                 WHERE user_id = ?1 AND id = ?2",
                params![user, id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    Ok(raw.map(into_conversation))
}

/// Replaces the message sequence and last-updated stamp, creating the row if needed.
pub async fn save_messages(
    db: &Database,
    user: &UserId,
    id: &ConversationId,
    messages: &[ChatMessage],
    updated: DateTime<Utc>,
) -> Result<(), VigilError> {
    let encoded = encode_messages(messages)?;
    let user = user.0.clone();
    let id = id.0.clone();
    let updated = format_ts(updated);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO conversations (user_id, id, messages, last_updated)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(user_id, id) DO UPDATE SET
                     messages = excluded.messages,
                     last_updated = excluded.last_updated",
                params![user, id, encoded, updated],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Most recently updated conversations first.
pub async fn recent_conversations(
    db: &Database,
    user: &UserId,
    limit: usize,
) -> Result<Vec<Conversation>, VigilError> {
    let user = user.0.clone();
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let rows: Vec<RawConversation> = db
        .connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, messages, last_updated FROM conversations
                 WHERE user_id = ?1
                 ORDER BY last_updated DESC
                 LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![user, limit], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)?;
    Ok(rows.into_iter().map(into_conversation).collect())
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

    /// Writes a document body verbatim, bypassing message encoding.
    async fn write_raw_document(
        db: &Database,
        user: &UserId,
        id: &ConversationId,
        messages_json: &str,
        updated: DateTime<Utc>,
    ) {
        let user = user.0.clone();
        let id = id.0.clone();
        let messages_json = messages_json.to_string();
        let updated = format_ts(updated);
        db.connection()
            .call(move |conn| {
                conn.execute(
                    "INSERT OR REPLACE INTO conversations (user_id, id, messages, last_updated)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![user, id, messages_json, updated],
                )
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn save_then_get_preserves_order() {
        let (db, _dir) = setup_db().await;
        let user = UserId::from("u1");
        let id = ConversationId("c1".into());
        let messages = vec![
            ChatMessage::user("hello", ts(1)),
            ChatMessage::assistant("hi", ts(1)),
        ];
        save_messages(&db, &user, &id, &messages, ts(1)).await.unwrap();

        let convo = get_conversation(&db, &user, &id).await.unwrap().unwrap();
        assert_eq!(convo.messages, messages);
        assert_eq!(convo.last_updated, Some(ts(1)));
    }

    #[tokio::test]
    async fn conversations_are_scoped_per_user() {
        let (db, _dir) = setup_db().await;
        let id = ConversationId("shared".into());
        save_messages(&db, &UserId::from("a"), &id, &[], ts(1)).await.unwrap();
        assert!(
            get_conversation(&db, &UserId::from("b"), &id)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn recent_conversations_newest_first_and_limited() {
        let (db, _dir) = setup_db().await;
        let user = UserId::from("u1");
        for h in [3, 1, 5, 2] {
            let id = ConversationId(format!("c{h}"));
            save_messages(&db, &user, &id, &[], ts(h)).await.unwrap();
        }
        let recent = recent_conversations(&db, &user, 3).await.unwrap();
        let ids: Vec<&str> = recent.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c5", "c3", "c2"]);
    }

    #[tracing_test::traced_test]
    #[tokio::test]
    async fn corrupt_document_reads_as_empty() {
        let (db, _dir) = setup_db().await;
        let user = UserId::from("u1");
        let id = ConversationId("broken".into());
        write_raw_document(&db, &user, &id, "{not json", ts(2)).await;

        let convo = get_conversation(&db, &user, &id).await.unwrap().unwrap();
        assert!(convo.messages.is_empty());
        assert!(logs_contain("reading as empty"));
    }

    #[test]
    fn decode_drops_unknown_roles_and_defaults_timestamps() {
        let raw = r#"[
            {"role": "user", "content": "a", "timestamp": "2026-04-01T01:00:00.000Z"},
            {"role": "system", "content": "b"},
            {"content": "c"},
            {"role": "assistant"}
        ]"#;
        let decoded = decode_messages(raw, ts(9), "c1");
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].content, "a");
        assert_eq!(decoded[0].timestamp, ts(1));
        assert_eq!(decoded[1].role, ChatRole::Assistant);
        assert_eq!(decoded[1].content, "");
        assert_eq!(decoded[1].timestamp, ts(9));
    }
}
