// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across store, provider, and push boundaries.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Opaque user identifier issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        UserId(s.to_string())
    }
}

/// Conversation identifier, unique within a user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(pub String);

impl ConversationId {
    /// Allocates a fresh random conversation id.
    pub fn generate() -> Self {
        ConversationId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConversationId {
    fn from(s: &str) -> Self {
        ConversationId(s.to_string())
    }
}

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// A single message inside a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            timestamp,
        }
    }

    pub fn assistant(content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            timestamp,
        }
    }
}

/// A stored conversation with its full ordered message sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    pub id: ConversationId,
    pub messages: Vec<ChatMessage>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl Conversation {
    /// An empty conversation that has never been written.
    pub fn empty(id: ConversationId) -> Self {
        Self {
            id,
            messages: Vec::new(),
            last_updated: None,
        }
    }

    /// Non-empty user-authored message texts, in message order.
    pub fn user_messages(&self) -> impl Iterator<Item = &str> {
        self.messages
            .iter()
            .filter(|m| m.role == ChatRole::User && !m.content.is_empty())
            .map(|m| m.content.as_str())
    }
}

/// The shape returned to clients by the history endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub id: String,
    pub messages: Vec<ChatMessage>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl From<Conversation> for ConversationSummary {
    fn from(c: Conversation) -> Self {
        Self {
            id: c.id.0,
            messages: c.messages,
            last_updated: c.last_updated,
        }
    }
}

/// A user profile record.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub id: UserId,
    pub email: Option<String>,
    pub message_count: u64,
    pub is_premium: bool,
    pub subscription_tier: Option<String>,
    pub last_active: Option<DateTime<Utc>>,
    /// Last authenticated contact, chat or device registration.
    pub last_seen: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// Premium according to the profile flag or tier alone.
    pub fn profile_premium(&self) -> bool {
        self.is_premium || self.subscription_tier.as_deref() == Some("premium")
    }
}

/// A push-capable device registered by a user.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceRecord {
    pub user_id: UserId,
    pub token: String,
    pub notifications_enabled: bool,
    pub time_zone: Option<String>,
    /// Coarse whole-hour offset from UTC. `None` when the client never reported one.
    pub utc_offset_hours: Option<i32>,
    pub badge_count: u32,
    pub platform: Option<String>,
    pub device_id: Option<String>,
    pub device_model: Option<String>,
    pub device_name: Option<String>,
    pub last_notified: Option<DateTime<Utc>>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl DeviceRecord {
    /// Token prefix safe for logs.
    pub fn token_prefix(&self) -> &str {
        token_prefix(&self.token)
    }
}

/// First ten characters of a push token, for log lines.
pub fn token_prefix(token: &str) -> &str {
    match token.char_indices().nth(10) {
        Some((idx, _)) => &token[..idx],
        None => token,
    }
}

/// Fields a client supplies when registering or refreshing a device.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRegistration {
    pub notifications_enabled: bool,
    #[serde(default)]
    pub time_zone: Option<String>,
    #[serde(default)]
    pub time_zone_offset: Option<i32>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub device_model: Option<String>,
    #[serde(default)]
    pub device_name: Option<String>,
}

/// Delivery channel recorded on a daily quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum QuoteChannel {
    Notification,
    InApp,
}

/// A quote to append to a user's daily-quote history.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDailyQuote {
    pub quote: String,
    pub timestamp: DateTime<Utc>,
    pub channel: QuoteChannel,
    pub is_favorite: bool,
}

/// A stored daily-quote history entry.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyQuote {
    pub id: String,
    pub user_id: UserId,
    pub quote: String,
    pub timestamp: DateTime<Utc>,
    pub channel: QuoteChannel,
    pub is_favorite: bool,
}

impl DailyQuote {
    /// Whether this entry counts as "sent on" the given calendar day.
    ///
    /// Compares the UTC date of the stored timestamp against `day`, which the
    /// dispatcher computes in the user's local time.
    pub fn sent_on(&self, day: NaiveDate) -> bool {
        self.timestamp.date_naive() == day
    }
}

/// APNs-specific delivery options.
#[derive(Debug, Clone, PartialEq)]
pub struct ApnsOptions {
    /// `apns-priority` header; 10 is immediate delivery.
    pub priority: u8,
    pub push_type: String,
    pub sound: String,
    pub content_available: bool,
    pub mutable_content: bool,
}

impl Default for ApnsOptions {
    fn default() -> Self {
        Self {
            priority: 10,
            push_type: "alert".to_string(),
            sound: "default".to_string(),
            content_available: true,
            mutable_content: true,
        }
    }
}

/// Android-specific delivery options.
#[derive(Debug, Clone, PartialEq)]
pub struct AndroidOptions {
    pub high_priority: bool,
    pub channel_id: String,
    pub sound: String,
    pub default_sound: bool,
    pub public_visibility: bool,
}

impl Default for AndroidOptions {
    fn default() -> Self {
        Self {
            high_priority: true,
            channel_id: "daily_quotes".to_string(),
            sound: "default".to_string(),
            default_sound: true,
            public_visibility: true,
        }
    }
}

/// A provider-neutral push notification addressed to one device.
#[derive(Debug, Clone, PartialEq)]
pub struct PushMessage {
    pub token: String,
    pub title: String,
    pub body: String,
    pub data: BTreeMap<String, String>,
    pub badge: u32,
    pub apns: ApnsOptions,
    pub android: AndroidOptions,
}

/// A verified caller identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub email: Option<String>,
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a collaborator trait.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Completion,
    Push,
    Identity,
    Observability,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn chat_role_serializes_lowercase() {
        let json = serde_json::to_string(&ChatRole::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
        let parsed: ChatRole = "user".parse().unwrap();
        assert_eq!(parsed, ChatRole::User);
    }

    #[test]
    fn generated_conversation_ids_are_distinct() {
        let a = ConversationId::generate();
        let b = ConversationId::generate();
        assert_eq!(a.as_str().len(), 36);
        assert_ne!(a, b);
    }

    #[test]
    fn user_messages_skips_assistant_and_empty() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let convo = Conversation {
            id: ConversationId("c1".into()),
            messages: vec![
                ChatMessage::user("first", ts),
                ChatMessage::assistant("reply", ts),
                ChatMessage::user("", ts),
                ChatMessage::user("second", ts),
            ],
            last_updated: Some(ts),
        };
        let texts: Vec<&str> = convo.user_messages().collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[test]
    fn token_prefix_handles_short_tokens() {
        assert_eq!(token_prefix("abc"), "abc");
        assert_eq!(token_prefix("0123456789abcdef"), "0123456789");
    }

    #[test]
    fn sent_on_compares_utc_date() {
        let quote = DailyQuote {
            id: "q1".into(),
            user_id: UserId::from("u1"),
            quote: "peace".into(),
            timestamp: Utc.with_ymd_and_hms(2026, 3, 1, 23, 30, 0).unwrap(),
            channel: QuoteChannel::Notification,
            is_favorite: false,
        };
        assert!(quote.sent_on(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()));
        assert!(!quote.sent_on(NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()));
    }

    #[test]
    fn profile_premium_accepts_flag_or_tier() {
        let base = UserRecord {
            id: UserId::from("u"),
            email: None,
            message_count: 0,
            is_premium: false,
            subscription_tier: None,
            last_active: None,
            last_seen: None,
            created_at: Utc::now(),
        };
        assert!(!base.profile_premium());
        assert!(UserRecord { is_premium: true, ..base.clone() }.profile_premium());
        assert!(
            UserRecord {
                subscription_tier: Some("premium".into()),
                ..base
            }
            .profile_premium()
        );
    }

    #[test]
    fn device_registration_deserializes_camel_case() {
        let json = r#"{"notificationsEnabled":true,"timeZone":"Europe/Rome","timeZoneOffset":2}"#;
        let reg: DeviceRegistration = serde_json::from_str(json).unwrap();
        assert!(reg.notifications_enabled);
        assert_eq!(reg.time_zone.as_deref(), Some("Europe/Rome"));
        assert_eq!(reg.time_zone_offset, Some(2));
        assert!(reg.platform.is_none());
    }
}
