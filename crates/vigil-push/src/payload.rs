// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! FCM HTTP v1 message payloads.

use serde::Deserialize;
use serde_json::{Value, json};
use vigil_core::PushMessage;

/// Builds the `messages:send` request body for one device.
pub fn send_request(message: &PushMessage) -> Value {
    let apns = &message.apns;
    let android = &message.android;

    let mut aps = json!({
        "alert": {"title": message.title, "body": message.body},
        "badge": message.badge,
        "sound": apns.sound,
    });
    if apns.content_available {
        aps["content-available"] = json!(1);
    }
    if apns.mutable_content {
        aps["mutable-content"] = json!(1);
    }

    let mut android_notification = json!({
        "sound": android.sound,
        "channel_id": android.channel_id,
        "default_sound": android.default_sound,
    });
    if android.public_visibility {
        android_notification["visibility"] = json!("PUBLIC");
    }
    if android.high_priority {
        android_notification["notification_priority"] = json!("PRIORITY_HIGH");
    }

    json!({
        "message": {
            "token": message.token,
            "notification": {"title": message.title, "body": message.body},
            "data": message.data,
            "apns": {
                "headers": {
                    "apns-priority": apns.priority.to_string(),
                    "apns-push-type": apns.push_type,
                },
                "payload": {"aps": aps},
            },
            "android": {
                "priority": if android.high_priority { "high" } else { "normal" },
                "notification": android_notification,
            },
        }
    })
}

/// Successful `messages:send` response.
#[derive(Debug, Deserialize)]
pub struct SendResponse {
    /// `projects/{project}/messages/{id}`.
    pub name: String,
}

/// Google API error envelope.
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub details: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetail {
    #[serde(default)]
    pub error_code: Option<String>,
}

impl ErrorBody {
    /// The FCM-specific error code, e.g. `UNREGISTERED`.
    pub fn fcm_code(&self) -> Option<&str> {
        self.details.iter().find_map(|d| d.error_code.as_deref())
    }
}
