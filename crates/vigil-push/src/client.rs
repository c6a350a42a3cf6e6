// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the FCM `messages:send` endpoint.

use std::time::Duration;

use tracing::{debug, warn};
use vigil_core::types::token_prefix;
use vigil_core::{PushError, PushMessage};

use crate::auth::TokenSource;
use crate::payload::{self, ErrorEnvelope, SendResponse};

/// FCM error code for a token that is no longer valid.
const UNREGISTERED: &str = "UNREGISTERED";

pub struct FcmClient {
    http: reqwest::Client,
    tokens: TokenSource,
    send_url: String,
}

impl FcmClient {
    pub fn new(
        base_url: &str,
        project_id: &str,
        tokens: TokenSource,
        timeout: Duration,
    ) -> Result<Self, PushError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PushError::Transport {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            http,
            tokens,
            send_url: format!(
                "{}/v1/projects/{project_id}/messages:send",
                base_url.trim_end_matches('/')
            ),
        })
    }

    /// Sends one message. Returns the provider message name on success.
    pub async fn send(&self, message: &PushMessage) -> Result<String, PushError> {
        let access_token = self.tokens.access_token().await?;
        let body = payload::send_request(message);

        let response = self
            .http
            .post(&self.send_url)
            .bearer_auth(&access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| PushError::Transport {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, token = token_prefix(&message.token), "FCM response received");

        if status.is_success() {
            let sent: SendResponse = response.json().await.map_err(|e| PushError::Transport {
                message: format!("failed to parse FCM response: {e}"),
                source: Some(Box::new(e)),
            })?;
            return Ok(sent.name);
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            warn!("FCM rejected the access token; dropping cached token");
            self.tokens.invalidate().await;
        }

        let raw = response.text().await.unwrap_or_default();
        Err(classify_error(status.as_u16(), &raw))
    }
}

/// Maps an FCM error response onto [`PushError`].
pub fn classify_error(status: u16, raw: &str) -> PushError {
    match serde_json::from_str::<ErrorEnvelope>(raw) {
        Ok(envelope) => {
            let code = envelope.error.fcm_code().map(str::to_string);
            if code.as_deref() == Some(UNREGISTERED) {
                return PushError::TokenNotRegistered;
            }
            PushError::Rejected {
                status,
                code: code.or_else(|| Some(envelope.error.status.clone()).filter(|s| !s.is_empty())),
                message: envelope.error.message,
            }
        }
        Err(_) => PushError::Rejected {
            status,
            code: None,
            message: raw.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use vigil_core::types::{AndroidOptions, ApnsOptions};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn message(token: &str) -> PushMessage {
        PushMessage {
            token: token.into(),
            title: "t".into(),
            body: "b".into(),
            data: BTreeMap::new(),
            badge: 1,
            apns: ApnsOptions::default(),
            android: AndroidOptions::default(),
        }
    }

    fn client(server: &MockServer) -> FcmClient {
        FcmClient::new(
            &server.uri(),
            "demo",
            TokenSource::Static("static-token".into()),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn send_posts_message_with_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/projects/demo/messages:send"))
            .and(header("authorization", "Bearer static-token"))
            .and(body_partial_json(serde_json::json!({"message": {"token": "tok-1"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "projects/demo/messages/0:123"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let id = client(&server).send(&message("tok-1")).await.unwrap();
        assert_eq!(id, "projects/demo/messages/0:123");
    }

    #[tokio::test]
    async fn unregistered_token_is_distinguished() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": {"code": 404, "message": "Requested entity was not found.", "status": "NOT_FOUND",
                          "details": [{"@type": "type.googleapis.com/google.firebase.fcm.v1.FcmError",
                                       "errorCode": "UNREGISTERED"}]}
            })))
            .mount(&server)
            .await;

        let err = client(&server).send(&message("dead")).await.unwrap_err();
        assert!(err.is_token_invalid());
    }

    #[tokio::test]
    async fn other_rejections_keep_the_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_json(serde_json::json!({
                "error": {"code": 503, "message": "Service unavailable", "status": "UNAVAILABLE"}
            })))
            .mount(&server)
            .await;

        let err = client(&server).send(&message("tok")).await.unwrap_err();
        assert!(!err.is_token_invalid());
        match err {
            PushError::Rejected { status, code, .. } => {
                assert_eq!(status, 503);
                assert_eq!(code.as_deref(), Some("UNAVAILABLE"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unparseable_error_body_is_rejected_verbatim() {
        let err = classify_error(500, "<html>oops</html>");
        match err {
            PushError::Rejected { message, code, .. } => {
                assert_eq!(message, "<html>oops</html>");
                assert!(code.is_none());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
