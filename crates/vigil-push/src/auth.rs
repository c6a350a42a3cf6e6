// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OAuth2 access tokens for the FCM API.
//!
//! Either a static token from config, or one minted from a service account
//! key with the JWT bearer grant and cached until shortly before it expires.

use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};
use vigil_core::PushError;

const FCM_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer";

/// Refresh this long before the reported expiry.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// The fields of a Google service account key file that token minting needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub private_key_id: Option<String>,
    pub private_key: String,
    pub client_email: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn from_json(raw: &str) -> Result<Self, PushError> {
        serde_json::from_str(raw).map_err(|e| transport("invalid service account key", e))
    }
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

struct CachedToken {
    token: String,
    refresh_at: DateTime<Utc>,
}

/// Mints and caches access tokens from a service account key.
pub struct ServiceAccountTokens {
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    http: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountTokens {
    pub fn new(key: ServiceAccountKey, timeout: Duration) -> Result<Self, PushError> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| transport("invalid service account private key", e))?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| transport("failed to build HTTP client", e))?;
        Ok(Self {
            key,
            encoding_key,
            http,
            cached: Mutex::new(None),
        })
    }

    /// Signs the RS256 assertion for the JWT bearer grant.
    fn assertion(&self, now: DateTime<Utc>) -> Result<String, PushError> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();
        let iat = now.timestamp();
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: FCM_SCOPE,
            aud: &self.key.token_uri,
            iat,
            exp: iat + 3600,
        };
        encode(&header, &claims, &self.encoding_key)
            .map_err(|e| transport("failed to sign token assertion", e))
    }

    async fn mint(&self) -> Result<CachedToken, PushError> {
        let now = Utc::now();
        let assertion = self.assertion(now)?;
        // JWT segments are base64url joined by '.', so the assertion needs no escaping.
        let body = format!("grant_type={JWT_BEARER_GRANT}&assertion={assertion}");

        let response = self
            .http
            .post(&self.key.token_uri)
            .header("content-type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .map_err(|e| transport("token request failed", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PushError::Transport {
                message: format!("token endpoint returned {status}: {body}"),
                source: None,
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| transport("failed to parse token response", e))?;
        info!(expires_in = token.expires_in, "minted FCM access token");
        Ok(CachedToken {
            token: token.access_token,
            refresh_at: now + chrono::Duration::seconds(token.expires_in - EXPIRY_MARGIN_SECS),
        })
    }

    pub async fn access_token(&self) -> Result<String, PushError> {
        let mut cached = self.cached.lock().await;
        if let Some(existing) = cached.as_ref() {
            if Utc::now() < existing.refresh_at {
                return Ok(existing.token.clone());
            }
            debug!("cached FCM access token is due for refresh");
        }
        let fresh = self.mint().await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }

    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }
}

/// Where access tokens come from.
pub enum TokenSource {
    Static(String),
    ServiceAccount(Box<ServiceAccountTokens>),
}

impl TokenSource {
    pub async fn access_token(&self) -> Result<String, PushError> {
        match self {
            TokenSource::Static(token) => Ok(token.clone()),
            TokenSource::ServiceAccount(tokens) => tokens.access_token().await,
        }
    }

    /// Drops a cached token after the API rejected it.
    pub async fn invalidate(&self) {
        if let TokenSource::ServiceAccount(tokens) = self {
            tokens.invalidate().await;
        }
    }
}

fn transport(
    message: &str,
    e: impl std::error::Error + Send + Sync + 'static,
) -> PushError {
    PushError::Transport {
        message: format!("{message}: {e}"),
        source: Some(Box::new(e)),
    }
}
