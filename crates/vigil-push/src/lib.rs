// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Firebase Cloud Messaging adapter implementing [`PushSender`].
//!
//! Sends through the FCM HTTP v1 API. Access tokens come from a static
//! config value or are minted from a service account key.

pub mod auth;
pub mod client;
pub mod payload;

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};
use vigil_config::model::PushConfig;
use vigil_core::{
    AdapterType, HealthStatus, PluginAdapter, PushError, PushMessage, PushSender, VigilError,
};

use crate::auth::{ServiceAccountKey, ServiceAccountTokens, TokenSource};
use crate::client::FcmClient;

pub struct FcmPushSender {
    client: FcmClient,
    project_id: String,
}

impl FcmPushSender {
    /// Builds the sender from config, reading the service account key if one is configured.
    pub async fn new(config: &PushConfig) -> Result<Self, VigilError> {
        let timeout = Duration::from_secs(config.timeout_secs);

        let key = match &config.service_account_path {
            Some(path) => {
                let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
                    VigilError::Config(format!("cannot read push.service_account_path `{path}`: {e}"))
                })?;
                Some(ServiceAccountKey::from_json(&raw)?)
            }
            None => None,
        };

        let project_id = config
            .project_id
            .clone()
            .or_else(|| key.as_ref().and_then(|k| k.project_id.clone()))
            .ok_or_else(|| {
                VigilError::Config(
                    "push.project_id is required when the service account key does not carry one"
                        .into(),
                )
            })?;

        let tokens = match (&config.access_token, key) {
            (Some(token), _) if !token.is_empty() => TokenSource::Static(token.clone()),
            (_, Some(key)) => {
                TokenSource::ServiceAccount(Box::new(ServiceAccountTokens::new(key, timeout)?))
            }
            _ => {
                return Err(VigilError::Config(
                    "set push.access_token or push.service_account_path".into(),
                ));
            }
        };

        let client = FcmClient::new(&config.base_url, &project_id, tokens, timeout)?;
        info!(project = %project_id, "FCM push sender initialized");
        Ok(Self { client, project_id })
    }
}

#[async_trait]
impl PluginAdapter for FcmPushSender {
    fn name(&self) -> &str {
        "fcm"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Push
    }

    async fn health_check(&self) -> Result<HealthStatus, VigilError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), VigilError> {
        debug!(project = %self.project_id, "FCM push sender shutting down");
        Ok(())
    }
}

#[async_trait]
impl PushSender for FcmPushSender {
    async fn send(&self, message: &PushMessage) -> Result<String, PushError> {
        self.client.send(message).await
    }
}
