// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Google Gemini adapter implementing [`CompletionProvider`].

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};
use vigil_config::model::GeminiConfig;
use vigil_core::{AdapterType, CompletionProvider, HealthStatus, PluginAdapter, VigilError};

use crate::client::GeminiClient;

/// Gemini text-completion provider.
///
/// API key resolution order: config -> `GEMINI_API_KEY` env var -> error.
pub struct GeminiProvider {
    client: GeminiClient,
}

impl GeminiProvider {
    pub fn new(config: &GeminiConfig) -> Result<Self, VigilError> {
        let api_key = resolve_api_key(config.api_key.as_deref())?;
        let client = GeminiClient::new(
            &api_key,
            config.model.clone(),
            config.base_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )?;
        info!(model = %config.model, "Gemini provider initialized");
        Ok(Self { client })
    }

    /// Wraps an existing client.
    pub fn with_client(client: GeminiClient) -> Self {
        Self { client }
    }
}

fn resolve_api_key(config_key: Option<&str>) -> Result<String, VigilError> {
    match config_key {
        Some(key) if !key.is_empty() => Ok(key.to_string()),
        _ => std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                VigilError::Config(
                    "Gemini API key not found. Set gemini.api_key in config or GEMINI_API_KEY environment variable.".into(),
                )
            }),
    }
}

#[async_trait]
impl PluginAdapter for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Completion
    }

    async fn health_check(&self) -> Result<HealthStatus, VigilError> {
        // No probe call: it would spend quota.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), VigilError> {
        debug!("Gemini provider shutting down");
        Ok(())
    }
}

#[async_trait]
impl CompletionProvider for GeminiProvider {
    async fn complete(&self, prompt: &str) -> Result<String, VigilError> {
        self.client.generate(prompt).await
    }
}
