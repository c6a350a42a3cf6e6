// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock push sender that captures outgoing messages.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use vigil_core::{
    AdapterType, HealthStatus, PluginAdapter, PushError, PushMessage, PushSender, VigilError,
};

/// Records every send. Tokens marked unregistered fail with
/// [`PushError::TokenNotRegistered`]; tokens marked rejected fail with a
/// generic provider rejection.
pub struct MockPushSender {
    sent: Arc<Mutex<Vec<PushMessage>>>,
    unregistered: Arc<Mutex<HashSet<String>>>,
    rejected: Arc<Mutex<HashSet<String>>>,
}

impl MockPushSender {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            unregistered: Arc::new(Mutex::new(HashSet::new())),
            rejected: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub async fn mark_unregistered(&self, token: &str) {
        self.unregistered.lock().await.insert(token.to_string());
    }

    pub async fn mark_rejected(&self, token: &str) {
        self.rejected.lock().await.insert(token.to_string());
    }

    /// Messages accepted so far, in send order.
    pub async fn sent(&self) -> Vec<PushMessage> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }
}

impl Default for MockPushSender {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockPushSender {
    fn name(&self) -> &str {
        "mock-push"
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
        Ok(())
    }
}

#[async_trait]
impl PushSender for MockPushSender {
    async fn send(&self, message: &PushMessage) -> Result<String, PushError> {
        if self.unregistered.lock().await.contains(&message.token) {
            return Err(PushError::TokenNotRegistered);
        }
        if self.rejected.lock().await.contains(&message.token) {
            return Err(PushError::Rejected {
                status: 500,
                code: Some("INTERNAL".into()),
                message: "mock rejection".into(),
            });
        }
        let mut sent = self.sent.lock().await;
        sent.push(message.clone());
        Ok(format!("projects/mock/messages/{}", sent.len()))
    }
}
