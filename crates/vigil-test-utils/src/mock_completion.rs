// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock text-completion provider for deterministic testing.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use vigil_core::{AdapterType, CompletionProvider, HealthStatus, PluginAdapter, VigilError};

/// A mock provider that returns pre-configured responses.
///
/// Responses are popped from a FIFO queue. When the queue is empty,
/// a default "mock response" text is returned. Every call, successful or
/// not, is counted and its prompt recorded.
pub struct MockCompletion {
    responses: Arc<Mutex<VecDeque<Result<String, String>>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl MockCompletion {
    pub fn new() -> Self {
        Self::from_queue(VecDeque::new())
    }

    /// Create a mock pre-loaded with successful responses.
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self::from_queue(responses.into_iter().map(Ok).collect())
    }

    /// Create a mock whose every call fails with a provider error.
    pub fn failing() -> Self {
        Self::from_queue(
            std::iter::repeat_n(Err("mock provider down".to_string()), 64).collect(),
        )
    }

    fn from_queue(queue: VecDeque<Result<String, String>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(queue)),
            prompts: Arc::new(Mutex::new(Vec::new())),
            calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    /// Delays every call, for exercising caller timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub async fn add_response(&self, text: impl Into<String>) {
        self.responses.lock().await.push_back(Ok(text.into()));
    }

    pub async fn add_failure(&self, message: impl Into<String>) {
        self.responses.lock().await.push_back(Err(message.into()));
    }

    /// Number of `complete` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received, in call order.
    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }
}

impl Default for MockCompletion {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockCompletion {
    fn name(&self) -> &str {
        "mock-completion"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Completion
    }

    async fn health_check(&self) -> Result<HealthStatus, VigilError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), VigilError> {
        Ok(())
    }
}

#[async_trait]
impl CompletionProvider for MockCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, VigilError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().await.push(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.responses.lock().await.pop_front();
        match next {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(VigilError::Provider {
                message,
                source: None,
            }),
            None => Ok("mock response".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn default_response_when_queue_empty() {
        let provider = MockCompletion::new();
        assert_eq!(provider.complete("hi").await.unwrap(), "mock response");
        assert_eq!(provider.calls(), 1);
        assert_eq!(provider.prompts().await, vec!["hi".to_string()]);
    }

    #[tokio::test]
    async fn queued_responses_returned_in_order() {
        let provider = MockCompletion::with_responses(vec!["first".into(), "second".into()]);
        provider.add_failure("boom").await;

        assert_eq!(provider.complete("a").await.unwrap(), "first");
        assert_eq!(provider.complete("b").await.unwrap(), "second");
        assert!(matches!(
            provider.complete("c").await,
            Err(VigilError::Provider { .. })
        ));
        assert_eq!(provider.complete("d").await.unwrap(), "mock response");
        assert_eq!(provider.calls(), 4);
    }

    #[tokio::test]
    async fn failing_mock_always_errors() {
        let provider = MockCompletion::failing();
        for _ in 0..3 {
            assert!(provider.complete("x").await.is_err());
        }
    }
}
