// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text-completion provider trait.

use async_trait::async_trait;

use crate::error::VigilError;

/// A black-box generative text model.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Sends a single prompt and returns the generated text.
    async fn complete(&self, prompt: &str) -> Result<String, VigilError>;
}
