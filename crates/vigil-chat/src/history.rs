// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat history reader.

use std::sync::Arc;

use tracing::warn;
use vigil_core::{ConversationSummary, DocumentStore, Identity, VigilError};

pub struct HistoryReader {
    store: Arc<dyn DocumentStore>,
    limit: usize,
}

impl HistoryReader {
    pub fn new(store: Arc<dyn DocumentStore>, limit: usize) -> Self {
        Self { store, limit }
    }

    /// Most recently updated conversations first, at most `limit`.
    ///
    /// Storage failures produce an empty list. Only a missing caller is an error.
    pub async fn get_history(
        &self,
        caller: Option<&Identity>,
    ) -> Result<Vec<ConversationSummary>, VigilError> {
        let caller = caller
            .ok_or_else(|| VigilError::Unauthenticated("authentication required".into()))?;

        match self
            .store
            .recent_conversations(&caller.user_id, self.limit)
            .await
        {
            Ok(conversations) => Ok(conversations
                .into_iter()
                .map(ConversationSummary::from)
                .collect()),
            Err(e) => {
                warn!(user = %caller.user_id, error = %e, "history read failed; returning empty list");
                Ok(Vec::new())
            }
        }
    }
}
