// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Short inspirational quote generation with a static fallback.

use std::sync::Arc;

use tracing::{debug, warn};
use vigil_core::CompletionProvider;

/// Returned whenever the completion call fails.
pub const FALLBACK_QUOTE: &str =
    "Reflect on your spiritual journey today. Each step brings you closer to understanding.";

/// Longest quote returned, in characters.
pub const MAX_QUOTE_CHARS: usize = 150;

const ELLIPSIS: &str = "...";

pub struct QuoteGenerator {
    provider: Arc<dyn CompletionProvider>,
}

impl QuoteGenerator {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self { provider }
    }

    /// Generates a quote, personalized when `recent_messages` is non-empty.
    ///
    /// Makes exactly one completion call and never fails.
    pub async fn generate_quote(&self, recent_messages: &[String]) -> String {
        let prompt = build_prompt(recent_messages);
        debug!(
            personalized = !recent_messages.is_empty(),
            "requesting quote"
        );
        match self.provider.complete(&prompt).await {
            Ok(text) => finalize_quote(&text),
            Err(e) => {
                warn!(error = %e, "quote generation failed; using fallback");
                FALLBACK_QUOTE.to_string()
            }
        }
    }
}

/// Builds the completion prompt.
pub fn build_prompt(recent_messages: &[String]) -> String {
    if recent_messages.is_empty() {
        return "Create a short, uplifting spiritual or biblical quote or message \
                (max 100 characters) that would be meaningful to send as a daily \
                notification to a user of a spiritual app. Include only the quote \
                text without quotation marks or attribution."
            .to_string();
    }

    let quoted = recent_messages
        .iter()
        .map(|m| format!("\"{m}\""))
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "Based on these previous messages from a user of a spiritual app: {quoted}, \
         create a short, uplifting spiritual quote or message (max 100 characters) \
         that would be meaningful to them. The quote should be general enough to be \
         appropriate as a daily notification. Include only the quote text without \
         quotation marks or attribution."
    )
}

/// Trims model output and caps it at [`MAX_QUOTE_CHARS`].
pub fn finalize_quote(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.chars().count() <= MAX_QUOTE_CHARS {
        return trimmed.to_string();
    }
    let keep = MAX_QUOTE_CHARS - ELLIPSIS.len();
    let mut out: String = trimmed.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use vigil_test_utils::MockCompletion;

    #[tokio::test]
    async fn personalized_prompt_mentions_messages() {
        let provider = Arc::new(MockCompletion::with_responses(vec![
            "  Peace be with you.  ".into(),
        ]));
        let generator = QuoteGenerator::new(provider.clone());

        let quote = generator
            .generate_quote(&["I feel lost".into(), "help me forgive".into()])
            .await;

        assert_eq!(quote, "Peace be with you.");
        let prompts = provider.prompts().await;
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("\"I feel lost\" \"help me forgive\""));
        assert!(prompts[0].contains("max 100 characters"));
    }

    #[tokio::test]
    async fn generic_prompt_without_messages() {
        let provider = Arc::new(MockCompletion::new());
        let generator = QuoteGenerator::new(provider.clone());
        generator.generate_quote(&[]).await;
        let prompts = provider.prompts().await;
        assert!(prompts[0].starts_with("Create a short, uplifting"));
    }

    #[tokio::test]
    async fn failure_yields_fallback() {
        let generator = QuoteGenerator::new(Arc::new(MockCompletion::failing()));
        assert_eq!(generator.generate_quote(&[]).await, FALLBACK_QUOTE);
    }

    #[test]
    fn long_output_is_cut_to_150() {
        let raw = "a".repeat(200);
        let quote = finalize_quote(&raw);
        assert_eq!(quote.chars().count(), 150);
        assert!(quote.ends_with("..."));
        assert_eq!(&quote[..147], &raw[..147]);
    }

    #[test]
    fn exactly_150_is_untouched() {
        let raw = "b".repeat(150);
        assert_eq!(finalize_quote(&raw), raw);
    }

    proptest! {
        #[test]
        fn finalized_quote_never_exceeds_limit(raw in "\\PC{0,400}") {
            let quote = finalize_quote(&raw);
            prop_assert!(quote.chars().count() <= MAX_QUOTE_CHARS);
            prop_assert_eq!(quote.trim_start(), quote.as_str());
        }
    }
}
