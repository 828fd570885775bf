//! Single-attempt summarization: prompt construction, one completion call, classification.

use crate::completion::{CompletionClient, CompletionRequest};
use crate::processing::bullets::parse_bullet_summary;
use crate::processing::types::{AttemptOutcome, FailureKind, SummaryResult};
use async_trait::async_trait;
use std::sync::Arc;

const SUMMARY_SYSTEM_PROMPT: &str = "You are an AI summarizer.";

/// One summarization attempt, abstracted so the retry loop can be driven by test doubles.
#[async_trait]
pub trait SummaryGenerator: Send + Sync {
    /// Attempt to summarize `text` exactly once.
    async fn summarize(&self, text: &str) -> AttemptOutcome;
}

/// Summarizer backed by a chat-completion client.
pub struct Summarizer {
    client: Arc<dyn CompletionClient>,
    max_tokens: u32,
}

impl Summarizer {
    /// Create a summarizer issuing requests with the given output-token budget.
    pub fn new(client: Arc<dyn CompletionClient>, max_tokens: u32) -> Self {
        Self { client, max_tokens }
    }
}

#[async_trait]
impl SummaryGenerator for Summarizer {
    async fn summarize(&self, text: &str) -> AttemptOutcome {
        let request = CompletionRequest {
            system: SUMMARY_SYSTEM_PROMPT.to_string(),
            user: build_summary_prompt(text),
            max_tokens: self.max_tokens,
        };

        let content = match self.client.complete(request).await {
            Ok(content) => content,
            Err(error) => {
                let kind = error.failure_kind();
                tracing::warn!(error = %error, ?kind, "Summary completion failed");
                return AttemptOutcome::Failure(kind);
            }
        };

        let content = content.trim();
        if content.is_empty() {
            tracing::warn!("Summary completion was empty");
            return AttemptOutcome::Failure(FailureKind::EmptyResponse);
        }

        let parsed = parse_bullet_summary(content);
        tracing::info!(
            paragraph_chars = parsed.paragraph.chars().count(),
            bullets = parsed.bullets.len(),
            "Summary parsed"
        );
        AttemptOutcome::Success(SummaryResult {
            parsed,
            raw: Some(content.to_string()),
        })
    }
}

/// Build the fixed summary prompt around the document text.
pub fn build_summary_prompt(text: &str) -> String {
    format!(
        "Please summarize the following content in two parts:\n\n\
         1. A detailed and informative paragraph summary that covers key points thoroughly.\n\
         2. Exactly 3 to 5 bullet points, each starting with a dash (-) and on a new line.\n\n\
         Example:\n\
         This is a detailed summary paragraph that explains the main ideas clearly and with depth.\n\n\
         - Bullet point one\n\
         - Bullet point two\n\
         - Bullet point three\n\n\
         Now summarize the content below:\n{text}"
    )
}
