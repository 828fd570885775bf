//! Contextual question answering over stored document content.
//!
//! Unlike summarization there is no retry wrapper: one request per question.

use crate::completion::{CompletionClient, CompletionRequest};
use crate::processing::types::FailureKind;
use std::sync::Arc;

const ANSWER_SYSTEM_PROMPT: &str = "Answer the question based on the provided context.";
/// Prompts above this size are still sent but logged as likely to exceed model limits.
const PROMPT_WARN_CHARS: usize = 4000;

/// Question answerer backed by a chat-completion client.
pub struct QuestionAnswerer {
    client: Arc<dyn CompletionClient>,
    max_tokens: u32,
}

impl QuestionAnswerer {
    /// Create an answerer issuing requests with the given output-token budget.
    pub fn new(client: Arc<dyn CompletionClient>, max_tokens: u32) -> Self {
        Self { client, max_tokens }
    }

    /// Answer `question` using `context` as the only source.
    pub async fn answer(&self, context: &str, question: &str) -> Result<String, FailureKind> {
        if context.trim().is_empty() {
            tracing::error!("Question asked against empty content");
            return Err(FailureKind::EmptyContext);
        }

        let prompt = build_answer_prompt(context, question);
        let prompt_chars = prompt.chars().count();
        if prompt_chars > PROMPT_WARN_CHARS {
            tracing::warn!(
                prompt_chars,
                "Prompt length exceeds typical API limits; consider shortening material content"
            );
        }

        let request = CompletionRequest {
            system: ANSWER_SYSTEM_PROMPT.to_string(),
            user: prompt,
            max_tokens: self.max_tokens,
        };
        let answer = self.client.complete(request).await.map_err(|error| {
            tracing::error!(error = %error, "Answer completion failed");
            error.failure_kind()
        })?;

        let answer = answer.trim();
        if answer.is_empty() {
            tracing::error!("Answer completion was empty");
            return Err(FailureKind::EmptyResponse);
        }
        if answer.to_lowercase().contains("error") {
            tracing::error!(answer = %answer, "Answer completion reported an error");
            return Err(FailureKind::ApiError);
        }

        tracing::info!(answer_chars = answer.chars().count(), "Answer generated");
        Ok(answer.to_string())
    }
}

/// Build the user prompt combining document content and the question.
pub fn build_answer_prompt(context: &str, question: &str) -> String {
    format!("Context:\n{context}\n\nQuestion: {question}")
}
