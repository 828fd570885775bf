//! Bounded retry loop around [`SummaryGenerator`].

use crate::processing::summarize::SummaryGenerator;
use crate::processing::types::{AttemptOutcome, ParsedSummary, SummaryResult};

/// Attempt budget and minimum-length gate for summarization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts; values below one are treated as one.
    pub max_attempts: usize,
    /// Texts with fewer characters than this are never sent to the model.
    pub min_chars: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            min_chars: 30,
        }
    }
}

/// Summarize `text`, retrying transient failures up to the policy's attempt budget.
///
/// Texts shorter than `min_chars` short-circuit to the fixed "too short" summary without any
/// call. Non-retryable failures return immediately; when the budget runs out the last attempt's
/// outcome is returned. There is no delay between attempts.
pub async fn summarize_with_retry<G>(
    generator: &G,
    text: &str,
    policy: RetryPolicy,
) -> AttemptOutcome
where
    G: SummaryGenerator + ?Sized,
{
    if text.chars().count() < policy.min_chars {
        tracing::info!(
            chars = text.chars().count(),
            min_chars = policy.min_chars,
            "Skipping summarization for short content"
        );
        return AttemptOutcome::Success(SummaryResult {
            parsed: ParsedSummary::too_short(),
            raw: None,
        });
    }

    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0usize;
    loop {
        attempt += 1;
        tracing::info!(attempt, max_attempts, "Summarization attempt");

        let outcome = generator.summarize(text).await;
        let kind = match outcome.failure() {
            None => return outcome,
            Some(kind) => kind,
        };

        if !kind.is_retryable() {
            tracing::error!(attempt, ?kind, "Summarization failed with a fatal error");
            return outcome;
        }
        if attempt >= max_attempts {
            tracing::error!(attempt, ?kind, "Summarization attempts exhausted");
            return outcome;
        }
        tracing::warn!(attempt, ?kind, "Summarization attempt failed; retrying");
    }
}
