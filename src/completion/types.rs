//! Wire types for the `chat/completions` endpoint.

use serde::{Deserialize, Serialize};

/// Provider-agnostic completion request assembled by the processing pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    /// Instruction sent with the `system` role.
    pub system: String,
    /// Prompt sent with the `user` role.
    pub user: String,
    /// Output-token budget.
    pub max_tokens: u32,
}

/// Single chat message in a request body.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChatMessage {
    /// `system` or `user`.
    pub role: &'static str,
    /// Message text.
    pub content: String,
}

/// JSON body posted to the provider.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequestBody {
    /// Model identifier.
    pub model: String,
    /// Ordered messages: system first, then user.
    pub messages: Vec<ChatMessage>,
    /// Output-token budget.
    pub max_tokens: u32,
}

impl ChatRequestBody {
    /// Build the provider payload for `request` against `model`.
    pub fn new(model: &str, request: &CompletionRequest) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: request.system.clone(),
                },
                ChatMessage {
                    role: "user",
                    content: request.user.clone(),
                },
            ],
            max_tokens: request.max_tokens,
        }
    }
}

/// Subset of the provider response the pipeline reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatResponseBody {
    /// Generated choices, best first.
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

/// One generated choice.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatChoice {
    /// Message produced for this choice.
    #[serde(default)]
    pub message: Option<ChatChoiceMessage>,
}

/// Message payload of a choice.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatChoiceMessage {
    /// Generated text; providers may send `null`.
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatResponseBody {
    /// Text of `choices[0].message.content`, or an empty string when absent.
    pub fn first_content(self) -> String {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_body_orders_system_before_user() {
        let body = ChatRequestBody::new(
            "gpt-3.5-turbo",
            &CompletionRequest {
                system: "sys".into(),
                user: "usr".into(),
                max_tokens: 300,
            },
        );
        let value = serde_json::to_value(&body).expect("serialize");
        assert_eq!(
            value,
            json!({
                "model": "gpt-3.5-turbo",
                "messages": [
                    { "role": "system", "content": "sys" },
                    { "role": "user", "content": "usr" }
                ],
                "max_tokens": 300
            })
        );
    }

    #[test]
    fn first_content_tolerates_missing_fields() {
        let empty: ChatResponseBody = serde_json::from_value(json!({})).expect("empty");
        assert_eq!(empty.first_content(), "");

        let no_message: ChatResponseBody =
            serde_json::from_value(json!({ "choices": [{}] })).expect("no message");
        assert_eq!(no_message.first_content(), "");
    }
}
