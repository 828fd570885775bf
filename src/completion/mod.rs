//! Chat-completion transport for OpenAI-compatible providers.
//!
//! The processing layer only sees the [`CompletionClient`] trait: one request in, the text of
//! the first choice out. The HTTP adapter lives here together with its wire types so prompt
//! construction and response parsing can be exercised against test doubles.

mod types;

pub use types::{ChatMessage, ChatRequestBody, ChatResponseBody, CompletionRequest};

use crate::config::Config;
use crate::processing::FailureKind;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the completion transport.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// No API key was configured, so no request was attempted.
    #[error("API credential is not configured")]
    MissingCredential,
    /// HTTP layer failed before receiving a response (includes timeouts).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Provider answered with a non-success status.
    #[error("Provider returned {status}: {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the provider.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// Provider response could not be decoded.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

impl CompletionError {
    /// Classify a transport error into the pipeline failure taxonomy.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::MissingCredential => FailureKind::MissingCredential,
            Self::Http(_) | Self::UnexpectedStatus { .. } | Self::InvalidResponse(_) => {
                FailureKind::ApiError
            }
        }
    }
}

/// Interface implemented by chat-completion backends.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Issue one completion and return the first choice's message text.
    ///
    /// A response without content yields an empty string; callers decide whether that is a
    /// failure.
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError>;
}

/// Completion client speaking the OpenAI `chat/completions` protocol.
pub struct OpenAiCompletionClient {
    http: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiCompletionClient {
    /// Construct a client with an explicit credential, endpoint, and timeout.
    pub fn new(
        api_key: Option<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, CompletionError> {
        let http = Client::builder()
            .user_agent("studymate/0.1")
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            model: model.into(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }

    /// Build a client from runtime configuration.
    pub fn from_config(config: &Config) -> Result<Self, CompletionError> {
        let client = Self::new(
            config.openai_api_key.clone(),
            config.openai_base_url.clone(),
            config.openai_model.clone(),
            Duration::from_secs(config.llm_timeout_secs),
        )?;
        tracing::debug!(
            url = %client.endpoint(),
            model = %client.model,
            has_api_key = client.api_key.is_some(),
            "Initialized completion client"
        );
        Ok(client)
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompletionClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::error!("Completion requested without an API key");
            return Err(CompletionError::MissingCredential);
        };

        let body = ChatRequestBody::new(&self.model, &request);
        tracing::debug!(
            model = %self.model,
            max_tokens = request.max_tokens,
            prompt_chars = request.user.chars().count(),
            "Sending completion request"
        );

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, body = %body, "Completion request failed");
            return Err(CompletionError::UnexpectedStatus { status, body });
        }

        let payload: ChatResponseBody = response.json().await.map_err(|error| {
            CompletionError::InvalidResponse(format!("failed to decode completion: {error}"))
        })?;
        let content = payload.first_content();
        tracing::debug!(
            %status,
            content_chars = content.chars().count(),
            "Completion received"
        );
        Ok(content)
    }
}
