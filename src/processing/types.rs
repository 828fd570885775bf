//! Core data types and error definitions for the study pipeline.

use crate::processing::extract::ExtractError;
use crate::store::StoreError;
use serde::Serialize;
use thiserror::Error;

/// Paragraph stored when a document is too short to be worth a model call.
pub const TOO_SHORT_SUMMARY: &str = "Content too short for meaningful summary.";

/// Failure classification shared by the summarization and question-answering paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FailureKind {
    /// No API credential configured.
    #[error("API credential is not configured")]
    MissingCredential,
    /// Transport failure, timeout, or non-success status from the provider.
    #[error("language model request failed")]
    ApiError,
    /// Provider answered without usable text.
    #[error("language model returned an empty response")]
    EmptyResponse,
    /// Question asked against a document without stored content.
    #[error("document has no content to answer from")]
    EmptyContext,
    /// Input that the extraction step cannot handle.
    #[error("unsupported input")]
    UnsupportedInput,
}

impl FailureKind {
    /// Whether re-issuing the same request may succeed.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::ApiError | Self::EmptyResponse)
    }

    /// Coarse, non-sensitive category surfaced to API clients.
    pub fn category(self) -> &'static str {
        match self {
            Self::MissingCredential => "configuration",
            Self::ApiError | Self::EmptyResponse => "transient",
            Self::EmptyContext | Self::UnsupportedInput => "input",
        }
    }
}

/// Structured result of parsing a summary completion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedSummary {
    /// Descriptive paragraph.
    pub paragraph: String,
    /// Bullet texts with list markers stripped; may be empty.
    pub bullets: Vec<String>,
}

impl ParsedSummary {
    /// Fixed result for documents below the minimum length.
    pub fn too_short() -> Self {
        Self {
            paragraph: TOO_SHORT_SUMMARY.to_string(),
            bullets: Vec::new(),
        }
    }
}

/// Outcome of one summarization attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Model produced a usable summary.
    Success(SummaryResult),
    /// Attempt failed with the given classification.
    Failure(FailureKind),
}

impl AttemptOutcome {
    /// Failure classification, if this attempt failed.
    pub fn failure(&self) -> Option<FailureKind> {
        match self {
            Self::Success(_) => None,
            Self::Failure(kind) => Some(*kind),
        }
    }
}

/// Parsed summary plus the raw completion it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryResult {
    /// Structured paragraph and bullets.
    pub parsed: ParsedSummary,
    /// Raw model text, kept so bullets can be re-parsed later; `None` when no call was made.
    pub raw: Option<String>,
}

/// Errors surfaced by [`crate::processing::StudyService`] to the HTTP layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Summarization failed after the retry budget, or failed fatally.
    #[error("Summarization failed: {0}")]
    Summarization(FailureKind),
    /// Question answering failed.
    #[error("Answer generation failed: {0}")]
    Answer(FailureKind),
    /// Upload was rejected before extraction.
    #[error("Unsupported file type {extension:?}: {kind}")]
    UnsupportedFile {
        /// Failure classification; always an input problem.
        kind: FailureKind,
        /// Lowercased extension of the rejected upload.
        extension: String,
    },
    /// Question text was blank.
    #[error("Question must not be empty")]
    EmptyQuestion,
    /// No material exists with the requested identifier.
    #[error("Material {0} not found")]
    NotFound(u64),
    /// Material database rejected a read or write.
    #[error("Storage failure: {0}")]
    Store(#[from] StoreError),
    /// Uploaded file could not be written to disk.
    #[error("Failed to store upload: {0}")]
    Upload(#[source] std::io::Error),
}

impl From<ExtractError> for ServiceError {
    fn from(error: ExtractError) -> Self {
        let kind = error.failure_kind();
        match error {
            ExtractError::UnsupportedExtension(extension) => {
                Self::UnsupportedFile { kind, extension }
            }
        }
    }
}

/// Result of a successful upload-and-summarize request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadOutcome {
    /// Identifier of the persisted material.
    pub material_id: u64,
    /// Stored filename (`<uuid>.<ext>`).
    pub filename: String,
    /// Paragraph summary.
    pub summary: String,
    /// Bullet summary; empty when none were parsed.
    pub bullet_summary: Vec<String>,
}

/// Long and short summaries of one material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaterialSummary {
    /// Paragraph summary.
    pub long_summary: String,
    /// Bullet summary.
    pub short_summary: Vec<String>,
}

/// Row of the material listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaterialListing {
    /// Material identifier.
    pub id: u64,
    /// Stored filename.
    pub filename: String,
    /// Human-readable title derived from the uploaded filename.
    pub title: Option<String>,
    /// Paragraph summary.
    pub summary: String,
    /// RFC3339 creation timestamp.
    pub created_at: String,
}
