//! Text extraction for uploaded study material.
//!
//! Plain text is decoded lossily; PDFs go through `pdf-extract`. A PDF that fails to parse is
//! logged and treated as empty text, so it later short-circuits as too short instead of
//! failing the request.

use crate::processing::types::FailureKind;
use std::path::Path;
use thiserror::Error;

/// Errors raised before extraction starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    /// File extension is not one of the supported kinds.
    #[error("unsupported file extension: {0:?}")]
    UnsupportedExtension(String),
}

impl ExtractError {
    /// Classify an extraction rejection into the pipeline failure taxonomy.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::UnsupportedExtension(_) => FailureKind::UnsupportedInput,
        }
    }
}

/// Upload formats the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// UTF-8 (or close to it) plain text.
    PlainText,
    /// Portable Document Format.
    Pdf,
}

impl DocumentKind {
    /// Resolve the document kind from an uploaded filename's extension.
    pub fn from_filename(filename: &str) -> Result<Self, ExtractError> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "txt" => Ok(Self::PlainText),
            "pdf" => Ok(Self::Pdf),
            _ => Err(ExtractError::UnsupportedExtension(extension)),
        }
    }

    /// Canonical extension used when storing the upload.
    pub fn extension(self) -> &'static str {
        match self {
            Self::PlainText => "txt",
            Self::Pdf => "pdf",
        }
    }
}

/// Extract raw text from upload bytes.
pub fn extract_text(kind: DocumentKind, bytes: &[u8]) -> String {
    tracing::info!(?kind, bytes = bytes.len(), "Extracting text");
    match kind {
        DocumentKind::PlainText => String::from_utf8_lossy(bytes).into_owned(),
        DocumentKind::Pdf => {
            // pdf-extract panics on some malformed inputs instead of returning an error.
            match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes)) {
                Ok(Ok(text)) => {
                    tracing::info!(chars = text.chars().count(), "PDF parsed");
                    text
                }
                Ok(Err(error)) => {
                    tracing::error!(error = %error, "PDF parsing failed");
                    String::new()
                }
                Err(_) => {
                    tracing::error!("PDF parser panicked");
                    String::new()
                }
            }
        }
    }
}
