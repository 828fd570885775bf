//! Material persistence: the summarized documents and their uploaded files.

mod json;
mod uploads;

pub use json::JsonMaterialStore;
pub use uploads::UploadStorage;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Errors raised by material stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File that could not be accessed.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// Backing file did not contain a valid material database.
    #[error("Corrupt material database {path}: {source}")]
    Corrupt {
        /// File that failed to decode.
        path: String,
        /// Underlying decode failure.
        #[source]
        source: serde_json::Error,
    },
    /// Update targeted a material that does not exist.
    #[error("Material {0} not found")]
    NotFound(u64),
}

/// A summarized document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    /// Monotonic identifier assigned on creation.
    pub id: u64,
    /// Stored filename (`<uuid>.<ext>`).
    pub filename: String,
    /// Filename as uploaded by the user.
    pub original_filename: String,
    /// Display title, derived from the uploaded filename.
    #[serde(default)]
    pub title: Option<String>,
    /// Normalized extracted text.
    pub content: String,
    /// Paragraph summary.
    pub summary: String,
    /// Bullet summary, always stored as an array (possibly empty).
    #[serde(default)]
    pub bullet_summary: Vec<String>,
    /// Raw model completion the summary was parsed from.
    #[serde(default)]
    pub raw_summary: Option<String>,
    /// RFC3339 creation timestamp.
    pub created_at: String,
}

/// Fields supplied when creating a material; the store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMaterial {
    /// Stored filename.
    pub filename: String,
    /// Filename as uploaded.
    pub original_filename: String,
    /// Normalized extracted text.
    pub content: String,
    /// Paragraph summary.
    pub summary: String,
    /// Bullet summary.
    pub bullet_summary: Vec<String>,
    /// Raw model completion, when a model call was made.
    pub raw_summary: Option<String>,
}

/// Storage backend for materials.
#[async_trait]
pub trait MaterialStore: Send + Sync {
    /// Persist a new material and return it with its assigned identifier.
    async fn create(&self, material: NewMaterial) -> Result<Material, StoreError>;

    /// Fetch a material by identifier.
    async fn get(&self, id: u64) -> Result<Option<Material>, StoreError>;

    /// All materials, newest first.
    async fn list_latest(&self) -> Result<Vec<Material>, StoreError>;

    /// Replace an existing material.
    async fn update(&self, material: Material) -> Result<(), StoreError>;
}

/// Derive a display title from an uploaded filename (its stem).
pub fn title_from_filename(filename: &str) -> Option<String> {
    Path::new(filename)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::trim)
        .filter(|stem| !stem.is_empty())
        .map(str::to_string)
}

pub(crate) fn current_timestamp_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}
