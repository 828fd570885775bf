//! Study service coordinating extraction, summarization, persistence, and Q&A.

use crate::{
    completion::{CompletionClient, CompletionError, OpenAiCompletionClient},
    config::Config,
    metrics::{MetricsSnapshot, StudyMetrics},
    processing::{
        answer::QuestionAnswerer,
        bullets::parse_bullet_summary,
        extract::{DocumentKind, extract_text},
        normalize::normalize_text,
        retry::{RetryPolicy, summarize_with_retry},
        summarize::{SummaryGenerator, Summarizer},
        types::{
            AttemptOutcome, MaterialListing, MaterialSummary, ServiceError, UploadOutcome,
        },
    },
    store::{JsonMaterialStore, Material, MaterialStore, NewMaterial, StoreError, UploadStorage},
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Name of the material database inside the storage directory.
pub const MATERIALS_DB_FILE: &str = "materials.json";
/// Subdirectory of the storage directory holding uploaded files.
pub const UPLOADS_DIR: &str = "materials";

/// Errors raised while wiring the service at startup.
#[derive(Debug, Error)]
pub enum StartupError {
    /// HTTP client for the completion provider could not be built.
    #[error("Failed to build completion client: {0}")]
    Completion(#[from] CompletionError),
    /// Material database could not be opened.
    #[error("Failed to open material store: {0}")]
    Store(#[from] StoreError),
}

/// Abstraction over the study pipeline used by the HTTP surface.
#[async_trait]
pub trait StudyApi: Send + Sync {
    /// Extract, summarize, and persist an uploaded document.
    async fn upload_and_summarize(
        &self,
        filename: String,
        bytes: Vec<u8>,
    ) -> Result<UploadOutcome, ServiceError>;

    /// List stored materials, newest first.
    async fn list_materials(&self) -> Result<Vec<MaterialListing>, ServiceError>;

    /// Paragraph and bullet summaries of one material.
    async fn material_summary(&self, id: u64) -> Result<MaterialSummary, ServiceError>;

    /// Answer a question about a stored material.
    async fn ask(&self, material_id: u64, question: String) -> Result<String, ServiceError>;

    /// Re-run the bullet parser over a material's stored raw completion.
    async fn reparse_bullets(&self, id: u64) -> Result<MaterialSummary, ServiceError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

/// Coordinates the upload pipeline and question answering.
///
/// Construct once at process start and share through an `Arc`; every collaborator is injected
/// so tests can swap the completion client and the store.
pub struct StudyService {
    summarizer: Arc<dyn SummaryGenerator>,
    answerer: QuestionAnswerer,
    store: Arc<dyn MaterialStore>,
    uploads: UploadStorage,
    metrics: Arc<StudyMetrics>,
    retry: RetryPolicy,
    content_max_chars: usize,
}

impl StudyService {
    /// Assemble a service from explicit collaborators.
    pub fn new(
        client: Arc<dyn CompletionClient>,
        store: Arc<dyn MaterialStore>,
        uploads: UploadStorage,
        config: &Config,
    ) -> Self {
        Self {
            summarizer: Arc::new(Summarizer::new(client.clone(), config.summary_max_tokens)),
            answerer: QuestionAnswerer::new(client, config.answer_max_tokens),
            store,
            uploads,
            metrics: Arc::new(StudyMetrics::new()),
            retry: RetryPolicy {
                max_attempts: config.summary_max_attempts,
                min_chars: config.min_summary_chars,
            },
            content_max_chars: config.content_max_chars,
        }
    }

    /// Build the production service: OpenAI client plus JSON store under `storage_dir`.
    pub async fn from_config(config: &Config) -> Result<Self, StartupError> {
        let client = Arc::new(OpenAiCompletionClient::from_config(config)?);
        if !config.has_api_key() {
            tracing::warn!("OPENAI_API_KEY is not set; summaries and answers will fail");
        }
        let store = JsonMaterialStore::open(config.storage_dir.join(MATERIALS_DB_FILE)).await?;
        let uploads = UploadStorage::new(config.storage_dir.join(UPLOADS_DIR));
        Ok(Self::new(client, Arc::new(store), uploads, config))
    }

    /// Extract, normalize, summarize, and persist an uploaded document.
    ///
    /// Nothing is written when summarization ultimately fails.
    pub async fn upload_and_summarize(
        &self,
        filename: String,
        bytes: Vec<u8>,
    ) -> Result<UploadOutcome, ServiceError> {
        tracing::info!(filename = %filename, bytes = bytes.len(), "Upload received");
        let kind = DocumentKind::from_filename(&filename)?;

        let bytes = Arc::new(bytes);
        let raw_text = {
            let bytes = bytes.clone();
            tokio::task::spawn_blocking(move || extract_text(kind, &bytes))
                .await
                .unwrap_or_else(|error| {
                    tracing::error!(error = %error, "Text extraction task failed");
                    String::new()
                })
        };
        let text = normalize_text(&raw_text, self.content_max_chars);
        tracing::info!(
            raw_chars = raw_text.chars().count(),
            normalized_chars = text.chars().count(),
            "Text normalized"
        );

        let result = match summarize_with_retry(self.summarizer.as_ref(), &text, self.retry).await
        {
            AttemptOutcome::Success(result) => result,
            AttemptOutcome::Failure(kind) => {
                self.metrics.record_summary_failure();
                tracing::warn!(?kind, "Summarization failed; upload not saved");
                return Err(ServiceError::Summarization(kind));
            }
        };

        let stored_name = self
            .uploads
            .save(&bytes, kind.extension())
            .await
            .map_err(ServiceError::Upload)?;
        let short_circuited = result.raw.is_none();
        let created = self
            .store
            .create(NewMaterial {
                filename: stored_name.clone(),
                original_filename: filename,
                content: text,
                summary: result.parsed.paragraph,
                bullet_summary: result.parsed.bullets,
                raw_summary: result.raw,
            })
            .await;
        let material = match created {
            Ok(material) => material,
            Err(error) => {
                self.uploads.remove(&stored_name).await;
                return Err(error.into());
            }
        };

        self.metrics.record_summary(short_circuited);
        tracing::info!(
            material_id = material.id,
            bullets = material.bullet_summary.len(),
            short_circuited,
            "Material created"
        );
        Ok(UploadOutcome {
            material_id: material.id,
            filename: material.filename,
            summary: material.summary,
            bullet_summary: material.bullet_summary,
        })
    }

    /// List stored materials, newest first.
    pub async fn list_materials(&self) -> Result<Vec<MaterialListing>, ServiceError> {
        let materials = self.store.list_latest().await?;
        Ok(materials
            .into_iter()
            .map(|material| MaterialListing {
                id: material.id,
                filename: material.filename,
                title: material.title,
                summary: material.summary,
                created_at: material.created_at,
            })
            .collect())
    }

    /// Paragraph and bullet summaries of one material.
    pub async fn material_summary(&self, id: u64) -> Result<MaterialSummary, ServiceError> {
        let material = self.load(id).await?;
        if material.bullet_summary.is_empty() {
            tracing::warn!(material_id = id, "Material has no bullet summary");
        }
        Ok(summary_view(material))
    }

    /// Answer a question about a stored material.
    pub async fn ask(&self, material_id: u64, question: String) -> Result<String, ServiceError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ServiceError::EmptyQuestion);
        }
        let material = self.load(material_id).await?;
        tracing::info!(
            material_id,
            content_chars = material.content.chars().count(),
            "Answering question"
        );

        let result = self.answerer.answer(&material.content, question).await;
        self.metrics.record_question(result.is_ok());
        result.map_err(ServiceError::Answer)
    }

    /// Re-run the bullet parser over a material's stored raw completion.
    ///
    /// Materials without a raw completion (too-short uploads) are returned unchanged.
    pub async fn reparse_bullets(&self, id: u64) -> Result<MaterialSummary, ServiceError> {
        let mut material = self.load(id).await?;
        let Some(raw) = material.raw_summary.as_deref() else {
            tracing::info!(material_id = id, "No raw completion stored; nothing to re-parse");
            return Ok(summary_view(material));
        };

        let parsed = parse_bullet_summary(raw);
        material.summary = parsed.paragraph;
        material.bullet_summary = parsed.bullets;
        self.store.update(material.clone()).await?;
        tracing::info!(
            material_id = id,
            bullets = material.bullet_summary.len(),
            "Bullet summary re-parsed"
        );
        Ok(summary_view(material))
    }

    /// Return the current metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    async fn load(&self, id: u64) -> Result<Material, ServiceError> {
        self.store.get(id).await?.ok_or(ServiceError::NotFound(id))
    }
}

fn summary_view(material: Material) -> MaterialSummary {
    MaterialSummary {
        long_summary: material.summary,
        short_summary: material.bullet_summary,
    }
}

#[async_trait]
impl StudyApi for StudyService {
    async fn upload_and_summarize(
        &self,
        filename: String,
        bytes: Vec<u8>,
    ) -> Result<UploadOutcome, ServiceError> {
        StudyService::upload_and_summarize(self, filename, bytes).await
    }

    async fn list_materials(&self) -> Result<Vec<MaterialListing>, ServiceError> {
        StudyService::list_materials(self).await
    }

    async fn material_summary(&self, id: u64) -> Result<MaterialSummary, ServiceError> {
        StudyService::material_summary(self, id).await
    }

    async fn ask(&self, material_id: u64, question: String) -> Result<String, ServiceError> {
        StudyService::ask(self, material_id, question).await
    }

    async fn reparse_bullets(&self, id: u64) -> Result<MaterialSummary, ServiceError> {
        StudyService::reparse_bullets(self, id).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        StudyService::metrics_snapshot(self)
    }
}
