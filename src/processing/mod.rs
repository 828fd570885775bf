//! Study pipeline: extraction, normalization, summarization with retries, and Q&A.

pub mod answer;
pub mod bullets;
pub mod extract;
pub mod normalize;
pub mod retry;
mod service;
pub mod summarize;
pub mod types;

pub use service::{MATERIALS_DB_FILE, StartupError, StudyApi, StudyService, UPLOADS_DIR};
pub use types::{
    AttemptOutcome, FailureKind, MaterialListing, MaterialSummary, ParsedSummary, ServiceError,
    SummaryResult, TOO_SHORT_SUMMARY, UploadOutcome,
};
