#![deny(missing_docs)]

//! Core library for the StudyMate backend: upload study material, summarize it with a
//! chat-completion model, and answer questions about it.

/// HTTP routing and REST handlers.
pub mod api;
/// Chat-completion client abstraction and the OpenAI adapter.
pub mod completion;
/// Environment-driven configuration management.
pub mod config;
/// Structured logging and tracing setup.
pub mod logging;
/// Summarization and question counters.
pub mod metrics;
/// Extraction, summarization, and question-answering pipeline.
pub mod processing;
/// Material persistence.
pub mod store;
