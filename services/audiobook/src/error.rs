//! services/audiobook/src/error.rs
//!
//! Defines the error types of the audiobook service.

use crate::config::ConfigError;
use audiobook_core::{BookError, PortError};

/// Errors returned by [`crate::service::AudiobookService`] operations.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The uploaded archive could not be turned into a book.
    #[error("Failed to parse EPUB: {0}")]
    Parse(#[from] BookError),

    /// Unknown upload, out-of-range index or an operation the chunk does not support.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The speech call failed for one chunk. Other chunks are unaffected.
    #[error("Speech synthesis failed for chunk {index}: {source}")]
    Synthesis {
        index: usize,
        #[source]
        source: PortError,
    },

    #[error("Audio cache error: {0}")]
    Cache(#[source] PortError),

    #[error("Session store error: {0}")]
    Store(#[source] PortError),

    /// Book parsing runs on the blocking pool; the task panicked or was cancelled.
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// The primary error type for the `audiobook` binary.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from the service layer.
    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    /// Represents a standard Input/Output error (e.g., reading the book from disk).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Represents a failure to serialize the manifest.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
