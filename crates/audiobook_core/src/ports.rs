//! crates/audiobook_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like speech APIs or storage.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::UploadSession;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., network, filesystem).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Result of `SessionStore::insert`.
#[derive(Debug)]
pub struct Admission {
    pub session: Arc<UploadSession>,
    pub evicted: Vec<Arc<UploadSession>>,
}

#[async_trait]
pub trait TextToSpeechService: Send + Sync {
    /// Generates audio data from a string of text, spoken with `voice`.
    async fn generate_audio(&self, text: &str, voice: &str) -> PortResult<Vec<u8>>;
}

/// In-process registry of upload sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Stores a new session. Sessions dropped to make room for it are
    /// handed back so their resources can be released.
    async fn insert(&self, session: UploadSession) -> PortResult<Admission>;

    /// Looks up a live session and refreshes its last-access time.
    async fn get(&self, id: Uuid) -> PortResult<Arc<UploadSession>>;

    async fn remove(&self, id: Uuid) -> PortResult<()>;

    /// Drops every session whose idle time exceeds the store's policy and
    /// returns them.
    async fn evict_expired(&self) -> Vec<Arc<UploadSession>>;

    async fn len(&self) -> usize;
}

/// Storage for synthesized audio, keyed by a derived file path.
#[async_trait]
pub trait AudioCache: Send + Sync {
    /// Directory every cache path is derived under.
    fn root(&self) -> &Path;

    /// Returns the cached audio, or `None` when nothing exists at `path`.
    async fn load(&self, path: &Path) -> PortResult<Option<Vec<u8>>>;

    async fn store(&self, path: &Path, audio: &[u8]) -> PortResult<()>;

    /// Deletes `dir` and everything below it. A missing directory is not an error.
    async fn discard(&self, dir: &Path) -> PortResult<()>;
}
