//! crates/audiobook_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any storage or transport.

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Media type assumed for images whose manifest entry does not declare one.
pub const DEFAULT_IMAGE_MEDIA_TYPE: &str = "image/jpeg";

/// One table-of-contents entry, resolved to the document it points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChapterReference {
    pub title: String,
    /// Path of the document relative to the package root, without fragment.
    pub document_id: String,
}

/// Raw image bytes plus the media type they were declared with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImageData {
    pub fn new(mime_type: Option<&str>, bytes: Vec<u8>) -> Self {
        let mime_type = mime_type
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_IMAGE_MEDIA_TYPE)
            .to_string();
        Self { mime_type, bytes }
    }

    /// Renders the image as a self-contained `data:` URI.
    pub fn data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            BASE64_STANDARD.encode(&self.bytes)
        )
    }
}

/// A single piece of chapter content, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentItem {
    Text(String),
    Image(ImageData),
}

/// A chapter together with the content extracted from its document.
#[derive(Debug, Clone)]
pub struct Chapter {
    pub reference: ChapterReference,
    pub items: Vec<ContentItem>,
}

/// One playback unit. Text chunks are sent to the synthesizer; image chunks
/// carry a data URI and are passed through to the client untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Chunk {
    Text(String),
    Image(String),
}

impl Chunk {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Chunk::Text(text) => Some(text),
            Chunk::Image(_) => None,
        }
    }
}

/// Server-side record of one uploaded book.
///
/// `chunks` is never mutated after creation, so an index always maps to the
/// same text for the lifetime of the session.
#[derive(Debug, Clone)]
pub struct UploadSession {
    pub id: Uuid,
    pub title: String,
    pub cover: Option<String>,
    pub chunks: Vec<Chunk>,
    pub voice: String,
    pub created_at: DateTime<Utc>,
}

impl UploadSession {
    pub fn new(title: String, cover: Option<String>, chunks: Vec<Chunk>, voice: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            cover,
            chunks,
            voice,
            created_at: Utc::now(),
        }
    }
}
