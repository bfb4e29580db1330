//! crates/audiobook_core/src/error.rs
//!
//! Errors raised while reading a book.

/// A failure that makes the whole book unusable. Surfaced to the caller.
#[derive(Debug, thiserror::Error)]
pub enum BookError {
    #[error("Failed to open EPUB archive: {0}")]
    Archive(String),

    #[error("EPUB has no usable table of contents and no document items")]
    NoDocuments,

    #[error("EPUB contains no readable content")]
    NoContent,
}

/// A failure confined to one chapter. The chapter is dropped and the rest of
/// the book is still processed.
#[derive(Debug, thiserror::Error)]
pub enum ChapterError {
    #[error("Document '{0}' is not part of the book")]
    MissingDocument(String),

    #[error("Document '{document}' is not valid UTF-8: {source}")]
    Encoding {
        document: String,
        #[source]
        source: std::str::Utf8Error,
    },
}
