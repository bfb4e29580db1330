pub mod book;
pub mod cache;
pub mod chunker;
pub mod content;
pub mod domain;
pub mod error;
pub mod normalize;
pub mod ports;
pub mod reader;

pub use book::{Book, BookParts, DocumentItem, TocEntry};
pub use cache::{cache_path_for, upload_cache_dir};
pub use chunker::{chunk_book, chunk_content, chunk_text, DEFAULT_MAX_CHUNK_LEN};
pub use content::{extract_chapter_content, ImageItem, ImageTable};
pub use domain::{Chapter, ChapterReference, Chunk, ContentItem, ImageData, UploadSession};
pub use error::{BookError, ChapterError};
pub use ports::{Admission, AudioCache, PortError, PortResult, SessionStore, TextToSpeechService};
pub use reader::read_book;
