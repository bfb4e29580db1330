//! crates/audiobook_core/src/chunker.rs
//!
//! Splits normalized text into speech-sized chunks.
//!
//! Chunks are built from whole sentences. Sentences are packed greedily until
//! the next one would push the chunk past the maximum length; a sentence that
//! is longer than the maximum on its own becomes a single oversized chunk.
//! Lengths are counted in characters.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::{Chapter, Chunk, ContentItem};

/// Maximum chunk length used when the caller does not configure one.
pub const DEFAULT_MAX_CHUNK_LEN: usize = 500;

static SENTENCE_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.?!]\s+").expect("sentence boundary pattern is valid"));

/// Splits text after every `.`, `?` or `!` that is followed by whitespace.
/// Pieces are trimmed and empty pieces are dropped.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for boundary in SENTENCE_BOUNDARY.find_iter(text) {
        // The punctuation mark is a single ASCII byte.
        sentences.push(&text[start..boundary.start() + 1]);
        start = boundary.end();
    }
    sentences.push(&text[start..]);

    sentences
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Packs the sentences of `text` into chunks of at most `max_len` characters,
/// joined by single spaces.
pub fn chunk_text(text: &str, max_len: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for sentence in split_sentences(text) {
        let sentence_len = sentence.chars().count();
        if current.is_empty() {
            current.push_str(sentence);
            current_len = sentence_len;
        } else if current_len + 1 + sentence_len <= max_len {
            current.push(' ');
            current.push_str(sentence);
            current_len += 1 + sentence_len;
        } else {
            chunks.push(std::mem::take(&mut current));
            current.push_str(sentence);
            current_len = sentence_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Chunks one chapter's content.
///
/// Consecutive text items are joined and chunked together, so a chunk may span
/// paragraphs but never splits a sentence. Each image flushes the pending text
/// and becomes a chunk of its own.
pub fn chunk_content(items: &[ContentItem], max_len: usize) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut pending: Vec<&str> = Vec::new();

    for item in items {
        match item {
            ContentItem::Text(text) => pending.push(text),
            ContentItem::Image(image) => {
                flush_text(&mut pending, max_len, &mut chunks);
                chunks.push(Chunk::Image(image.data_uri()));
            }
        }
    }
    flush_text(&mut pending, max_len, &mut chunks);
    chunks
}

/// Chunks every chapter independently and concatenates the results, so no
/// chunk crosses a chapter boundary.
pub fn chunk_book(chapters: &[Chapter], max_len: usize) -> Vec<Chunk> {
    chapters
        .iter()
        .flat_map(|chapter| chunk_content(&chapter.items, max_len))
        .collect()
}

fn flush_text(pending: &mut Vec<&str>, max_len: usize, out: &mut Vec<Chunk>) {
    if pending.is_empty() {
        return;
    }
    let joined = pending.join(" ");
    pending.clear();
    out.extend(chunk_text(&joined, max_len).into_iter().map(Chunk::Text));
}
