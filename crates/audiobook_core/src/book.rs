//! crates/audiobook_core/src/book.rs
//!
//! The in-memory model of one opened book and the rules that turn its raw
//! parts (table of contents, documents, images) into an ordered chapter list.

use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

use crate::content::{extract_chapter_content, ImageItem, ImageTable};
use crate::domain::{Chapter, ChapterReference, ContentItem, ImageData};
use crate::error::{BookError, ChapterError};
use crate::normalize::clean_element_text;

/// Title used when the package metadata carries none.
pub const UNTITLED: &str = "Untitled";

//=========================================================================================
// Raw Parts
//=========================================================================================

/// A node of the (possibly nested) table of contents.
#[derive(Debug, Clone, Default)]
pub struct TocEntry {
    pub label: String,
    /// Target path relative to the package root, possibly with a `#fragment`.
    pub href: Option<String>,
    pub children: Vec<TocEntry>,
}

/// An XHTML document of the book.
#[derive(Debug, Clone)]
pub struct DocumentItem {
    /// Path relative to the package root.
    pub id: String,
    pub content: Vec<u8>,
}

/// Everything read out of a package before chapter resolution.
#[derive(Debug, Clone, Default)]
pub struct BookParts {
    pub title: Option<String>,
    /// Image named by the package's cover metadata, if any.
    pub declared_cover: Option<ImageData>,
    pub toc: Vec<TocEntry>,
    /// Documents in reading order.
    pub documents: Vec<DocumentItem>,
    pub images: Vec<ImageItem>,
}

//=========================================================================================
// Book
//=========================================================================================

#[derive(Debug, Clone)]
pub struct Book {
    pub title: String,
    pub cover: Option<ImageData>,
    pub chapters: Vec<ChapterReference>,
    documents: HashMap<String, Vec<u8>>,
    images: ImageTable,
}

impl Book {
    /// Resolves chapters and cover from the raw parts of a package.
    ///
    /// Chapters come from the table of contents when it yields at least one
    /// usable entry, otherwise every document becomes its own chapter.
    pub fn from_parts(parts: BookParts) -> Result<Self, BookError> {
        let BookParts {
            title,
            declared_cover,
            toc,
            documents,
            images,
        } = parts;

        let title = title
            .map(|t| clean_element_text(&t))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| UNTITLED.to_string());

        let known: HashSet<&str> = documents.iter().map(|d| d.id.as_str()).collect();
        let mut chapters = flatten_toc(&toc, &known);
        if chapters.is_empty() {
            if documents.is_empty() {
                return Err(BookError::NoDocuments);
            }
            warn!(
                toc_entries = toc.len(),
                documents = documents.len(),
                "Table of contents unusable, falling back to one chapter per document"
            );
            chapters = documents
                .iter()
                .map(|doc| ChapterReference {
                    title: title_from_name(&doc.id),
                    document_id: doc.id.clone(),
                })
                .collect();
        }

        let images = ImageTable::new(images);
        let cover = declared_cover.or_else(|| {
            images
                .iter()
                .find(|image| image.file_name().to_ascii_lowercase().contains("cover"))
                .map(ImageItem::to_image_data)
        });

        info!(
            title = %title,
            chapters = chapters.len(),
            images = images.iter().count(),
            has_cover = cover.is_some(),
            "Book structure resolved"
        );

        Ok(Self {
            title,
            cover,
            chapters,
            documents: documents.into_iter().map(|d| (d.id, d.content)).collect(),
            images,
        })
    }

    /// Content of one chapter, in document order.
    ///
    /// Never fails: a chapter that cannot be read yields an empty list and a
    /// warning.
    pub fn chapter_content(&self, chapter: &ChapterReference) -> Vec<ContentItem> {
        match self.try_chapter_content(chapter) {
            Ok(items) => {
                if items.is_empty() {
                    debug!(document = %chapter.document_id, "Chapter has no content");
                }
                items
            }
            Err(err) => {
                warn!(title = %chapter.title, "Dropping chapter: {err}");
                Vec::new()
            }
        }
    }

    fn try_chapter_content(&self, chapter: &ChapterReference) -> Result<Vec<ContentItem>, ChapterError> {
        let bytes = self
            .documents
            .get(&chapter.document_id)
            .ok_or_else(|| ChapterError::MissingDocument(chapter.document_id.clone()))?;
        let html = std::str::from_utf8(bytes).map_err(|source| ChapterError::Encoding {
            document: chapter.document_id.clone(),
            source,
        })?;
        Ok(extract_chapter_content(html, &chapter.document_id, &self.images))
    }

    /// Extracts every chapter, dropping the ones that produce no content.
    pub fn extract_all(&self) -> Vec<Chapter> {
        let chapters: Vec<Chapter> = self
            .chapters
            .iter()
            .filter_map(|reference| {
                let items = self.chapter_content(reference);
                (!items.is_empty()).then(|| Chapter {
                    reference: reference.clone(),
                    items,
                })
            })
            .collect();

        info!(
            kept = chapters.len(),
            dropped = self.chapters.len() - chapters.len(),
            "Chapter content extracted"
        );
        chapters
    }
}

//=========================================================================================
// Table of Contents Flattening
//=========================================================================================

/// Flattens the table of contents in pre-order: a node is emitted before its
/// children. Fragments are stripped, targets that are not known documents are
/// skipped, and when two entries point at the same document the first one in
/// traversal order wins.
pub fn flatten_toc(toc: &[TocEntry], known_documents: &HashSet<&str>) -> Vec<ChapterReference> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut chapters = Vec::new();
    let mut stack: Vec<&TocEntry> = toc.iter().rev().collect();

    while let Some(entry) = stack.pop() {
        stack.extend(entry.children.iter().rev());

        let Some(target) = entry.href.as_deref().map(strip_fragment) else {
            continue;
        };
        if target.is_empty() {
            continue;
        }
        if !known_documents.contains(target) {
            debug!(target, "Skipping table-of-contents entry with unknown target");
            continue;
        }
        if seen.insert(target) {
            let label = clean_element_text(&entry.label);
            chapters.push(ChapterReference {
                title: if label.is_empty() { title_from_name(target) } else { label },
                document_id: target.to_string(),
            });
        }
    }
    chapters
}

fn strip_fragment(href: &str) -> &str {
    href.split('#').next().unwrap_or_default().trim()
}

/// File stem of a package path, e.g. `text/chapter_01.xhtml` -> `chapter_01`.
fn title_from_name(path: &str) -> String {
    let file = path.rsplit('/').next().unwrap_or(path);
    let stem = file.rsplit_once('.').map_or(file, |(stem, _)| stem);
    if stem.is_empty() {
        file.to_string()
    } else {
        stem.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(label: &str, href: Option<&str>, children: Vec<TocEntry>) -> TocEntry {
        TocEntry {
            label: label.to_string(),
            href: href.map(str::to_string),
            children,
        }
    }

    fn document(id: &str, html: &str) -> DocumentItem {
        DocumentItem {
            id: id.to_string(),
            content: html.as_bytes().to_vec(),
        }
    }

    fn ids(chapters: &[ChapterReference]) -> Vec<&str> {
        chapters.iter().map(|c| c.document_id.as_str()).collect()
    }

    #[test]
    fn toc_is_flattened_in_pre_order() {
        let toc = vec![
            entry(
                "Part One",
                Some("part1.xhtml"),
                vec![
                    entry("Chapter 1", Some("ch1.xhtml"), vec![]),
                    entry("Chapter 2", Some("ch2.xhtml"), vec![entry("Scene", Some("ch2b.xhtml"), vec![])]),
                ],
            ),
            entry("Epilogue", Some("epilogue.xhtml"), vec![]),
        ];
        let known: HashSet<&str> = ["part1.xhtml", "ch1.xhtml", "ch2.xhtml", "ch2b.xhtml", "epilogue.xhtml"]
            .into_iter()
            .collect();

        let chapters = flatten_toc(&toc, &known);
        assert_eq!(
            ids(&chapters),
            vec!["part1.xhtml", "ch1.xhtml", "ch2.xhtml", "ch2b.xhtml", "epilogue.xhtml"]
        );
        assert_eq!(chapters[0].title, "Part One");
    }

    #[test]
    fn fragments_are_deduplicated_first_wins() {
        let toc = vec![
            entry("Intro", Some("ch1.xhtml#start"), vec![]),
            entry("Intro, again", Some("ch1.xhtml#middle"), vec![]),
            entry("Section without link", None, vec![entry("Nested", Some("ch2.xhtml"), vec![])]),
        ];
        let known: HashSet<&str> = ["ch1.xhtml", "ch2.xhtml"].into_iter().collect();

        let chapters = flatten_toc(&toc, &known);
        assert_eq!(ids(&chapters), vec!["ch1.xhtml", "ch2.xhtml"]);
        assert_eq!(chapters[0].title, "Intro");
    }

    #[test]
    fn malformed_toc_falls_back_to_documents_in_order() {
        let parts = BookParts {
            title: Some("A Book".into()),
            toc: vec![entry("No link", None, vec![]), entry("Empty", Some(""), vec![])],
            documents: vec![
                document("text/cover_page.xhtml", "<p>Cover.</p>"),
                document("text/chapter_01.xhtml", "<p>One.</p>"),
                document("text/chapter_02.xhtml", "<p>Two.</p>"),
            ],
            ..Default::default()
        };

        let book = Book::from_parts(parts).unwrap();
        let titles: Vec<&str> = book.chapters.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["cover_page", "chapter_01", "chapter_02"]);
        assert_eq!(
            ids(&book.chapters),
            vec!["text/cover_page.xhtml", "text/chapter_01.xhtml", "text/chapter_02.xhtml"]
        );
    }

    #[test]
    fn toc_pointing_nowhere_falls_back() {
        let parts = BookParts {
            toc: vec![entry("Ghost", Some("missing.xhtml"), vec![])],
            documents: vec![document("only.xhtml", "<p>Only.</p>")],
            ..Default::default()
        };
        let book = Book::from_parts(parts).unwrap();
        assert_eq!(ids(&book.chapters), vec!["only.xhtml"]);
    }

    #[test]
    fn no_toc_and_no_documents_is_a_parse_error() {
        let err = Book::from_parts(BookParts::default()).unwrap_err();
        assert!(matches!(err, BookError::NoDocuments));
    }

    #[test]
    fn missing_title_gets_placeholder() {
        let parts = BookParts {
            title: Some("   ".into()),
            documents: vec![document("a.xhtml", "<p>A.</p>")],
            ..Default::default()
        };
        assert_eq!(Book::from_parts(parts).unwrap().title, UNTITLED);
    }

    #[test]
    fn declared_cover_wins_over_named_image() {
        let declared = ImageData::new(Some("image/png"), vec![9]);
        let parts = BookParts {
            declared_cover: Some(declared.clone()),
            documents: vec![document("a.xhtml", "<p>A.</p>")],
            images: vec![ImageItem {
                name: "images/cover.jpg".into(),
                media_type: Some("image/jpeg".into()),
                bytes: vec![1],
            }],
            ..Default::default()
        };
        assert_eq!(Book::from_parts(parts).unwrap().cover, Some(declared));
    }

    #[test]
    fn cover_falls_back_to_image_named_cover() {
        let parts = BookParts {
            documents: vec![document("a.xhtml", "<p>A.</p>")],
            images: vec![
                ImageItem {
                    name: "images/map.png".into(),
                    media_type: Some("image/png".into()),
                    bytes: vec![1],
                },
                ImageItem {
                    name: "images/Cover-Art.png".into(),
                    media_type: Some("image/png".into()),
                    bytes: vec![2],
                },
            ],
            ..Default::default()
        };
        let cover = Book::from_parts(parts).unwrap().cover.unwrap();
        assert_eq!(cover.bytes, vec![2]);
        assert!(cover.data_uri().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn no_cover_is_fine() {
        let parts = BookParts {
            documents: vec![document("a.xhtml", "<p>A.</p>")],
            ..Default::default()
        };
        assert!(Book::from_parts(parts).unwrap().cover.is_none());
    }

    #[test]
    fn unreadable_and_empty_chapters_are_dropped() {
        let parts = BookParts {
            toc: vec![
                entry("Broken", Some("broken.xhtml"), vec![]),
                entry("Empty", Some("empty.xhtml"), vec![]),
                entry("Good", Some("good.xhtml"), vec![]),
            ],
            documents: vec![
                DocumentItem {
                    id: "broken.xhtml".into(),
                    content: vec![0xff, 0xfe, 0x00],
                },
                document("empty.xhtml", "<body><div></div></body>"),
                document("good.xhtml", "<body><h1>Good</h1><p>Fine.</p></body>"),
            ],
            ..Default::default()
        };

        let book = Book::from_parts(parts).unwrap();
        assert!(book.chapter_content(&book.chapters[0]).is_empty());

        let chapters = book.extract_all();
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].reference.title, "Good");
        assert_eq!(
            chapters[0].items,
            vec![ContentItem::Text("Good".into()), ContentItem::Text("Fine.".into())]
        );
    }

    #[test]
    fn unknown_chapter_reference_yields_nothing() {
        let parts = BookParts {
            documents: vec![document("a.xhtml", "<p>A.</p>")],
            ..Default::default()
        };
        let book = Book::from_parts(parts).unwrap();
        let ghost = ChapterReference {
            title: "Ghost".into(),
            document_id: "ghost.xhtml".into(),
        };
        assert!(book.chapter_content(&ghost).is_empty());
    }
}
