//! crates/audiobook_core/src/reader.rs
//!
//! Reads an EPUB package from memory and hands its parts to [`Book::from_parts`].

use ::epub::doc::{EpubDoc, NavPoint};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::book::{Book, BookParts, DocumentItem, TocEntry};
use crate::content::ImageItem;
use crate::domain::ImageData;
use crate::error::BookError;

const DOCUMENT_MEDIA_TYPES: [&str; 2] = ["application/xhtml+xml", "text/html"];

/// Opens an EPUB from its raw bytes and resolves title, cover and chapters.
pub fn read_book(bytes: &[u8]) -> Result<Book, BookError> {
    let mut doc = EpubDoc::from_reader(Cursor::new(bytes.to_vec()))
        .map_err(|e| BookError::Archive(e.to_string()))?;
    let root = doc.root_base.clone();

    let title = doc.mdata("title").map(|m| m.value.clone());
    let declared_cover = doc
        .get_cover()
        .map(|(bytes, mime)| ImageData::new(Some(mime.as_str()), bytes));

    let toc = doc.toc.iter().map(|nav| toc_entry(&root, nav)).collect();

    // Snapshot the manifest so resources can be read through `&mut doc` afterwards.
    let manifest: Vec<(String, PathBuf, String)> = doc
        .resources
        .iter()
        .map(|(id, item)| (id.clone(), item.path.clone(), item.mime.clone()))
        .collect();
    let spine: Vec<String> = doc.spine.iter().map(|item| item.idref.clone()).collect();

    let mut document_ids: Vec<&(String, PathBuf, String)> = manifest
        .iter()
        .filter(|(_, _, mime)| DOCUMENT_MEDIA_TYPES.contains(&mime.as_str()))
        .collect();
    // Reading order first; documents outside the spine follow by path.
    document_ids.sort_by(|a, b| {
        let rank = |id: &str| spine.iter().position(|s| s == id).unwrap_or(usize::MAX);
        rank(&a.0).cmp(&rank(&b.0)).then_with(|| a.1.cmp(&b.1))
    });

    let mut documents = Vec::with_capacity(document_ids.len());
    for (id, path, _) in document_ids {
        match doc.get_resource(id) {
            Some((content, _)) => documents.push(DocumentItem {
                id: package_path(&root, path),
                content,
            }),
            None => warn!(id, "Manifest document could not be read"),
        }
    }

    let mut images = Vec::new();
    for (id, path, mime) in manifest.iter().filter(|(_, _, mime)| mime.starts_with("image/")) {
        match doc.get_resource(id) {
            Some((bytes, _)) => images.push(ImageItem {
                name: package_path(&root, path),
                media_type: Some(mime.clone()),
                bytes,
            }),
            None => debug!(id, "Manifest image could not be read"),
        }
    }

    info!(
        documents = documents.len(),
        images = images.len(),
        toc_roots = doc.toc.len(),
        "EPUB package opened"
    );

    Book::from_parts(BookParts {
        title,
        declared_cover,
        toc,
        documents,
        images,
    })
}

fn toc_entry(root: &Path, nav: &NavPoint) -> TocEntry {
    let href = package_path(root, &nav.content);
    TocEntry {
        label: nav.label.clone(),
        href: (!href.is_empty()).then_some(href),
        children: nav.children.iter().map(|child| toc_entry(root, child)).collect(),
    }
}

/// Archive path made relative to the package root, with `/` separators.
fn package_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}
