//! crates/audiobook_core/src/content.rs
//!
//! Turns one chapter document into an ordered list of content items.
//!
//! The document is walked depth first, starting at `<body>` (or the document
//! root when there is no body). Only a fixed set of elements produce output:
//!
//! * `img` and SVG `image` elements whose source resolves to an image item,
//! * headings `h1`..`h6` with non-empty text,
//! * paragraphs `p` with non-empty text.
//!
//! Everything else is descended into but contributes nothing by itself.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use scraper::{node::Node, ElementRef, Html, Selector};
use std::borrow::Cow;
use tracing::debug;

use crate::domain::{ContentItem, ImageData};
use crate::normalize::clean_element_text;

//=========================================================================================
// Image Table
//=========================================================================================

/// An image resource of the book.
#[derive(Debug, Clone)]
pub struct ImageItem {
    /// Path relative to the package root, e.g. `images/pic.jpg`.
    pub name: String,
    pub media_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ImageItem {
    pub fn file_name(&self) -> &str {
        base_name(&self.name)
    }

    pub fn to_image_data(&self) -> ImageData {
        ImageData::new(self.media_type.as_deref(), self.bytes.clone())
    }
}

/// Every image of a book, ordered by name so lookups are deterministic.
#[derive(Debug, Clone, Default)]
pub struct ImageTable {
    items: Vec<ImageItem>,
}

impl ImageTable {
    pub fn new(mut items: Vec<ImageItem>) -> Self {
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Self { items }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageItem> {
        self.items.iter()
    }

    /// Resolves an `src` attribute found in the document at `document_id`.
    ///
    /// Query and fragment suffixes are dropped. The source is tried, in order:
    /// resolved against the document's directory, as a package-root path with
    /// leading `./` and `../` markers removed, and finally by bare file name.
    /// When several images share a file name the first by name wins.
    pub fn resolve(&self, src: &str, document_id: &str) -> Option<&ImageItem> {
        let src = strip_suffixes(src.trim());
        if src.is_empty() || src.starts_with("data:") {
            return None;
        }

        let relative = resolve_relative(parent_dir(document_id), src);
        let rooted = strip_relative_markers(src);
        let file_name = base_name(src);

        self.find(|item| item.name == relative)
            .or_else(|| self.find(|item| item.name == rooted))
            .or_else(|| self.find(|item| item.file_name() == file_name))
    }

    fn find(&self, predicate: impl Fn(&ImageItem) -> bool) -> Option<&ImageItem> {
        self.items.iter().find(|item| predicate(item))
    }
}

//=========================================================================================
// Chapter Traversal
//=========================================================================================

/// Elements the extractor reacts to. Anything else is `Container`.
enum ElementKind<'a> {
    Image(&'a str),
    Heading,
    Paragraph,
    Container,
}

fn classify<'a>(element: &ElementRef<'a>) -> ElementKind<'a> {
    let value = element.value();
    match value.name() {
        "img" => value.attr("src").map_or(ElementKind::Container, ElementKind::Image),
        // SVG `image` uses `href` or the namespaced `xlink:href`; match on local name.
        "image" => value
            .attrs()
            .find(|(name, _)| *name == "href")
            .map_or(ElementKind::Container, |(_, href)| ElementKind::Image(href)),
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => ElementKind::Heading,
        "p" => ElementKind::Paragraph,
        _ => ElementKind::Container,
    }
}

struct ChapterVisitor<'t> {
    document_id: &'t str,
    images: &'t ImageTable,
    items: Vec<ContentItem>,
}

impl<'t> ChapterVisitor<'t> {
    fn visit_children(&mut self, element: ElementRef<'_>) {
        for child in element.children() {
            match child.value() {
                Node::Element(_) => {
                    if let Some(child) = ElementRef::wrap(child) {
                        self.visit_element(child);
                    }
                }
                // Bare text outside a heading or paragraph is not narrated.
                Node::Text(_) => {}
                _ => {}
            }
        }
    }

    fn visit_element(&mut self, element: ElementRef<'_>) {
        match classify(&element) {
            ElementKind::Image(src) => self.push_image(src),
            ElementKind::Heading | ElementKind::Paragraph => {
                self.push_text(element);
                self.push_nested_images(element);
            }
            ElementKind::Container => self.visit_children(element),
        }
    }

    fn push_text(&mut self, element: ElementRef<'_>) {
        let text = clean_element_text(&element.text().collect::<String>());
        if !text.is_empty() {
            self.items.push(ContentItem::Text(text));
        }
    }

    fn push_nested_images(&mut self, element: ElementRef<'_>) {
        for descendant in element.descendants().skip(1) {
            if let Some(nested) = ElementRef::wrap(descendant) {
                if let ElementKind::Image(src) = classify(&nested) {
                    self.push_image(src);
                }
            }
        }
    }

    fn push_image(&mut self, src: &str) {
        match self.images.resolve(src, self.document_id) {
            Some(image) => self.items.push(ContentItem::Image(image.to_image_data())),
            None => debug!(document = self.document_id, src, "Skipping unresolved image"),
        }
    }
}

static SELF_CLOSING_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<([A-Za-z][A-Za-z0-9:_-]*)((?:\s[^<>]*?)?)\s*/>").expect("self-closing tag pattern is valid")
});

/// Elements the HTML parser already treats as empty.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Rewrites XHTML self-closing tags such as `<title/>` into open/close pairs.
///
/// An HTML parser ignores the `/>` on non-void elements, so an empty
/// `<title/>` would swallow the rest of the document as title text.
fn expand_self_closing(xhtml: &str) -> Cow<'_, str> {
    SELF_CLOSING_TAG.replace_all(xhtml, |caps: &Captures| {
        let name = &caps[1];
        if VOID_ELEMENTS.contains(&name.to_ascii_lowercase().as_str()) {
            caps[0].to_string()
        } else {
            format!("<{name}{}></{name}>", &caps[2])
        }
    })
}

/// Extracts the content items of one chapter document, in document order.
///
/// `document_id` is the document's path relative to the package root and is
/// used to resolve relative image sources.
pub fn extract_chapter_content(html: &str, document_id: &str, images: &ImageTable) -> Vec<ContentItem> {
    let document = Html::parse_document(&expand_self_closing(html));
    let body = Selector::parse("body").ok();
    let start = body
        .as_ref()
        .and_then(|selector| document.select(selector).next())
        .unwrap_or_else(|| document.root_element());

    let mut visitor = ChapterVisitor {
        document_id,
        images,
        items: Vec::new(),
    };
    visitor.visit_children(start);
    visitor.items
}

//=========================================================================================
// Path Helpers
//=========================================================================================

fn strip_suffixes(src: &str) -> &str {
    src.split(['?', '#']).next().unwrap_or_default()
}

fn strip_relative_markers(mut path: &str) -> &str {
    loop {
        if let Some(rest) = path.strip_prefix("./") {
            path = rest;
        } else if let Some(rest) = path.strip_prefix("../") {
            path = rest;
        } else {
            return path.trim_start_matches('/');
        }
    }
}

fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn parent_dir(path: &str) -> &str {
    path.rfind('/').map_or("", |idx| &path[..idx])
}

/// Joins `src` onto `dir` and folds `.` and `..` segments.
fn resolve_relative(dir: &str, src: &str) -> String {
    let mut segments: Vec<&str> = if src.starts_with('/') {
        Vec::new()
    } else {
        dir.split('/').filter(|s| !s.is_empty()).collect()
    };
    for segment in src.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}
