//! Text clean-up applied to everything pulled out of chapter markup.
//!
//! The output only feeds an English speech synthesizer, so dropping non-ASCII
//! characters is acceptable.

use once_cell::sync::Lazy;
use regex::Regex;

static NON_ASCII_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\x00-\x7F]+").expect("non-ASCII pattern is valid"));

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

const ZERO_WIDTH_SPACE: char = '\u{200B}';
const NO_BREAK_SPACE: char = '\u{00A0}';

/// Removes zero-width spaces, turns non-breaking spaces into plain spaces and
/// replaces every remaining run of non-ASCII characters with one space.
pub fn normalize_text(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != ZERO_WIDTH_SPACE)
        .map(|c| if c == NO_BREAK_SPACE { ' ' } else { c })
        .collect();
    NON_ASCII_RUN.replace_all(&cleaned, " ").into_owned()
}

/// Collapses whitespace runs to a single space and trims both ends.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text.trim(), " ").into_owned()
}

/// Normalizes and collapses text taken from a single element.
pub fn clean_element_text(raw: &str) -> String {
    collapse_whitespace(&normalize_text(raw))
}
