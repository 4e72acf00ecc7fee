//! "Last updated" metadata extraction.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use deepwiki_shared::DocumentMetadata;

/// `Last updated: <day> <month> <year> (<hex hash>)`.
static LAST_UPDATED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Last updated: ([0-9]+ [A-Za-z0-9_]+ [0-9]+) \(([a-f0-9]+)\)").expect("valid regex")
});

/// Read metadata from the first element matching `selector`.
///
/// A missing element or a non-matching text yields empty fields.
pub fn extract_metadata(doc: &Html, selector: &Selector) -> DocumentMetadata {
    doc.select(selector)
        .next()
        .map(|el| parse_last_updated(&el.text().collect::<String>()))
        .unwrap_or_default()
}

/// Apply the "Last updated" pattern to a text fragment.
pub fn parse_last_updated(text: &str) -> DocumentMetadata {
    match LAST_UPDATED_RE.captures(text) {
        Some(caps) => DocumentMetadata {
            last_updated: caps[1].to_string(),
            version: caps[2].to_string(),
        },
        None => DocumentMetadata::default(),
    }
}
