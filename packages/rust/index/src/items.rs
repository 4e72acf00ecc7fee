//! Outline link extraction.
//!
//! Every anchor matching the links selector becomes an [`ExtractedItem`],
//! including anchors without an href or without a numeric id. Deciding which
//! items make it into the forest is left to [`crate::forest`].

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

/// A numeric-dot path segment followed by a hyphen: `/2.3-request-pipeline`.
static ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/([0-9.]+)-").expect("valid regex"));

/// One outline link as found on the page, before linking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedItem {
    /// Dotted id derived from `path`, or empty.
    pub id: String,
    /// Anchor text.
    pub title: String,
    /// Anchor href, or empty.
    pub path: String,
}

impl ExtractedItem {
    /// Build an item from an href and link text, deriving the id.
    pub fn from_link(path: &str, title: &str) -> Self {
        Self {
            id: id_from_path(path).to_string(),
            title: title.to_string(),
            path: path.to_string(),
        }
    }

    /// Whether an id could be derived from the link.
    pub fn has_id(&self) -> bool {
        !self.id.is_empty()
    }
}

/// Collect all outline links in document order.
pub fn extract_items(doc: &Html, selector: &Selector) -> Vec<ExtractedItem> {
    doc.select(selector)
        .map(|el| {
            let path = el.value().attr("href").unwrap_or("");
            let title = el.text().collect::<String>();
            ExtractedItem::from_link(path, &title)
        })
        .collect()
}

/// First dotted numeric segment that precedes a hyphen, or `""`.
pub fn id_from_path(path: &str) -> &str {
    ID_RE
        .captures(path)
        .and_then(|caps| caps.get(1))
        .map_or("", |m| m.as_str())
}
