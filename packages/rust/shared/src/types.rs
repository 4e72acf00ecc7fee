//! Core domain types for deepwiki document indexes.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use url::Url;

use crate::error::{DeepwikiError, Result};

/// Date format used by the "Last updated" line, e.g. `12 March 2024`.
const LAST_UPDATED_FORMAT: &str = "%d %B %Y";

// ---------------------------------------------------------------------------
// RepoRef
// ---------------------------------------------------------------------------

/// An `owner/repo` pair naming a repository wiki.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    /// Repository owner (user or organization).
    pub owner: String,
    /// Repository name.
    pub repo: String,
}

impl RepoRef {
    /// Create a reference from already-validated parts.
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// Build the wiki page URL for this repository under `base`.
    ///
    /// Segments are appended to whatever path `base` already has, so a base of
    /// `http://localhost:8080/wiki` yields `http://localhost:8080/wiki/<owner>/<repo>`.
    pub fn wiki_url(&self, base: &Url) -> Result<Url> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|()| DeepwikiError::config(format!("base URL cannot be a base: {base}")))?
            .pop_if_empty()
            .push(&self.owner)
            .push(&self.repo);
        Ok(url)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

impl FromStr for RepoRef {
    type Err = DeepwikiError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim().trim_matches('/');
        let mut parts = trimmed.split('/');

        let (Some(owner), Some(repo), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(DeepwikiError::validation(format!(
                "expected `owner/repo`, got `{s}`"
            )));
        };

        for part in [owner, repo] {
            if part.is_empty() || !part.chars().all(is_repo_char) {
                return Err(DeepwikiError::validation(format!(
                    "invalid repository segment `{part}` in `{s}`"
                )));
            }
        }

        Ok(Self::new(owner, repo))
    }
}

fn is_repo_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
}

// ---------------------------------------------------------------------------
// DocumentMetadata
// ---------------------------------------------------------------------------

/// Page-level metadata parsed from the "Last updated" line.
///
/// Both fields are empty strings when the line is missing or does not match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    /// Human-readable date, verbatim from the page (e.g. `12 March 2024`).
    #[serde(default)]
    pub last_updated: String,
    /// Short hexadecimal content hash.
    #[serde(default)]
    pub version: String,
}

impl DocumentMetadata {
    /// Whether neither field was found on the page.
    pub fn is_empty(&self) -> bool {
        self.last_updated.is_empty() && self.version.is_empty()
    }

    /// Parse [`last_updated`](Self::last_updated) as a calendar date.
    pub fn last_updated_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.last_updated, LAST_UPDATED_FORMAT).ok()
    }
}

// ---------------------------------------------------------------------------
// DocumentItem
// ---------------------------------------------------------------------------

/// Shape of an outline node: a leaf, or an internal node with at least one child.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Node {
    /// No children. Serialized by omitting the `children` field.
    #[default]
    Leaf,
    /// Ordered, non-empty children.
    Internal(Vec<DocumentItem>),
}

impl Node {
    /// `Leaf` for an empty list, `Internal` otherwise.
    pub fn from_children(children: Vec<DocumentItem>) -> Self {
        if children.is_empty() {
            Self::Leaf
        } else {
            Self::Internal(children)
        }
    }
}

/// A single section of the wiki outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentItem {
    /// Dotted numeric identifier (`"3.2.1"`).
    pub id: String,
    /// Link text as rendered on the page.
    pub title: String,
    /// Link href, relative or absolute.
    pub path: String,
    /// Leaf or internal node.
    pub node: Node,
}

impl DocumentItem {
    /// Create an item, choosing `Leaf` or `Internal` from `children`.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        path: impl Into<String>,
        children: Vec<DocumentItem>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            path: path.into(),
            node: Node::from_children(children),
        }
    }

    /// Child items in document order (empty for a leaf).
    pub fn children(&self) -> &[DocumentItem] {
        match &self.node {
            Node::Leaf => &[],
            Node::Internal(children) => children,
        }
    }

    /// Whether this item has no children.
    pub fn is_leaf(&self) -> bool {
        self.children().is_empty()
    }

    /// Nesting depth implied by the id: `"2"` is 0, `"2.3"` is 1.
    pub fn depth(&self) -> usize {
        self.id.split('.').count().saturating_sub(1)
    }
}

impl Serialize for DocumentItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let children = self.children();
        let field_count = if children.is_empty() { 3 } else { 4 };

        let mut state = serializer.serialize_struct("DocumentItem", field_count)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("title", &self.title)?;
        state.serialize_field("path", &self.path)?;
        if children.is_empty() {
            state.skip_field("children")?;
        } else {
            state.serialize_field("children", children)?;
        }
        state.end()
    }
}

/// Wire form of [`DocumentItem`], where `children` is optional.
#[derive(Deserialize)]
struct RawDocumentItem {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    path: String,
    #[serde(default)]
    children: Option<Vec<DocumentItem>>,
}

impl<'de> Deserialize<'de> for DocumentItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = RawDocumentItem::deserialize(deserializer)?;
        Ok(Self::new(
            raw.id,
            raw.title,
            raw.path,
            raw.children.unwrap_or_default(),
        ))
    }
}

// ---------------------------------------------------------------------------
// DocumentIndex
// ---------------------------------------------------------------------------

/// Outline of a repository wiki: metadata plus a forest of top-level sections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentIndex {
    /// "Last updated" metadata.
    pub metadata: DocumentMetadata,
    /// Top-level sections; descendants are reachable through their children.
    pub items: Vec<DocumentItem>,
}

impl DocumentIndex {
    /// Depth-first, pre-order walk over every item in the forest.
    pub fn iter(&self) -> Items<'_> {
        Items {
            stack: self.items.iter().rev().collect(),
        }
    }

    /// Find the item with the given id anywhere in the forest.
    pub fn find(&self, id: &str) -> Option<&DocumentItem> {
        self.iter().find(|item| item.id == id)
    }

    /// Total number of items in the forest.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Whether the forest has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Pre-order iterator returned by [`DocumentIndex::iter`].
pub struct Items<'a> {
    stack: Vec<&'a DocumentItem>,
}

impl<'a> Iterator for Items<'a> {
    type Item = &'a DocumentItem;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.stack.pop()?;
        self.stack.extend(item.children().iter().rev());
        Some(item)
    }
}
