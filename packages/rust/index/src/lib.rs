//! Wiki outline extraction.
//!
//! Turns a parsed wiki page into a [`DocumentIndex`](deepwiki_shared::DocumentIndex):
//! - [`metadata`]: "Last updated" date and version hash
//! - [`items`]: outline links with ids derived from their paths
//! - [`forest`]: id-prefix linking into an ordered forest
//! - [`normalize`]: leaf normalization
//! - [`IndexBuilder`]: runs the whole pipeline

pub mod builder;
pub mod forest;
pub mod items;
pub mod metadata;
pub mod normalize;

pub use builder::{IndexBuilder, build_index};
pub use items::{ExtractedItem, id_from_path};
