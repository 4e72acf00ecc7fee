//! Shared types, error model, and configuration for deepwiki.
//!
//! This crate is the foundation depended on by all other deepwiki crates.
//! It provides:
//! - [`DeepwikiError`]: the unified error type
//! - Domain types ([`DocumentIndex`], [`DocumentItem`], [`DocumentMetadata`], [`RepoRef`])
//! - Configuration ([`AppConfig`], [`IndexConfig`], [`FetchConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DEFAULT_CONTENT_SELECTOR, DEFAULT_LINKS_SELECTOR, DEFAULT_METADATA_SELECTOR,
    DefaultsConfig, FetchConfig, HttpConfig, IndexConfig, SelectorsConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{DeepwikiError, Result};
pub use types::{DocumentIndex, DocumentItem, DocumentMetadata, Items, Node, RepoRef};
