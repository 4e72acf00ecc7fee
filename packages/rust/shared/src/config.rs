//! Application configuration for deepwiki.
//!
//! User config lives at `~/.deepwiki/deepwiki.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{DeepwikiError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "deepwiki.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".deepwiki";

/// Selector for the element holding the "Last updated" line.
pub const DEFAULT_METADATA_SELECTOR: &str = "div > div > div";

/// Selector for outline links (anchors nested anywhere inside a list).
pub const DEFAULT_LINKS_SELECTOR: &str = "ul li a, ul a";

/// Selector for the rendered wiki content container.
pub const DEFAULT_CONTENT_SELECTOR: &str = ".prose-custom.prose-custom-md.prose-custom-gray";

// ---------------------------------------------------------------------------
// Config structs (matching deepwiki.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// HTTP client settings.
    #[serde(default)]
    pub http: HttpConfig,

    /// CSS selectors used to read the wiki page.
    #[serde(default)]
    pub selectors: SelectorsConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Wiki host that serves `<owner>/<repo>` pages.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Pretty-print JSON output.
    #[serde(default = "default_true")]
    pub pretty: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            pretty: true,
        }
    }
}

fn default_base_url() -> String {
    "https://deepwiki.com".into()
}
fn default_true() -> bool {
    true
}

/// `[http]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum redirects to follow.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Largest response body accepted, in bytes.
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_redirects: default_max_redirects(),
            max_response_bytes: default_max_response_bytes(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}
fn default_max_redirects() -> usize {
    5
}
fn default_max_response_bytes() -> u64 {
    10 * 1024 * 1024
}

/// `[selectors]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorsConfig {
    /// Element whose text carries the "Last updated: <date> (<hash>)" line.
    #[serde(default = "default_metadata_selector")]
    pub metadata: String,

    /// Outline anchors.
    #[serde(default = "default_links_selector")]
    pub links: String,

    /// Main content container for overview/page output.
    #[serde(default = "default_content_selector")]
    pub content: String,
}

impl Default for SelectorsConfig {
    fn default() -> Self {
        Self {
            metadata: default_metadata_selector(),
            links: default_links_selector(),
            content: default_content_selector(),
        }
    }
}

fn default_metadata_selector() -> String {
    DEFAULT_METADATA_SELECTOR.into()
}
fn default_links_selector() -> String {
    DEFAULT_LINKS_SELECTOR.into()
}
fn default_content_selector() -> String {
    DEFAULT_CONTENT_SELECTOR.into()
}

// ---------------------------------------------------------------------------
// Runtime configs (merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime settings for building a document index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexConfig {
    /// Selector for the metadata element.
    pub metadata_selector: String,
    /// Selector for outline anchors.
    pub links_selector: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for IndexConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            metadata_selector: config.selectors.metadata.clone(),
            links_selector: config.selectors.links.clone(),
        }
    }
}

/// Runtime settings for fetching wiki pages.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Wiki host.
    pub base_url: Url,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Maximum redirects to follow.
    pub max_redirects: usize,
    /// Largest response body accepted, in bytes.
    pub max_response_bytes: u64,
    /// Selector for the content container.
    pub content_selector: String,
}

impl TryFrom<&AppConfig> for FetchConfig {
    type Error = DeepwikiError;

    fn try_from(config: &AppConfig) -> Result<Self> {
        let base_url = Url::parse(&config.defaults.base_url).map_err(|e| {
            DeepwikiError::config(format!(
                "invalid base_url `{}`: {e}",
                config.defaults.base_url
            ))
        })?;

        Ok(Self {
            base_url,
            timeout_secs: config.http.timeout_secs,
            max_redirects: config.http.max_redirects,
            max_response_bytes: config.http.max_response_bytes,
            content_selector: config.selectors.content.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.deepwiki/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| DeepwikiError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.deepwiki/deepwiki.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DeepwikiError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| DeepwikiError::parse(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| DeepwikiError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| DeepwikiError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| DeepwikiError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
