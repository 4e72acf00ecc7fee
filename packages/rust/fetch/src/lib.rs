//! Wiki page fetching.
//!
//! [`WikiClient`] downloads a repository's wiki page and hands the HTML to the
//! index builder or to the content sanitizer:
//! - [`WikiClient::fetch_index`]: the page outline as a [`DocumentIndex`]
//! - [`WikiClient::fetch_overview`]: the rendered overview, sanitized
//! - [`WikiClient::fetch_section`]: one outline section's page, sanitized

mod content;

use std::time::Duration;

use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument};
use url::Url;

use deepwiki_index::IndexBuilder;
use deepwiki_shared::{DeepwikiError, DocumentIndex, DocumentItem, FetchConfig, RepoRef, Result};

pub use content::extract_content;

/// User-Agent string for wiki requests.
const USER_AGENT: &str = concat!("deepwiki/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Outcome of looking for the content container on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageContent {
    /// The container was found; sanitized inner HTML.
    Found {
        /// Container HTML with `svg` elements and `class` attributes removed.
        html: String,
    },
    /// The page has no content container.
    NotFound,
}

/// A fetched outline section.
#[derive(Debug, Clone)]
pub struct Section {
    /// The outline item that named the section.
    pub item: DocumentItem,
    /// Resolved URL of the section page.
    pub url: Url,
    /// Sanitized page content.
    pub content: PageContent,
}

// ---------------------------------------------------------------------------
// WikiClient
// ---------------------------------------------------------------------------

/// HTTP client for repository wiki pages.
pub struct WikiClient {
    config: FetchConfig,
    client: Client,
    content_selector: Selector,
}

impl WikiClient {
    /// Create a client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DeepwikiError::Network(format!("failed to build HTTP client: {e}")))?;

        let content_selector = Selector::parse(&config.content_selector).map_err(|e| {
            DeepwikiError::config(format!(
                "invalid selector `{}`: {e}",
                config.content_selector
            ))
        })?;

        Ok(Self {
            config,
            client,
            content_selector,
        })
    }

    /// The wiki host this client talks to.
    pub fn base_url(&self) -> &Url {
        &self.config.base_url
    }

    /// URL of the wiki page for `repo`.
    pub fn page_url(&self, repo: &RepoRef) -> Result<Url> {
        repo.wiki_url(&self.config.base_url)
    }

    /// Resolve an outline item path (relative or absolute) against the wiki host.
    pub fn resolve(&self, path: &str) -> Result<Url> {
        if path.is_empty() {
            return Err(DeepwikiError::validation("outline item has no path"));
        }
        self.config
            .base_url
            .join(path)
            .map_err(|e| DeepwikiError::validation(format!("cannot resolve `{path}`: {e}")))
    }

    /// Fetch a page body as text.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn fetch_html(&self, url: &Url) -> Result<String> {
        debug!("fetching page");

        let mut response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| DeepwikiError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeepwikiError::Network(format!("{url}: HTTP {status}")));
        }

        let max = self.config.max_response_bytes;
        if let Some(len) = response.content_length() {
            if len > max {
                return Err(DeepwikiError::validation(format!(
                    "{url}: response too large ({len} bytes, max {max})"
                )));
            }
        }

        // Content-Length may be absent, so the limit is enforced while reading too.
        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| DeepwikiError::Network(format!("{url}: body read failed: {e}")))?
        {
            append_limited(&mut bytes, &chunk, max).map_err(|read| {
                DeepwikiError::validation(format!(
                    "{url}: response too large (over {read} bytes, max {max})"
                ))
            })?;
        }

        debug!(bytes = bytes.len(), "page fetched");
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Fetch the wiki page for `repo` and build its outline.
    #[instrument(skip_all, fields(repo = %repo))]
    pub async fn fetch_index(&self, repo: &RepoRef, builder: &IndexBuilder) -> Result<DocumentIndex> {
        let url = self.page_url(repo)?;
        let html = self.fetch_html(&url).await?;
        let index = builder.build_from_html(&html);

        info!(
            sections = index.len(),
            last_updated = %index.metadata.last_updated,
            "outline extracted"
        );
        Ok(index)
    }

    /// Fetch the wiki page for `repo` and return its sanitized content.
    #[instrument(skip_all, fields(repo = %repo))]
    pub async fn fetch_overview(&self, repo: &RepoRef) -> Result<PageContent> {
        let url = self.page_url(repo)?;
        self.fetch_content(&url).await
    }

    /// Fetch the page of the outline section `id` of `repo`.
    ///
    /// The outline is fetched first to find the section's path.
    #[instrument(skip_all, fields(repo = %repo, id = %id))]
    pub async fn fetch_section(
        &self,
        repo: &RepoRef,
        id: &str,
        builder: &IndexBuilder,
    ) -> Result<Section> {
        let index = self.fetch_index(repo, builder).await?;
        let item = index.find(id).cloned().ok_or_else(|| {
            DeepwikiError::validation(format!("no section `{id}` in the {repo} outline"))
        })?;

        let url = self.resolve(&item.path)?;
        let content = self.fetch_content(&url).await?;

        Ok(Section { item, url, content })
    }

    /// Fetch `url` and extract the sanitized content container.
    pub async fn fetch_content(&self, url: &Url) -> Result<PageContent> {
        let html = self.fetch_html(url).await?;
        let doc = Html::parse_document(&html);

        match content::extract_content(&doc, &self.content_selector) {
            Some(html) => Ok(PageContent::Found { html }),
            None => {
                debug!(%url, "content container not found");
                Ok(PageContent::NotFound)
            }
        }
    }
}

/// Append `chunk` to `body` unless the total would exceed `max`.
///
/// On overflow returns the total that would have been read.
fn append_limited(body: &mut Vec<u8>, chunk: &[u8], max: u64) -> std::result::Result<(), u64> {
    let total = (body.len() + chunk.len()) as u64;
    if total > max {
        return Err(total);
    }
    body.extend_from_slice(chunk);
    Ok(())
}
