//! CLI command definitions, routing, and tracing setup.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::info;
use url::Url;

use deepwiki_fetch::{PageContent, WikiClient};
use deepwiki_index::IndexBuilder;
use deepwiki_shared::{
    AppConfig, DocumentIndex, FetchConfig, IndexConfig, RepoRef, init_config, load_config,
    load_config_from,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// deepwiki: outlines and content for repository wikis.
#[derive(Parser)]
#[command(
    name = "deepwiki",
    version,
    about = "Extract outlines and content from repository wiki pages.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.deepwiki/deepwiki.toml.
    #[arg(long, global = true, env = "DEEPWIKI_CONFIG")]
    pub config: Option<PathBuf>,

    /// Wiki host, overriding the config file.
    #[arg(long, global = true, env = "DEEPWIKI_BASE_URL")]
    pub base_url: Option<String>,

    /// Print JSON on a single line.
    #[arg(long, global = true)]
    pub compact: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Output format for page content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum ContentFormat {
    Html,
    Markdown,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Fetch a repository wiki and print its outline as JSON.
    Index {
        /// Repository as owner/repo.
        repo: String,
    },

    /// Fetch a repository wiki and print its outline as indented text.
    Outline {
        /// Repository as owner/repo.
        repo: String,
    },

    /// Build the outline from a saved HTML page.
    Parse {
        /// Path to the HTML file.
        file: PathBuf,
    },

    /// Print the rendered overview of a repository wiki.
    Overview {
        /// Repository as owner/repo.
        repo: String,

        /// Output format.
        #[arg(short, long, default_value = "html")]
        format: ContentFormat,
    },

    /// Print the page of one outline section.
    Page {
        /// Repository as owner/repo.
        repo: String,

        /// Outline id, e.g. 2.1.
        id: String,

        /// Output format.
        #[arg(short, long, default_value = "html")]
        format: ContentFormat,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "deepwiki=info",
        1 => "deepwiki=debug",
        _ => "deepwiki=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(&cli)?;

    match cli.command {
        Command::Index { repo } => cmd_index(&config, &repo).await,
        Command::Outline { repo } => cmd_outline(&config, &repo).await,
        Command::Parse { file } => cmd_parse(&config, &file),
        Command::Overview { repo, format } => cmd_overview(&config, &repo, format).await,
        Command::Page { repo, id, format } => cmd_page(&config, &repo, &id, format).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(&config),
        },
    }
}

/// Load the config file and apply global flag overrides.
fn resolve_config(cli: &Cli) -> Result<AppConfig> {
    let config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(apply_overrides(cli, config))
}

fn apply_overrides(cli: &Cli, mut config: AppConfig) -> AppConfig {
    if let Some(base_url) = &cli.base_url {
        config.defaults.base_url = base_url.clone();
    }
    if cli.compact {
        config.defaults.pretty = false;
    }
    config
}

fn parse_repo(repo: &str) -> Result<RepoRef> {
    Ok(repo.parse::<RepoRef>()?)
}

fn wiki_client(config: &AppConfig) -> Result<WikiClient> {
    Ok(WikiClient::new(FetchConfig::try_from(config)?)?)
}

fn index_builder(config: &AppConfig) -> Result<IndexBuilder> {
    Ok(IndexBuilder::new(&IndexConfig::from(config))?)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_index(config: &AppConfig, repo: &str) -> Result<()> {
    let repo = parse_repo(repo)?;
    let index = fetch_index(config, &repo).await?;
    print_json(&index, config.defaults.pretty)
}

async fn cmd_outline(config: &AppConfig, repo: &str) -> Result<()> {
    let repo = parse_repo(repo)?;
    let index = fetch_index(config, &repo).await?;
    print!("{}", render_outline(&index));
    Ok(())
}

async fn fetch_index(config: &AppConfig, repo: &RepoRef) -> Result<DocumentIndex> {
    let client = wiki_client(config)?;
    let builder = index_builder(config)?;

    info!(%repo, base_url = %client.base_url(), "fetching outline");
    let spinner = Spinner::start(format!("Fetching {repo}"));
    let index = client.fetch_index(repo, &builder).await;
    spinner.finish();

    Ok(index?)
}

fn cmd_parse(config: &AppConfig, file: &Path) -> Result<()> {
    let html = std::fs::read_to_string(file)
        .map_err(|e| eyre!("cannot read '{}': {e}", file.display()))?;

    let index = index_builder(config)?.build_from_html(&html);
    info!(file = %file.display(), sections = index.len(), "outline parsed");

    print_json(&index, config.defaults.pretty)
}

async fn cmd_overview(config: &AppConfig, repo: &str, format: ContentFormat) -> Result<()> {
    let repo = parse_repo(repo)?;
    let client = wiki_client(config)?;

    let spinner = Spinner::start(format!("Fetching {repo} overview"));
    let content = client.fetch_overview(&repo).await;
    spinner.finish();

    match content? {
        PageContent::Found { html } => {
            let page_url = client.page_url(&repo)?;
            print_content(&html, format, &page_url)
        }
        PageContent::NotFound => {
            println!("Documentation not found for {repo}.");
            Ok(())
        }
    }
}

async fn cmd_page(config: &AppConfig, repo: &str, id: &str, format: ContentFormat) -> Result<()> {
    let repo = parse_repo(repo)?;
    let client = wiki_client(config)?;
    let builder = index_builder(config)?;

    let spinner = Spinner::start(format!("Fetching {repo} section {id}"));
    let section = client.fetch_section(&repo, id, &builder).await;
    spinner.finish();
    let section = section?;

    info!(id, title = %section.item.title, url = %section.url, "section fetched");

    match section.content {
        PageContent::Found { html } => print_content(&html, format, &section.url),
        PageContent::NotFound => {
            println!("Documentation not found for {repo} section {id}.");
            Ok(())
        }
    }
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{json}");
    Ok(())
}

fn print_content(html: &str, format: ContentFormat, source_url: &Url) -> Result<()> {
    match format {
        ContentFormat::Html => println!("{html}"),
        ContentFormat::Markdown => print!("{}", deepwiki_markdown::convert(html, Some(source_url))?),
    }
    Ok(())
}

/// Render the outline as indented `id title` lines, preceded by the metadata line.
fn render_outline(index: &DocumentIndex) -> String {
    let mut out = String::new();

    if !index.metadata.is_empty() {
        let _ = writeln!(
            out,
            "Last updated: {} ({})",
            index.metadata.last_updated, index.metadata.version
        );
    }

    for item in index.iter() {
        let indent = "  ".repeat(item.depth());
        let _ = writeln!(out, "{indent}{} {}", item.id, item.title.trim());
    }

    out
}

// ---------------------------------------------------------------------------
// Progress spinner
// ---------------------------------------------------------------------------

/// Spinner on stderr while a request is in flight.
struct Spinner {
    bar: ProgressBar,
}

impl Spinner {
    fn start(message: String) -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            bar.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
        }
        bar.set_message(message);
        bar.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { bar }
    }

    fn finish(self) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deepwiki_shared::{DocumentItem, DocumentMetadata};

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "deepwiki",
            "page",
            "acme/widget",
            "2.1",
            "--format",
            "markdown",
            "--base-url",
            "http://localhost:9000",
            "--compact",
        ])
        .unwrap();

        assert!(cli.compact);
        assert_eq!(cli.base_url.as_deref(), Some("http://localhost:9000"));
        match cli.command {
            Command::Page { repo, id, format } => {
                assert_eq!(repo, "acme/widget");
                assert_eq!(id, "2.1");
                assert_eq!(format, ContentFormat::Markdown);
            }
            _ => panic!("expected page command"),
        }
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from([
            "deepwiki",
            "--base-url",
            "http://localhost:9000",
            "--compact",
            "config",
            "show",
        ])
        .unwrap();
        let config = apply_overrides(&cli, AppConfig::default());
        assert_eq!(config.defaults.base_url, "http://localhost:9000");
        assert!(!config.defaults.pretty);
    }

    #[test]
    fn config_untouched_without_flags() {
        let cli = Cli::try_parse_from(["deepwiki", "outline", "acme/widget"]).unwrap();
        let config = apply_overrides(&cli, AppConfig::default());
        assert_eq!(config.defaults.base_url, AppConfig::default().defaults.base_url);
        assert!(config.defaults.pretty);
    }

    #[test]
    fn rejects_malformed_repo() {
        assert!(parse_repo("just-a-name").is_err());
        assert!(parse_repo("acme/widget").is_ok());
    }

    #[test]
    fn outline_is_indented_by_depth() {
        let index = DocumentIndex {
            metadata: DocumentMetadata {
                last_updated: "12 March 2024".into(),
                version: "a1b2c3".into(),
            },
            items: vec![
                DocumentItem::new(
                    "1",
                    " Intro ",
                    "/1-intro",
                    vec![DocumentItem::new(
                        "1.1",
                        "Setup",
                        "/1.1-setup",
                        vec![DocumentItem::new("1.1.1", "Deps", "/1.1.1-deps", vec![])],
                    )],
                ),
                DocumentItem::new("2", "API", "/2-api", vec![]),
            ],
        };

        assert_eq!(
            render_outline(&index),
            "Last updated: 12 March 2024 (a1b2c3)\n1 Intro\n  1.1 Setup\n    1.1.1 Deps\n2 API\n"
        );
    }

    #[test]
    fn outline_without_metadata_has_no_header() {
        let index = DocumentIndex {
            metadata: DocumentMetadata::default(),
            items: vec![DocumentItem::new("1", "Only", "/1-only", vec![])],
        };
        assert_eq!(render_outline(&index), "1 Only\n");
    }
}
