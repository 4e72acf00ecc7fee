//! deepwiki CLI: outline and content extraction for repository wikis.
//!
//! Fetches a repository's wiki page, turns its sidebar into a nested outline,
//! and prints overview or section content as HTML or Markdown.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
