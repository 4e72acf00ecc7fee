//! HTML-to-Markdown conversion for sanitized wiki content.
//!
//! Tables are rewritten to pipe tables first (htmd 0.1 has no table support),
//! then `htmd` converts the rest and the cleanup passes tidy the result.

mod cleanup;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};
use url::Url;

use deepwiki_shared::{DeepwikiError, Result};

/// Tags dropped entirely during conversion.
const SKIP_TAGS: &[&str] = &["script", "style", "nav", "iframe", "noscript", "svg"];

/// Convert a content HTML fragment to Markdown.
///
/// Relative links are resolved against `source_url` when given.
#[instrument(skip(content_html), fields(bytes = content_html.len()))]
pub fn convert(content_html: &str, source_url: Option<&Url>) -> Result<String> {
    let content_html = preprocess_tables(content_html);

    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(SKIP_TAGS.to_vec())
        .build();

    let raw = converter
        .convert(&content_html)
        .map_err(|e| DeepwikiError::Conversion(format!("htmd conversion failed: {e}")))?;

    let markdown = cleanup::run_pipeline(&raw, source_url);
    debug!(raw_len = raw.len(), final_len = markdown.len(), "markdown conversion complete");

    Ok(markdown)
}

/// Replace every `<table>` with an equivalent pipe table.
fn preprocess_tables(html: &str) -> String {
    let table_sel = Selector::parse("table").expect("valid selector");
    let doc = Html::parse_fragment(html);

    let tables: Vec<ElementRef<'_>> = doc.select(&table_sel).collect();
    if tables.is_empty() {
        return html.to_string();
    }

    // Re-serialize so the table markup we search for is byte-identical.
    let mut result = doc.root_element().inner_html();
    for table in tables {
        result = result.replacen(&table.html(), &table_to_markdown(table), 1);
    }
    result
}

/// Render one table element as a Markdown pipe table.
fn table_to_markdown(table: ElementRef<'_>) -> String {
    let row_sel = Selector::parse("tr").expect("valid selector");
    let cell_sel = Selector::parse("th, td").expect("valid selector");

    let rows: Vec<Vec<String>> = table
        .select(&row_sel)
        .map(|row| {
            row.select(&cell_sel)
                .map(|cell| cell.text().collect::<String>().trim().replace('|', "\\|"))
                .collect::<Vec<_>>()
        })
        .filter(|cells| !cells.is_empty())
        .collect();

    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    if columns == 0 {
        return String::new();
    }

    let render = |cells: &[String]| {
        let mut padded = cells.to_vec();
        padded.resize(columns, String::new());
        format!("| {} |\n", padded.join(" | "))
    };

    let mut md = String::from("\n\n");
    md.push_str(&render(&rows[0]));
    md.push_str(&render(&vec!["---".to_string(); columns]));
    for row in &rows[1..] {
        md.push_str(&render(row));
    }
    md.push('\n');
    md
}
