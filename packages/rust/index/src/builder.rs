//! Document index builder.
//!
//! Runs the full pipeline over one parsed page: metadata, link extraction,
//! forest assembly and leaf normalization. Building never fails; anything the
//! page does not provide degrades to empty values or excluded items.

use scraper::{Html, Selector};
use tracing::{debug, instrument};

use deepwiki_shared::{DeepwikiError, DocumentIndex, IndexConfig, Result};

use crate::{forest, items, metadata, normalize};

/// Builds a [`DocumentIndex`] from parsed wiki pages.
#[derive(Debug, Clone)]
pub struct IndexBuilder {
    metadata_selector: Selector,
    links_selector: Selector,
}

impl IndexBuilder {
    /// Create a builder from configured selectors.
    ///
    /// Fails only if a selector is not valid CSS.
    pub fn new(config: &IndexConfig) -> Result<Self> {
        Ok(Self {
            metadata_selector: parse_selector(&config.metadata_selector)?,
            links_selector: parse_selector(&config.links_selector)?,
        })
    }

    /// Build the index for a parsed document.
    #[instrument(skip_all)]
    pub fn build(&self, doc: &Html) -> DocumentIndex {
        let metadata = metadata::extract_metadata(doc, &self.metadata_selector);
        let extracted = items::extract_items(doc, &self.links_selector);
        let link_count = extracted.len();

        let items = normalize::normalize(forest::assemble(extracted));

        debug!(
            links = link_count,
            top_level = items.len(),
            version = %metadata.version,
            "document index built"
        );

        DocumentIndex { metadata, items }
    }

    /// Parse `html` as a full document and build its index.
    pub fn build_from_html(&self, html: &str) -> DocumentIndex {
        self.build(&Html::parse_document(html))
    }
}

impl Default for IndexBuilder {
    /// A builder using the built-in selectors.
    fn default() -> Self {
        Self::new(&IndexConfig::default()).expect("built-in selectors are valid")
    }
}

/// Build an index with the built-in selectors.
pub fn build_index(doc: &Html) -> DocumentIndex {
    IndexBuilder::default().build(doc)
}

fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| DeepwikiError::config(format!("invalid selector `{css}`: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use deepwiki_shared::{DocumentItem, DocumentMetadata};

    fn page(meta_text: &str, links: &[(Option<&str>, &str)]) -> Html {
        let anchors: String = links
            .iter()
            .map(|(href, title)| match href {
                Some(href) => format!(r#"<li><a href="{href}">{title}</a></li>"#),
                None => format!("<li><a>{title}</a></li>"),
            })
            .collect();
        Html::parse_document(&format!(
            "<html><body><div><div><div>{meta_text}</div></div>\
             <nav><ul>{anchors}</ul></nav></div></body></html>"
        ))
    }

    fn load_fixture(name: &str) -> String {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../../fixtures")
            .join(name);
        std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("missing fixture {name}: {e}"))
    }

    /// Walk the forest, collecting (item, ancestor ids) pairs.
    fn walk<'a>(items: &'a [DocumentItem], ancestors: &mut Vec<&'a str>, out: &mut Vec<(&'a DocumentItem, Vec<&'a str>)>) {
        for item in items {
            out.push((item, ancestors.clone()));
            ancestors.push(&item.id);
            walk(item.children(), ancestors, out);
            ancestors.pop();
        }
    }

    fn all_nodes(index: &DocumentIndex) -> Vec<(&DocumentItem, Vec<&str>)> {
        let mut out = Vec::new();
        walk(&index.items, &mut Vec::new(), &mut out);
        out
    }

    fn scenario_b() -> Html {
        page(
            "",
            &[
                (Some("/1-intro"), "Intro"),
                (Some("/1.1-setup"), "Setup"),
                (Some("/1.2-usage"), "Usage"),
                (Some("/2-api"), "API"),
            ],
        )
    }

    // -----------------------------------------------------------------------
    // Scenarios
    // -----------------------------------------------------------------------

    #[test]
    fn metadata_from_last_updated_line() {
        let index = build_index(&page("Last updated: 12 March 2024 (a1b2c3)", &[]));
        assert_eq!(
            index.metadata,
            DocumentMetadata {
                last_updated: "12 March 2024".into(),
                version: "a1b2c3".into(),
            }
        );
        assert!(index.items.is_empty());
    }

    #[test]
    fn nested_outline_from_flat_links() {
        let index = build_index(&scenario_b());

        let top: Vec<&str> = index.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(top, ["1", "2"]);

        let children: Vec<(&str, &str)> = index.items[0]
            .children()
            .iter()
            .map(|i| (i.id.as_str(), i.title.as_str()))
            .collect();
        assert_eq!(children, [("1.1", "Setup"), ("1.2", "Usage")]);

        let json = serde_json::to_value(&index).unwrap();
        assert!(json["items"][1].get("children").is_none());
        assert_eq!(json["items"][0]["children"][1]["path"], "/1.2-usage");
    }

    #[test]
    fn orphan_section_is_dropped() {
        let index = build_index(&page("", &[(Some("/1-a"), "A"), (Some("/3.5-x"), "X")]));
        assert!(index.find("3.5").is_none());
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn link_without_href_is_excluded() {
        let index = build_index(&page("", &[(None, "Nowhere"), (Some("/1-a"), "A")]));
        assert_eq!(index.len(), 1);
        assert!(index.iter().all(|i| !i.id.is_empty() && !i.path.is_empty()));
        assert!(index.iter().all(|i| i.title != "Nowhere"));
    }

    #[test]
    fn missing_or_unmatched_metadata_is_empty() {
        let unmatched = build_index(&page("Last updated: yesterday", &[]));
        assert!(unmatched.metadata.is_empty());

        let missing = build_index(&Html::parse_document("<ul><li><a href=\"/1-a\">A</a></li></ul>"));
        assert_eq!(missing.metadata, DocumentMetadata::default());
        assert_eq!(missing.len(), 1);

        let json = serde_json::to_value(&missing.metadata).unwrap();
        assert_eq!(json, serde_json::json!({ "lastUpdated": "", "version": "" }));
    }

    // -----------------------------------------------------------------------
    // Properties
    // -----------------------------------------------------------------------

    #[test]
    fn building_twice_is_identical() {
        let doc = Html::parse_document(&load_fixture("html/wiki-page.html"));
        let builder = IndexBuilder::default();
        assert_eq!(builder.build(&doc), builder.build(&doc));
    }

    #[test]
    fn sibling_order_matches_anchor_order() {
        let doc = Html::parse_document(&load_fixture("html/wiki-page.html"));
        let index = build_index(&doc);

        let anchor_order: Vec<String> = items::extract_items(&doc, &Selector::parse("ul a").unwrap())
            .into_iter()
            .map(|i| i.id)
            .collect();
        let position = |id: &str| anchor_order.iter().position(|a| a == id).unwrap();

        let mut groups = vec![index.items.as_slice()];
        groups.extend(index.iter().map(DocumentItem::children));
        for group in groups {
            let positions: Vec<usize> = group.iter().map(|i| position(&i.id)).collect();
            assert!(positions.windows(2).all(|w| w[0] < w[1]), "out of order: {positions:?}");
        }
    }

    #[test]
    fn ids_are_unique() {
        let doc = page(
            "",
            &[
                (Some("/1-a"), "A"),
                (Some("/1.1-b"), "B"),
                (Some("/1-a-again"), "A2"),
                (Some("/1.1-b-again"), "B2"),
            ],
        );
        let index = build_index(&doc);
        let ids: Vec<&str> = index.iter().map(|i| i.id.as_str()).collect();
        let unique: HashSet<&str> = ids.iter().copied().collect();
        assert_eq!(ids.len(), unique.len());
    }

    #[test]
    fn depth_matches_id_segments() {
        let index = build_index(&Html::parse_document(&load_fixture("html/wiki-page.html")));
        for (item, ancestors) in all_nodes(&index) {
            assert_eq!(ancestors.len(), item.depth(), "item {}", item.id);
            for ancestor in &ancestors {
                assert!(item.id.starts_with(&format!("{ancestor}.")));
            }
        }
    }

    #[test]
    fn no_empty_children_anywhere() {
        let index = build_index(&Html::parse_document(&load_fixture("html/wiki-page.html")));
        let json = serde_json::to_value(&index).unwrap();

        fn check(items: &serde_json::Value) {
            for item in items.as_array().unwrap() {
                if let Some(children) = item.get("children") {
                    assert!(!children.as_array().unwrap().is_empty());
                    check(children);
                }
            }
        }
        check(&json["items"]);
    }

    // -----------------------------------------------------------------------
    // Fixtures and configuration
    // -----------------------------------------------------------------------

    #[test]
    fn wiki_page_fixture_matches_expected_index() {
        let index = IndexBuilder::default().build_from_html(&load_fixture("html/wiki-page.html"));
        let expected: DocumentIndex =
            serde_json::from_str(&load_fixture("json/index.fixture.json")).unwrap();
        assert_eq!(index, expected);
    }

    #[test]
    fn custom_selectors_are_used() {
        let config = IndexConfig {
            metadata_selector: "footer".into(),
            links_selector: "aside a".into(),
        };
        let builder = IndexBuilder::new(&config).unwrap();
        let index = builder.build_from_html(
            r#"<aside><a href="/1-a">A</a></aside><footer>Last updated: 2 May 2025 (beef)</footer>"#,
        );
        assert_eq!(index.metadata.version, "beef");
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn invalid_selector_is_config_error() {
        let config = IndexConfig {
            metadata_selector: "div >".into(),
            ..IndexConfig::default()
        };
        let err = IndexBuilder::new(&config).unwrap_err();
        assert!(matches!(err, DeepwikiError::Config { .. }));
    }
}
