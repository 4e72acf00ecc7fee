//! Post-conversion cleanup passes for Markdown output.
//!
//! Each pass is a function `&str -> String` applied in sequence.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Run all cleanup passes on raw Markdown text.
pub(crate) fn run_pipeline(md: &str, base_url: Option<&Url>) -> String {
    let mut result = strip_wrapper_tags(md);

    result = collapse_blank_lines(&result);
    result = resolve_links(&result, base_url);
    result = trim_line_ends(&result);
    result = ensure_trailing_newline(&result);

    result
}

/// Remove layout tags that htmd passes through, keeping their text.
///
/// Fenced code blocks are left untouched.
fn strip_wrapper_tags(md: &str) -> String {
    static WRAPPER_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"</?(?:div|span|section|article|aside|header|footer|figure|figcaption|details|summary)(?:\s[^>]*)?>")
            .expect("valid regex")
    });

    let mut in_fence = false;
    let lines: Vec<String> = md
        .lines()
        .map(|line| {
            if line.trim_start().starts_with("```") {
                in_fence = !in_fence;
                return line.to_string();
            }
            if in_fence {
                line.to_string()
            } else {
                WRAPPER_RE.replace_all(line, "").into_owned()
            }
        })
        .collect();

    lines.join("\n")
}

/// Collapse runs of 3+ blank lines into exactly 2.
fn collapse_blank_lines(md: &str) -> String {
    static BLANKS_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n{4,}").expect("valid regex"));

    BLANKS_RE.replace_all(md, "\n\n\n").into_owned()
}

/// Resolve relative link targets against the page URL. Images and anchors are skipped.
fn resolve_links(md: &str, base_url: Option<&Url>) -> String {
    static LINK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(!?)\[([^\]]*)\]\(([^)\s]+)\)").expect("valid regex"));

    let Some(base) = base_url else {
        return md.to_string();
    };

    LINK_RE
        .replace_all(md, |caps: &regex::Captures| {
            let (bang, text, href) = (&caps[1], &caps[2], &caps[3]);

            let keep = !bang.is_empty()
                || href.starts_with('#')
                || href.starts_with("mailto:")
                || Url::parse(href).is_ok();
            if keep {
                return caps[0].to_string();
            }

            match base.join(href) {
                Ok(resolved) => format!("[{text}]({resolved})"),
                Err(_) => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Strip trailing whitespace from every line.
fn trim_line_ends(md: &str) -> String {
    md.lines().map(str::trim_end).collect::<Vec<_>>().join("\n")
}

/// Ensure the text ends with exactly one newline.
fn ensure_trailing_newline(md: &str) -> String {
    format!("{}\n", md.trim_end_matches('\n'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapper_tags_removed_outside_fences() {
        let input = "<div>Kept text</div>\n```html\n<div>raw</div>\n```";
        let result = strip_wrapper_tags(input);
        assert_eq!(result, "Kept text\n```html\n<div>raw</div>\n```");
    }

    #[test]
    fn blank_runs_collapse() {
        assert_eq!(collapse_blank_lines("a\n\n\n\n\nb"), "a\n\n\nb");
        assert_eq!(collapse_blank_lines("a\n\nb"), "a\n\nb");
    }

    #[test]
    fn relative_links_resolved_against_page() {
        let base = Url::parse("https://deepwiki.com/acme/widget").unwrap();
        let result = resolve_links("See [API](/acme/widget/2-api).", Some(&base));
        assert_eq!(result, "See [API](https://deepwiki.com/acme/widget/2-api).");
    }

    #[test]
    fn absolute_anchor_and_image_links_untouched() {
        let base = Url::parse("https://deepwiki.com/acme/widget").unwrap();
        let input = "[gh](https://github.com/acme) [top](#top) ![logo](/logo.png)";
        assert_eq!(resolve_links(input, Some(&base)), input);
    }

    #[test]
    fn no_base_leaves_links() {
        assert_eq!(resolve_links("[x](/y)", None), "[x](/y)");
    }

    #[test]
    fn pipeline_trims_and_terminates() {
        let result = run_pipeline("# Title   \n\n\n\n\n<span>Body</span>\n\n", None);
        assert_eq!(result, "# Title\n\n\nBody\n");
    }
}
