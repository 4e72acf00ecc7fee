//! Content container extraction and sanitizing.
//!
//! The wiki wraps rendered Markdown in a single container. We return that
//! container's inner HTML with every `<svg>` subtree removed and every `class`
//! attribute dropped. Everything else serializes as `innerHTML` would.

use scraper::{ElementRef, Html, Node, Selector};

/// Elements that never have a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose text children serialize without escaping.
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "style", "script", "xmp", "iframe", "noembed", "noframes", "noscript", "plaintext",
];

/// Sanitized inner HTML of the first element matching `selector`.
pub fn extract_content(doc: &Html, selector: &Selector) -> Option<String> {
    let container = doc.select(selector).next()?;
    let mut out = String::new();
    write_children(container, &mut out);
    Some(out)
}

fn write_children(el: ElementRef<'_>, out: &mut String) {
    let raw_text = RAW_TEXT_ELEMENTS.contains(&el.value().name());

    for child in el.children() {
        match child.value() {
            Node::Text(text) if raw_text => out.push_str(text),
            Node::Text(text) => push_escaped(out, text, false),
            Node::Comment(comment) => {
                out.push_str("<!--");
                out.push_str(comment);
                out.push_str("-->");
            }
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    write_element(child_el, out);
                }
            }
            _ => {}
        }
    }
}

fn write_element(el: ElementRef<'_>, out: &mut String) {
    let name = el.value().name();
    if name == "svg" {
        return;
    }

    out.push('<');
    out.push_str(name);
    for (attr, value) in el.value().attrs() {
        if attr == "class" {
            continue;
        }
        out.push(' ');
        out.push_str(attr);
        out.push_str("=\"");
        push_escaped(out, value, true);
        out.push('"');
    }
    out.push('>');

    if VOID_ELEMENTS.contains(&name) {
        return;
    }

    write_children(el, out);
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn push_escaped(out: &mut String, text: &str, in_attribute: bool) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' if !in_attribute => out.push_str("&lt;"),
            '>' if !in_attribute => out.push_str("&gt;"),
            '"' if in_attribute => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}
