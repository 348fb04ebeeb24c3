//! Allow-list HTML sanitizer for report content.
//!
//! Input is parsed with an HTML5 parser and re-serialized: allowed elements
//! are emitted bare (no attributes), every other element is dropped while
//! its text is kept, and all text is escaped. Comments, doctypes and
//! processing instructions never survive. `<template>` contents are parsed
//! into a fragment node under the element and are walked like any children.

use ego_tree::NodeRef;
use scraper::{Html, Node};

/// Elements needed to render a tabular result set.
pub const TABLE_TAGS: &[&str] = &["table", "th", "tr", "td", "thead", "tbody", "tfoot"];

/// Sanitizes `input`, keeping only elements named in `allowed_tags`.
///
/// # Examples
///
/// ```
/// use reportcast_notify::sanitize::{clean, TABLE_TAGS};
///
/// let html = r#"<table onclick="x()"><tr><td><b>1</b></td></tr></table><script>bad()</script>"#;
/// let cleaned = clean(html, TABLE_TAGS);
/// assert!(cleaned.contains("<td>1</td>"));
/// assert!(!cleaned.contains("<script"));
/// assert!(!cleaned.contains("onclick"));
/// ```
pub fn clean(input: &str, allowed_tags: &[&str]) -> String {
    if input.trim().is_empty() {
        return String::new();
    }

    let fragment = Html::parse_fragment(input);
    let mut out = String::with_capacity(input.len());
    for child in fragment.root_element().children() {
        write_node(child, allowed_tags, &mut out);
    }
    out
}

/// Removes every tag, leaving escaped text only.
pub fn strip_tags(input: &str) -> String {
    clean(input, &[])
}

/// Keeps table structure and nothing else.
pub fn clean_table_html(input: &str) -> String {
    clean(input, TABLE_TAGS)
}

fn write_node(node: NodeRef<'_, Node>, allowed_tags: &[&str], out: &mut String) {
    match node.value() {
        Node::Text(text) => out.push_str(&html_escape::encode_text(&**text)),
        Node::Element(element) => {
            let name = element.name();
            let keep = allowed_tags.iter().any(|tag| *tag == name);
            if keep {
                out.push('<');
                out.push_str(name);
                out.push('>');
            }
            for child in node.children() {
                write_node(child, allowed_tags, out);
            }
            if keep {
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
        }
        Node::Fragment => {
            for child in node.children() {
                write_node(child, allowed_tags, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_tags_removes_all_markup_and_keeps_text() {
        let cleaned = strip_tags("<b>hi</b> <i>there</i>");
        assert_eq!(cleaned, "hi there");
    }

    #[test]
    fn strip_tags_removes_script_and_event_handlers() {
        let cleaned = strip_tags(r#"ok<script>alert(1)</script><img src=x onerror="alert(2)">"#);
        assert!(!cleaned.contains('<'));
        assert!(!cleaned.contains("onerror"));
        assert!(cleaned.starts_with("ok"));
    }

    #[test]
    fn strip_tags_escapes_literal_angle_brackets() {
        assert_eq!(strip_tags("a < b & c"), "a &lt; b &amp; c");
        // Entity-encoded markup stays inert text.
        assert_eq!(strip_tags("&lt;script&gt;"), "&lt;script&gt;");
    }

    #[test]
    fn strip_tags_drops_comments() {
        assert_eq!(strip_tags("before<!-- hidden -->after"), "beforeafter");
    }

    #[test]
    fn bare_table_rows_gain_implied_tbody() {
        assert_eq!(
            clean_table_html("<table><tr><td>1</td></tr></table>"),
            "<table><tbody><tr><td>1</td></tr></tbody></table>"
        );
    }

    #[test]
    fn template_contents_keep_their_text() {
        assert_eq!(strip_tags("<template>x</template>"), "x");
        assert_eq!(strip_tags("a<template><b>secret</b> note</template>"), "asecret note");
    }

    #[test]
    fn template_contents_are_cleaned_like_table_html() {
        let cleaned = clean_table_html("<template><script>x</script><td>t</td></template>");
        assert!(cleaned.contains('x'), "{cleaned}");
        assert!(cleaned.contains("<td>t</td>"), "{cleaned}");
        assert!(!cleaned.contains("<template"));
        assert!(!cleaned.contains("<script"));
    }

    #[test]
    fn empty_input_renders_as_empty() {
        assert_eq!(strip_tags(""), "");
        assert_eq!(clean_table_html("   "), "");
    }

    #[test]
    fn table_tags_survive_without_attributes() {
        let html = r#"<table border="1" onclick="steal()"><thead><tr><th style="x">A</th></tr></thead><tbody><tr><td class="c">1</td></tr></tbody><tfoot><tr><td>sum</td></tr></tfoot></table>"#;
        let cleaned = clean_table_html(html);
        assert_eq!(
            cleaned,
            "<table><thead><tr><th>A</th></tr></thead><tbody><tr><td>1</td></tr></tbody><tfoot><tr><td>sum</td></tr></tfoot></table>"
        );
    }

    #[test]
    fn non_table_tags_are_stripped_inside_cells() {
        let html = r#"<table><tr><td><a href="javascript:evil()">link</a><img src="x.png"></td></tr></table>"#;
        let cleaned = clean_table_html(html);
        assert!(cleaned.contains("<td>link</td>"));
        assert!(!cleaned.contains("href"));
        assert!(!cleaned.contains("<img"));
        assert!(!cleaned.contains("<a"));
    }

    #[test]
    fn script_after_table_is_removed_but_text_kept() {
        let html = "<table><tr><td>1</td></tr></table><script>bad()</script>";
        let cleaned = clean_table_html(html);
        assert!(cleaned.contains("<table>"));
        assert!(cleaned.contains("<tr><td>1</td></tr>"));
        assert!(cleaned.contains("</table>"));
        assert!(!cleaned.contains("<script"));
        assert!(cleaned.ends_with("bad()"));
    }

    #[test]
    fn style_blocks_do_not_survive() {
        let cleaned = clean_table_html("<style>td { color: red }</style><table><tr><td>v</td></tr></table>");
        assert!(!cleaned.contains("<style"));
        assert!(cleaned.contains("<td>v</td>"));
    }

    #[test]
    fn escaped_cell_values_stay_escaped() {
        let cleaned = clean_table_html("<table><tr><td>&lt;script&gt;x&lt;/script&gt;</td></tr></table>");
        assert!(cleaned.contains("<td>&lt;script&gt;x&lt;/script&gt;</td>"));
        assert!(!cleaned.contains("<script>"));
    }
}
