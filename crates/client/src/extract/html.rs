//! Plain text from HTML, used before chunking.

use std::sync::LazyLock;

use ego_tree::iter::Edge;
use regex::Regex;
use scraper::Html;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template", "iframe", "svg", "head"];

const BLOCK_TAGS: &[&str] = &[
    "p", "div", "br", "li", "ul", "ol", "tr", "table", "section", "article", "main", "header", "footer", "nav",
    "aside", "blockquote", "pre", "h1", "h2", "h3", "h4", "h5", "h6", "dt", "dd", "hr", "title",
];

/// Collapse every whitespace run to a single space.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").into_owned()
}

/// Convert an HTML document to plain text.
///
/// Scripts, styles and other non-content elements are dropped, whitespace
/// inside each line is collapsed and block elements start new lines. Blank
/// lines are removed.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut raw = String::with_capacity(html.len() / 2);
    // Depth inside a skipped subtree; 0 means text is kept.
    let mut skipped = 0usize;

    for edge in document.root_element().traverse() {
        match edge {
            Edge::Open(node) => {
                if let Some(element) = node.value().as_element() {
                    let tag = element.name();
                    if skipped > 0 || SKIPPED_TAGS.contains(&tag) {
                        skipped += 1;
                    } else if BLOCK_TAGS.contains(&tag) {
                        raw.push('\n');
                    }
                } else if skipped == 0
                    && let Some(text) = node.value().as_text()
                {
                    raw.push_str(&collapse_whitespace(text));
                }
            }
            Edge::Close(node) => {
                if let Some(element) = node.value().as_element() {
                    if skipped > 0 {
                        skipped -= 1;
                    } else if BLOCK_TAGS.contains(&element.name()) {
                        raw.push('\n');
                    }
                }
            }
        }
    }

    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("a  b\n\n\tc"), "a b c");
        assert_eq!(collapse_whitespace("   "), " ");
    }

    #[test]
    fn test_html_to_text_blocks() {
        let html = r#"
            <html>
            <head><title>Ignored</title><style>p { color: red; }</style></head>
            <body>
                <h1>Ustawa</h1>
                <p>Art. 1.   Przepisy   ogólne.</p>
                <p>Art. 2. <b>Definicje</b> pojęć.</p>
                <script>var x = 1;</script>
            </body>
            </html>
        "#;

        let text = html_to_text(html);
        assert_eq!(text, "Ustawa\nArt. 1. Przepisy ogólne.\nArt. 2. Definicje pojęć.");
    }

    #[test]
    fn test_html_to_text_list() {
        let html = "<ul><li>one</li><li>two</li></ul>";
        assert_eq!(html_to_text(html), "one\ntwo");
    }

    #[test]
    fn test_html_to_text_empty() {
        assert_eq!(html_to_text(""), "");
        assert_eq!(html_to_text("<html><body>   </body></html>"), "");
    }

    #[test]
    fn test_html_to_text_plain_fragment() {
        assert_eq!(html_to_text("just some text"), "just some text");
    }

    #[test]
    fn test_html_to_text_skips_nested_script_content() {
        let html = "<div>kept<noscript><p>hidden <b>deep</b></p></noscript><p>after</p></div>";
        assert_eq!(html_to_text(html), "kept\nafter");
    }

    #[test]
    fn test_html_to_text_deep_nesting_on_small_stack() {
        let depth = 50_000;
        let html = format!("<html><body>{}x{}</body></html>", "<span>".repeat(depth), "</span>".repeat(depth));
        let text = std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(move || html_to_text(&html))
            .unwrap()
            .join()
            .unwrap();
        assert_eq!(text, "x");
    }
}
