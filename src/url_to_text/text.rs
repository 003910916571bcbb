use scraper::{node::Node, ElementRef, Html};

use crate::json::truncate_chars;

/// Visible text of an HTML page, one text node per line.
///
/// Script, style and page-chrome elements (navigation, header, footer) are
/// dropped along with anything marked hidden. When the text is longer than
/// `max_chars` characters it is cut there and `...` is appended.
pub fn page_text(html: &str, max_chars: usize) -> String {
    let document = Html::parse_document(html);
    let mut lines = Vec::new();
    collect_text(&document.root_element(), &mut lines);

    let text = lines.join("\n");
    if text.chars().count() > max_chars {
        let mut truncated = truncate_chars(&text, max_chars);
        truncated.push_str("...");
        truncated
    } else {
        text
    }
}

fn collect_text(element: &ElementRef, lines: &mut Vec<String>) {
    if is_hidden(element) || should_skip_element(element) {
        return;
    }

    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    lines.push(trimmed.to_string());
                }
            }
            Node::Element(_) => {
                if let Some(child_ref) = ElementRef::wrap(child) {
                    collect_text(&child_ref, lines);
                }
            }
            _ => {}
        }
    }
}

fn is_hidden(element: &ElementRef) -> bool {
    element.value().attr("hidden").is_some()
        || element
            .value()
            .attr("style")
            .map(|s| s.contains("display: none") || s.contains("visibility: hidden"))
            .unwrap_or(false)
}

fn should_skip_element(element: &ElementRef) -> bool {
    matches!(
        element.value().name().to_lowercase().as_str(),
        "script" | "style" | "nav" | "footer" | "header" | "noscript"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_text_drops_chrome() {
        let html = r#"
            <html>
              <head><style>body { color: red; }</style><script>var x = 1;</script></head>
              <body>
                <header>Site Header</header>
                <nav><a href="/">Home</a></nav>
                <h1>  Fluffy Pancakes </h1>
                <ul><li>2 cups flour</li><li>1 egg</li></ul>
                <p style="display: none">Subscribe now</p>
                <noscript>Enable JavaScript</noscript>
                <footer>Copyright</footer>
              </body>
            </html>
        "#;

        let text = page_text(html, 6000);
        assert_eq!(text, "Fluffy Pancakes\n2 cups flour\n1 egg");
    }

    #[test]
    fn test_page_text_truncates() {
        let html = "<p>abcdefghij</p>";
        assert_eq!(page_text(html, 4), "abcd...");
        assert_eq!(page_text(html, 10), "abcdefghij");
    }

    #[test]
    fn test_page_text_empty_document() {
        assert_eq!(page_text("", 100), "");
    }
}
