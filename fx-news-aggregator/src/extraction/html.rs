use crate::utils::text::collapse_whitespace;
use scraper::{ElementRef, Html, Selector};

/// Article containers, most specific first.
pub const CONTENT_SELECTORS: &[&str] = &[
    "article",
    "div.article",
    "div.article-body",
    "main",
    "div#main-content",
    "div.content",
    "div.post-content",
    "div.entry-content",
    "div#content",
    "div.story-body",
    ".news-article",
    ".story",
    "#story-body",
    ".post-body",
    "#article-body",
    ".article-content",
    ".story-content",
    ".news-content",
    ".article__body",
    ".article__content",
    ".story__body",
];

const MIN_CONTAINER_CHARS: usize = 50;
const MIN_PARAGRAPH_CHARS: usize = 20;

/// Main text of a rendered page, or an empty string.
///
/// The first match of each selector is tried in order and accepted when it
/// holds more than 50 characters. Otherwise paragraphs longer than 20
/// characters are joined, if together they exceed 50 characters.
pub fn extract_from_html(page: &str) -> String {
    let document = Html::parse_document(page);

    for css in CONTENT_SELECTORS {
        let Ok(selector) = Selector::parse(css) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            let text = visible_text(element);
            if text.chars().count() > MIN_CONTAINER_CHARS {
                return text;
            }
        }
    }

    paragraph_fallback(&document)
}

fn paragraph_fallback(document: &Html) -> String {
    let Ok(selector) = Selector::parse("p") else {
        return String::new();
    };

    let paragraphs: Vec<String> = document
        .select(&selector)
        .map(visible_text)
        .filter(|p| p.chars().count() > MIN_PARAGRAPH_CHARS)
        .collect();

    let joined = paragraphs.join("\n");
    if joined.chars().count() > MIN_CONTAINER_CHARS {
        joined
    } else {
        String::new()
    }
}

// Text nodes below `element`, skipping script and style bodies.
fn visible_text(element: ElementRef) -> String {
    let mut parts = Vec::new();

    for node in element.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(|parent| parent.value().as_element())
            .map(|el| matches!(el.name(), "script" | "style" | "noscript"))
            .unwrap_or(false);
        if hidden {
            continue;
        }

        let cleaned = collapse_whitespace(text);
        if !cleaned.is_empty() {
            parts.push(cleaned);
        }
    }

    parts.join("\n")
}
