//! Visible-text extraction from a search results page.

use scraper::{ElementRef, Html, Node, Selector};

/// Container holding the organic results on a Google results page.
pub const RESULTS_CONTAINER: &str = "#main";

/// Markers Google puts on its bot-detection interstitial.
pub const BLOCKING_MARKERS: [&str; 2] = ["unusual traffic", "CAPTCHA"];

const SKIPPED_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// True when the page is a bot-detection page rather than results.
pub fn is_blocked_page(body: &str) -> bool {
    BLOCKING_MARKERS.iter().any(|marker| body.contains(marker))
}

/// Extracts the visible text of the results container.
///
/// Returns `None` when the page has no results container. Whitespace is
/// collapsed to single spaces.
pub fn extract_results_text(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(RESULTS_CONTAINER).ok()?;
    let container = document.select(&selector).next()?;

    let mut pieces = Vec::new();
    collect_visible_text(container, &mut pieces);
    Some(clean_text(&pieces.join(" ")))
}

fn collect_visible_text<'a>(element: ElementRef<'a>, out: &mut Vec<&'a str>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push(&**text),
            Node::Element(el) if SKIPPED_ELEMENTS.iter().any(|tag| *tag == el.name()) => {}
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_visible_text(child_el, out);
                }
            }
            _ => {}
        }
    }
}

fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
