//! HTML-to-text extraction for rendered wiki sections
//!
//! Upstream markup can change without notice, so the extraction strategy sits
//! behind [`ExcerptExtractor`] and can be swapped without touching the
//! pipeline.

use crate::wikivoyage::WikivoyageError;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::debug;

/// Turns a rendered section into a flat list of short text items
pub trait ExcerptExtractor: Send + Sync {
    fn extract(&self, html: &str, limit: usize) -> Vec<String>;
}

/// Takes the text of every `<li>` in document order
pub struct ListItemExtractor {
    item_selector: Selector,
    whitespace: Regex,
}

impl ListItemExtractor {
    pub fn new() -> Result<Self, WikivoyageError> {
        Ok(Self {
            item_selector: Selector::parse("li")
                .map_err(|e| WikivoyageError::ParseError(format!("Invalid list item selector: {}", e)))?,
            whitespace: Regex::new(r"\s+")
                .map_err(|e| WikivoyageError::ParseError(format!("Invalid whitespace pattern: {}", e)))?,
        })
    }
}

impl ExcerptExtractor for ListItemExtractor {
    fn extract(&self, html: &str, limit: usize) -> Vec<String> {
        let fragment = Html::parse_fragment(html);

        let items: Vec<String> = fragment
            .select(&self.item_selector)
            .map(|li| {
                let text = li.text().collect::<String>();
                self.whitespace.replace_all(&text, " ").trim().to_string()
            })
            .filter(|item| !item.is_empty())
            .take(limit)
            .collect();

        debug!(html_length = html.len(), items = items.len(), "Extracted list items");
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extractor_creation() {
        assert!(ListItemExtractor::new().is_ok());
    }

    #[test]
    fn test_collapses_whitespace_and_trims() {
        let extractor = ListItemExtractor::new().unwrap();
        let html = "<ul><li>  <b>Louvre</b>\n   museum,\tart  </li><li>Eiffel\u{a0}Tower</li></ul>";
        assert_eq!(
            extractor.extract(html, 6),
            vec!["Louvre museum, art".to_string(), "Eiffel Tower".to_string()]
        );
    }

    #[test]
    fn test_caps_items_and_skips_empty_ones() {
        let extractor = ListItemExtractor::new().unwrap();
        let mut html = String::from("<ul><li>   </li>");
        for i in 0..10 {
            html.push_str(&format!("<li>Item {}</li>", i));
        }
        html.push_str("</ul>");

        let items = extractor.extract(&html, 6);
        assert_eq!(items.len(), 6);
        assert_eq!(items[0], "Item 0");
        assert_eq!(items[5], "Item 5");
    }

    #[test]
    fn test_nested_items_include_descendant_text() {
        let extractor = ListItemExtractor::new().unwrap();
        let html = "<ul><li>Markets<ul><li>Flower market</li></ul></li></ul>";
        assert_eq!(
            extractor.extract(html, 6),
            vec!["MarketsFlower market".to_string(), "Flower market".to_string()]
        );
    }

    #[test]
    fn test_no_list_items() {
        let extractor = ListItemExtractor::new().unwrap();
        assert!(extractor.extract("<p>Nothing listed here.</p>", 6).is_empty());
        assert!(extractor.extract("", 6).is_empty());
    }
}
