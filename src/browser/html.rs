//! DOM snapshots backed by `scraper`
//!
//! `scraper::Html` is not `Send`, so documents are parsed per query and only
//! owned [`ElementHandle`]s leave this module.

use super::{BrowserError, ElementHandle};
use scraper::{ElementRef, Html, Selector};

/// Parses a CSS selector
pub fn parse_selector(selector: &str) -> Result<Selector, BrowserError> {
    Selector::parse(selector).map_err(|e| BrowserError::InvalidSelector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

/// Snapshots one element
pub fn element_handle(element: ElementRef<'_>, generation: u64) -> ElementHandle {
    let text = element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ");

    let attributes = element
        .value()
        .attrs()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();

    ElementHandle {
        text,
        attributes,
        outer_html: element.html(),
        inner_html: element.inner_html(),
        generation,
    }
}

/// Returns handles for every element of `document` matching `selector`
///
/// # Examples
///
/// ```
/// use job_harvest::browser::select_handles;
///
/// let html = r#"<ul><li data-cy="location">Austin, TX</li></ul>"#;
/// let found = select_handles(html, "li[data-cy='location']", 1).unwrap();
/// assert_eq!(found[0].text, "Austin, TX");
/// ```
pub fn select_handles(
    document: &str,
    selector: &str,
    generation: u64,
) -> Result<Vec<ElementHandle>, BrowserError> {
    let selector = parse_selector(selector)?;
    let document = Html::parse_document(document);

    Ok(document
        .select(&selector)
        .map(|element| element_handle(element, generation))
        .collect())
}

/// Returns handles for descendants of `parent` matching `selector`
///
/// The parent itself never matches.
pub fn select_handles_within(
    parent: &ElementHandle,
    selector: &str,
) -> Result<Vec<ElementHandle>, BrowserError> {
    let selector = parse_selector(selector)?;
    let fragment = Html::parse_fragment(&parent.outer_html);

    // The fragment root is a synthetic <html>; the parent is its first element.
    let Some(root) = fragment.root_element().children().find_map(ElementRef::wrap) else {
        return Ok(Vec::new());
    };

    Ok(root
        .select(&selector)
        .map(|element| element_handle(element, parent.generation))
        .collect())
}
