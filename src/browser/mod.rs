//! Browser collaborator
//!
//! The crawl pipeline never talks to a page directly. It drives a
//! [`Browser`], which loads URLs, runs scripts, takes screenshots and answers
//! DOM queries with owned [`ElementHandle`] snapshots.
//!
//! [`HttpBrowser`] is the shipped implementation: plain HTTP fetches whose DOM
//! queries are answered by `scraper`. A headless browser can be plugged in
//! behind the same trait.

#[cfg(test)]
pub(crate) mod fake;
mod html;
mod http;

pub use html::{element_handle, parse_selector, select_handles, select_handles_within};
pub use http::{build_http_client, HttpBrowser};

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Errors reported by a browser collaborator
#[derive(Debug, Error)]
pub enum BrowserError {
    /// The page could not be loaded
    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    /// No element matched the selector
    #[error("No element matches '{0}'")]
    ElementNotFound(String),

    /// The element belongs to a page that has since been replaced
    #[error("Element reference is stale")]
    StaleReference,

    /// The selector could not be parsed
    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    /// The collaborator cannot perform this operation
    #[error("Operation not supported: {0}")]
    Unsupported(&'static str),

    /// The session has been closed
    #[error("Browser session is closed")]
    Closed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BrowserError {
    /// Returns true for errors that mean the requested element is simply absent
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ElementNotFound(_))
    }
}

/// Owned snapshot of one DOM element
///
/// Handles remember the page load they came from; using one after the browser
/// has navigated elsewhere yields [`BrowserError::StaleReference`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
    /// Visible text with whitespace collapsed
    pub text: String,

    /// Element attributes by name
    pub attributes: HashMap<String, String>,

    /// Markup of the element itself
    pub outer_html: String,

    /// Markup of the element's children
    pub inner_html: String,

    /// Page load this handle was taken from
    pub generation: u64,
}

impl ElementHandle {
    /// Returns an attribute value, if present
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// Navigation and DOM query capabilities consumed by the crawler
///
/// Exactly one interaction is outstanding at a time; the controller owns the
/// session for the whole run and closes it on every exit path.
#[async_trait]
pub trait Browser: Send + Sync {
    /// Loads `url` and waits for the document
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError>;

    /// Runs a script against the current page
    async fn execute_script(&mut self, script: &str) -> Result<(), BrowserError>;

    /// Saves an image of the current page
    async fn screenshot(&mut self, path: &Path) -> Result<(), BrowserError>;

    /// Returns the URL of the current page after redirects
    async fn current_url(&self) -> Result<String, BrowserError>;

    /// Returns the raw markup of the current page
    async fn page_content(&self) -> Result<String, BrowserError>;

    /// Returns every element matching `selector`, in document order
    async fn query(&self, selector: &str) -> Result<Vec<ElementHandle>, BrowserError>;

    /// Returns every descendant of `parent` matching `selector`
    async fn query_within(
        &self,
        parent: &ElementHandle,
        selector: &str,
    ) -> Result<Vec<ElementHandle>, BrowserError>;

    /// Ends the session
    async fn close(&mut self) -> Result<(), BrowserError>;

    /// Returns the first element matching `selector`
    async fn find(&self, selector: &str) -> Result<ElementHandle, BrowserError> {
        self.query(selector)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| BrowserError::ElementNotFound(selector.to_string()))
    }

    /// Returns the first descendant of `parent` matching `selector`
    async fn find_within(
        &self,
        parent: &ElementHandle,
        selector: &str,
    ) -> Result<ElementHandle, BrowserError> {
        self.query_within(parent, selector)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| BrowserError::ElementNotFound(selector.to_string()))
    }
}
