//! Scripted in-memory browser for unit tests

use super::html::{select_handles, select_handles_within};
use super::{Browser, BrowserError, ElementHandle};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
enum Response {
    Page { final_url: String, html: String },
    Failure,
}

/// What a [`FakeBrowser`] was asked to do
#[derive(Debug, Default)]
pub struct FakeLog {
    pub navigations: Vec<String>,
    pub scripts: usize,
    pub screenshots: Vec<String>,
    pub closed: bool,
}

/// Serves canned pages by URL
///
/// Unknown URLs fail to navigate.
#[derive(Debug, Default)]
pub struct FakeBrowser {
    responses: HashMap<String, Response>,
    stale_selectors: HashSet<String>,
    stale_once: Mutex<HashSet<String>>,
    current: Option<(String, String)>,
    generation: u64,
    screenshots_supported: bool,
    log: Arc<Mutex<FakeLog>>,
}

impl FakeBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: &str, html: &str) -> Self {
        self.with_redirect(url, url, html)
    }

    pub fn with_redirect(mut self, url: &str, final_url: &str, html: &str) -> Self {
        self.responses.insert(
            url.to_string(),
            Response::Page {
                final_url: final_url.to_string(),
                html: html.to_string(),
            },
        );
        self
    }

    pub fn with_failure(mut self, url: &str) -> Self {
        self.responses.insert(url.to_string(), Response::Failure);
        self
    }

    /// Makes every query for `selector` report a stale element
    pub fn with_stale(mut self, selector: &str) -> Self {
        self.stale_selectors.insert(selector.to_string());
        self
    }

    /// Makes only the first query for `selector` report a stale element
    pub fn with_stale_once(self, selector: &str) -> Self {
        self.stale_once.lock().unwrap().insert(selector.to_string());
        self
    }

    pub fn with_screenshots(mut self) -> Self {
        self.screenshots_supported = true;
        self
    }

    pub fn log(&self) -> Arc<Mutex<FakeLog>> {
        Arc::clone(&self.log)
    }

    fn ensure_open(&self) -> Result<(), BrowserError> {
        if self.log.lock().unwrap().closed {
            Err(BrowserError::Closed)
        } else {
            Ok(())
        }
    }

    fn loaded(&self) -> Result<&(String, String), BrowserError> {
        self.ensure_open()?;
        self.current.as_ref().ok_or_else(|| BrowserError::Navigation {
            url: String::new(),
            message: "no page loaded".to_string(),
        })
    }
}

#[async_trait]
impl Browser for FakeBrowser {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        self.ensure_open()?;
        self.log.lock().unwrap().navigations.push(url.to_string());
        self.generation += 1;
        self.current = None;

        match self.responses.get(url) {
            Some(Response::Page { final_url, html }) => {
                self.current = Some((final_url.clone(), html.clone()));
                Ok(())
            }
            Some(Response::Failure) | None => Err(BrowserError::Navigation {
                url: url.to_string(),
                message: "connection refused".to_string(),
            }),
        }
    }

    async fn execute_script(&mut self, _script: &str) -> Result<(), BrowserError> {
        self.ensure_open()?;
        self.log.lock().unwrap().scripts += 1;
        Ok(())
    }

    async fn screenshot(&mut self, path: &Path) -> Result<(), BrowserError> {
        self.ensure_open()?;
        if !self.screenshots_supported {
            return Err(BrowserError::Unsupported("screenshots"));
        }
        std::fs::write(path, b"png")?;
        self.log
            .lock()
            .unwrap()
            .screenshots
            .push(path.display().to_string());
        Ok(())
    }

    async fn current_url(&self) -> Result<String, BrowserError> {
        Ok(self.loaded()?.0.clone())
    }

    async fn page_content(&self) -> Result<String, BrowserError> {
        Ok(self.loaded()?.1.clone())
    }

    async fn query(&self, selector: &str) -> Result<Vec<ElementHandle>, BrowserError> {
        let (_, html) = self.loaded()?;
        let stale_now = self.stale_once.lock().unwrap().remove(selector);
        if stale_now || self.stale_selectors.contains(selector) {
            return Err(BrowserError::StaleReference);
        }
        select_handles(html, selector, self.generation)
    }

    async fn query_within(
        &self,
        parent: &ElementHandle,
        selector: &str,
    ) -> Result<Vec<ElementHandle>, BrowserError> {
        self.ensure_open()?;
        if parent.generation != self.generation || self.stale_selectors.contains(selector) {
            return Err(BrowserError::StaleReference);
        }
        select_handles_within(parent, selector)
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        self.log.lock().unwrap().closed = true;
        self.current = None;
        Ok(())
    }
}
