//! HTTP-backed browser
//!
//! Loads pages with `reqwest` and answers DOM queries from the fetched
//! markup. Scripts and screenshots need a rendering engine and answer
//! [`BrowserError::Unsupported`].

use super::html::{select_handles, select_handles_within};
use super::{Browser, BrowserError, ElementHandle};
use crate::config::BrowserConfig;
use async_trait::async_trait;
use reqwest::{Client, Proxy};
use std::path::Path;
use std::time::Duration;

/// Builds an HTTP client from the browser settings
///
/// # Arguments
///
/// * `config` - User agent, timeout and optional proxy
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Invalid proxy or TLS setup failure
pub fn build_http_client(config: &BrowserConfig) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.navigation_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true);

    if let Some(proxy) = &config.proxy {
        builder = builder.proxy(Proxy::all(proxy.as_str())?);
    }

    builder.build()
}

/// The page currently loaded in an [`HttpBrowser`]
#[derive(Debug, Clone)]
struct LoadedPage {
    url: String,
    content: String,
}

/// A browser session made of plain HTTP fetches
#[derive(Debug)]
pub struct HttpBrowser {
    client: Client,
    page: Option<LoadedPage>,
    generation: u64,
    closed: bool,
}

impl HttpBrowser {
    /// Creates a session from the browser settings
    pub fn new(config: &BrowserConfig) -> Result<Self, BrowserError> {
        let client = build_http_client(config).map_err(|e| BrowserError::Navigation {
            url: String::new(),
            message: format!("failed to build HTTP client: {}", e),
        })?;
        Ok(Self::with_client(client))
    }

    /// Creates a session around an existing client
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            page: None,
            generation: 0,
            closed: false,
        }
    }

    fn ensure_open(&self) -> Result<(), BrowserError> {
        if self.closed {
            Err(BrowserError::Closed)
        } else {
            Ok(())
        }
    }

    fn loaded(&self) -> Result<&LoadedPage, BrowserError> {
        self.ensure_open()?;
        self.page.as_ref().ok_or_else(|| BrowserError::Navigation {
            url: String::new(),
            message: "no page loaded".to_string(),
        })
    }
}

#[async_trait]
impl Browser for HttpBrowser {
    /// Fetches `url`
    ///
    /// | Response | Result |
    /// |----------|--------|
    /// | Network error or timeout | `Navigation` error |
    /// | HTTP 5xx | `Navigation` error |
    /// | Anything else | Page loaded, including 4xx bodies |
    ///
    /// Error pages stay loaded the way a browser shows them, so block pages
    /// served with 403 or 429 reach the block detector.
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        self.ensure_open()?;

        // Any navigation attempt invalidates handles from the previous page.
        self.generation += 1;
        self.page = None;

        let navigation_error = |message: String| BrowserError::Navigation {
            url: url.to_string(),
            message,
        };

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                navigation_error("request timeout".to_string())
            } else if e.is_connect() {
                navigation_error("connection refused".to_string())
            } else {
                navigation_error(e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_server_error() {
            return Err(navigation_error(format!("HTTP {}", status.as_u16())));
        }

        let final_url = response.url().to_string();
        let content = response
            .text()
            .await
            .map_err(|e| navigation_error(e.to_string()))?;

        tracing::debug!(
            "Loaded {} (HTTP {}, {} bytes)",
            final_url,
            status.as_u16(),
            content.len()
        );

        self.page = Some(LoadedPage {
            url: final_url,
            content,
        });
        Ok(())
    }

    async fn execute_script(&mut self, _script: &str) -> Result<(), BrowserError> {
        self.ensure_open()?;
        Err(BrowserError::Unsupported("script execution"))
    }

    async fn screenshot(&mut self, _path: &Path) -> Result<(), BrowserError> {
        self.ensure_open()?;
        Err(BrowserError::Unsupported("screenshots"))
    }

    async fn current_url(&self) -> Result<String, BrowserError> {
        Ok(self.loaded()?.url.clone())
    }

    async fn page_content(&self) -> Result<String, BrowserError> {
        Ok(self.loaded()?.content.clone())
    }

    async fn query(&self, selector: &str) -> Result<Vec<ElementHandle>, BrowserError> {
        let page = self.loaded()?;
        select_handles(&page.content, selector, self.generation)
    }

    async fn query_within(
        &self,
        parent: &ElementHandle,
        selector: &str,
    ) -> Result<Vec<ElementHandle>, BrowserError> {
        self.ensure_open()?;
        if parent.generation != self.generation {
            return Err(BrowserError::StaleReference);
        }
        select_handles_within(parent, selector)
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        self.closed = true;
        self.page = None;
        Ok(())
    }
}
