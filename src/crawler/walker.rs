//! Pagination walking
//!
//! A [`PaginationWalker`] yields the listing pages of one search, one page
//! per call, until the search runs out. Once finished it keeps reporting the
//! same end reason; a walker is never restarted.

use super::block::{BlockDetector, BlockSignal};
use super::listing::extract_listings;
use super::run_scroll_script;
use crate::browser::{Browser, BrowserError};
use crate::dataset::{ListingRecord, SearchTarget};
use crate::site::SiteAdapter;
use crate::url::{page_url, PageParam};
use std::fmt;

/// Why a walk ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkEnd {
    /// Every allowed page was walked
    MaxPages,

    /// A page had no listings; the normal end of a search
    EmptyPage,

    /// A page was a block page
    Blocked(BlockSignal),

    /// A page could not be loaded
    NavigationFailure(String),
}

impl fmt::Display for WalkEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MaxPages => f.write_str("page limit reached"),
            Self::EmptyPage => f.write_str("no more listings"),
            Self::Blocked(signal) => write!(f, "blocked: {}", signal),
            Self::NavigationFailure(message) => write!(f, "navigation failed: {}", message),
        }
    }
}

/// One step of a walk
#[derive(Debug)]
pub enum PageStep {
    /// A page with at least one listing
    Listings {
        page: u32,
        url: String,
        listings: Vec<ListingRecord>,
    },

    /// The result cards kept going stale; the page is skipped
    Stale { page: u32, url: String },

    /// The walk is over
    Finished(WalkEnd),
}

/// What the walker needs to read a results page
pub struct PageScan<'a> {
    pub site: &'a SiteAdapter,
    pub detector: &'a BlockDetector,
    pub scroll_script: Option<&'a str>,
    pub listing_cap: Option<usize>,
}

/// Walks the result pages of one search target
#[derive(Debug)]
pub struct PaginationWalker {
    target: SearchTarget,
    page_param: PageParam,
    next_page: u32,
    finished: Option<WalkEnd>,
}

impl PaginationWalker {
    pub fn new(target: SearchTarget, page_param: PageParam) -> Self {
        Self {
            target,
            page_param,
            next_page: 1,
            finished: None,
        }
    }

    /// Number of pages requested so far
    pub fn pages_requested(&self) -> u32 {
        self.next_page - 1
    }

    fn finish(&mut self, end: WalkEnd) -> PageStep {
        tracing::debug!("Walk of {} ended: {}", self.target.query_url_template, end);
        self.finished = Some(end.clone());
        PageStep::Finished(end)
    }

    /// Loads the next page and extracts its listings
    ///
    /// # Page Flow
    ///
    /// 1. Stop with `MaxPages` once `max_pages` pages have been walked
    /// 2. Navigate; failure ends the walk with `NavigationFailure`
    /// 3. Run the block detector; a hit ends the walk with `Blocked`
    /// 4. Run the scroll script, then extract listings
    /// 5. A card list that stays stale skips the page with `Stale`
    /// 6. Zero listings end the walk with `EmptyPage`
    ///
    /// # Returns
    ///
    /// * `Ok(PageStep)` - The page's listings or the end of the walk
    /// * `Err(BrowserError)` - The session itself failed
    pub async fn next_page(
        &mut self,
        browser: &mut dyn Browser,
        scan: &PageScan<'_>,
    ) -> Result<PageStep, BrowserError> {
        if let Some(end) = &self.finished {
            return Ok(PageStep::Finished(end.clone()));
        }

        if self.next_page > self.target.max_pages {
            return Ok(self.finish(WalkEnd::MaxPages));
        }

        let page = self.next_page;
        self.next_page += 1;

        let url = match page_url(&self.target.query_url_template, page, &self.page_param) {
            Ok(url) => url,
            Err(e) => return Ok(self.finish(WalkEnd::NavigationFailure(e.to_string()))),
        };

        tracing::info!("Loading page {}/{}: {}", page, self.target.max_pages, url);

        if let Err(e) = browser.navigate(&url).await {
            if matches!(e, BrowserError::Closed) {
                return Err(e);
            }
            return Ok(self.finish(WalkEnd::NavigationFailure(e.to_string())));
        }

        if let Some(signal) = scan.detector.inspect(&*browser).await? {
            return Ok(self.finish(WalkEnd::Blocked(signal)));
        }

        run_scroll_script(browser, scan.scroll_script).await?;

        let listings = match extract_listings(&*browser, scan.site, &url, scan.listing_cap).await {
            Ok(listings) => listings,
            Err(BrowserError::StaleReference) => return Ok(PageStep::Stale { page, url }),
            Err(e) => return Err(e),
        };
        if listings.is_empty() {
            tracing::info!("No listings on page {}", page);
            return Ok(self.finish(WalkEnd::EmptyPage));
        }

        tracing::info!("Found {} listings on page {}", listings.len(), page);
        Ok(PageStep::Listings {
            page,
            url,
            listings,
        })
    }
}
