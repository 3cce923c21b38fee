//! Detail page extraction
//!
//! Visits one listing's detail page and builds a full record. Extraction
//! degrades field by field: a missing field falls back to the card preview
//! or stays empty, a page that never renders degrades to the preview record,
//! and only a stale element drops the record entirely.

use super::badges::read_badges;
use super::block::{BlockDetector, BlockSignal};
use super::run_scroll_script;
use crate::browser::{Browser, BrowserError, ElementHandle};
use crate::dataset::{JobRecord, ListingRecord};
use crate::site::SiteAdapter;
use crate::state::VisitOutcome;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use tokio::time::Instant;

/// Description patterns that name a location, tried in order
static LOCATION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)<b>Location:?</b>\s*([^<\n]+)",
        r"(?i)Location:?\s*</b>\s*([^<\n]+)",
        r"(?i)Location:?\s*([^\n<]{5,50})",
        r"(?i)100%\s*Remote\s*[–-]\s*([A-Z]{2,}|\w+)",
        r"(?i)Remote\s*[–-]\s*([A-Z]{2,}|\w+)",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

static TAG_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"<[^>]+>").ok());

const MAX_LOCATION_CHARS: usize = 100;

/// How a detail visit ended
#[derive(Debug)]
pub enum DetailOutcome {
    /// The page rendered; fields were read with fallbacks
    Extracted(JobRecord),

    /// The ready marker never appeared; preview-only record
    TimedOut(JobRecord),

    /// The page did not load; preview-only record
    NavigationFailed { record: JobRecord, error: String },

    /// An element went stale mid-extraction; no record
    Stale,

    /// The page is a block page; no record
    Blocked(BlockSignal),
}

/// Reads detail pages for one board
pub struct DetailExtractor<'a> {
    pub site: &'a SiteAdapter,
    pub detector: &'a BlockDetector,
    pub scroll_script: Option<&'a str>,

    /// How long to wait for the ready marker
    pub timeout: Duration,

    /// Interval between ready-marker checks
    pub poll_interval: Duration,
}

impl<'a> DetailExtractor<'a> {
    /// Visits `listing`'s detail page and extracts a record
    ///
    /// # Returns
    ///
    /// * `Ok(DetailOutcome)` - How the visit ended
    /// * `Err(BrowserError)` - The session itself failed (closed, bad selector)
    pub async fn extract(
        &self,
        browser: &mut dyn Browser,
        listing: &ListingRecord,
        tag: Option<&str>,
    ) -> Result<DetailOutcome, BrowserError> {
        if let Err(e) = browser.navigate(&listing.detail_url).await {
            if matches!(e, BrowserError::Closed) {
                return Err(e);
            }
            return Ok(DetailOutcome::NavigationFailed {
                record: JobRecord::from_listing(listing, tag, VisitOutcome::NavigationFailed),
                error: e.to_string(),
            });
        }

        if let Some(signal) = self.detector.inspect(&*browser).await? {
            return Ok(DetailOutcome::Blocked(signal));
        }

        run_scroll_script(browser, self.scroll_script).await?;

        if !self.wait_until_ready(&*browser).await? {
            return Ok(DetailOutcome::TimedOut(JobRecord::from_listing(
                listing,
                tag,
                VisitOutcome::TimedOut,
            )));
        }

        match self.read_fields(&*browser, listing, tag).await {
            Ok(record) => Ok(DetailOutcome::Extracted(record)),
            Err(BrowserError::StaleReference) => Ok(DetailOutcome::Stale),
            Err(e) => Err(e),
        }
    }

    /// Polls for the ready marker until it appears or the timeout elapses
    async fn wait_until_ready(&self, browser: &dyn Browser) -> Result<bool, BrowserError> {
        let deadline = Instant::now() + self.timeout;

        loop {
            match browser.query(&self.site.ready_marker).await {
                Ok(found) if !found.is_empty() => return Ok(true),
                Ok(_) | Err(BrowserError::StaleReference) => {}
                Err(e) => return Err(e),
            }

            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn read_fields(
        &self,
        browser: &dyn Browser,
        listing: &ListingRecord,
        tag: Option<&str>,
    ) -> Result<JobRecord, BrowserError> {
        let fields = &self.site.fields;

        let title = first_text(browser, &fields.title)
            .await?
            .map(|raw| self.site.clean_title(&raw))
            .filter(|title| !title.is_empty())
            .unwrap_or_else(|| listing.title_preview.clone());

        let company = first_text(browser, &fields.company)
            .await?
            .unwrap_or_else(|| listing.company_preview.clone());

        let recruiter = first_text(browser, &fields.recruiter)
            .await?
            .unwrap_or_default();

        let description = first_element(browser, &fields.description).await?;

        let location = match first_text(browser, &fields.location).await? {
            Some(location) => location,
            None => description
                .as_ref()
                .filter(|_| self.site.location_from_description)
                .and_then(|d| location_from_description(&d.inner_html))
                .unwrap_or_else(|| listing.location_preview.clone()),
        };

        let badges = read_badges(browser, &self.site.badges).await?;

        tracing::debug!(
            "Extracted '{}' at '{}' ({})",
            title,
            company,
            listing.detail_url
        );

        Ok(JobRecord {
            title,
            company,
            recruiter,
            location,
            employment_types: badges.employment_types,
            contract_duration: badges.contract_duration,
            corp_to_corp: badges.corp_to_corp,
            pay: badges.pay,
            work_type: badges.work_type,
            description: description.map(|d| d.text.trim().to_string()).unwrap_or_default(),
            detail_url: listing.detail_url.clone(),
            listing_url: listing.listing_url.clone(),
            tag: tag.map(str::to_string),
            listing_only: false,
            outcome: VisitOutcome::Extracted,
        })
    }
}

/// Returns the first element in `chain` with non-empty text
async fn first_element(
    browser: &dyn Browser,
    chain: &[String],
) -> Result<Option<ElementHandle>, BrowserError> {
    for selector in chain {
        match browser.find(selector).await {
            Ok(element) if !element.text.trim().is_empty() => return Ok(Some(element)),
            Ok(_) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }
        tracing::trace!("No text at '{}'", selector);
    }
    Ok(None)
}

async fn first_text(browser: &dyn Browser, chain: &[String]) -> Result<Option<String>, BrowserError> {
    Ok(first_element(browser, chain)
        .await?
        .map(|element| element.text.trim().to_string()))
}

/// Pulls a location out of description markup
///
/// # Examples
///
/// ```
/// use job_harvest::crawler::location_from_description;
///
/// let html = "<p><b>Location:</b> Austin, TX</p><p>Duties...</p>";
/// assert_eq!(location_from_description(html).as_deref(), Some("Austin, TX"));
/// assert_eq!(location_from_description("<p>No hints here</p>"), None);
/// ```
pub fn location_from_description(html: &str) -> Option<String> {
    if html.trim().is_empty() {
        return None;
    }

    for pattern in LOCATION_PATTERNS.iter() {
        let Some(found) = pattern.captures(html).and_then(|c| c.get(1)) else {
            continue;
        };

        let raw = match TAG_PATTERN.as_ref() {
            Some(tags) => tags.replace_all(found.as_str(), "").into_owned(),
            None => found.as_str().to_string(),
        };
        let location = raw.split('<').next().unwrap_or("").trim();

        if location.chars().count() > 3 {
            return Some(location.chars().take(MAX_LOCATION_CHARS).collect());
        }
    }

    None
}
