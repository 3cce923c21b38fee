//! Crawler module for harvesting job-board searches
//!
//! This module contains the core harvesting logic, including:
//! - Block page detection
//! - Listing extraction from results pages
//! - Detail page extraction with graceful degradation
//! - Pagination walking and overall crawl coordination

mod badges;
mod block;
mod coordinator;
mod detail;
mod listing;
mod pacing;
mod walker;

pub use badges::{classify_chip, classify_text, read_badges, BadgeFields, BadgeKind};
pub use block::{BlockDetector, BlockSignal, DEFAULT_INDICATORS};
pub use coordinator::{Coordinator, CrawlCounters, CrawlReport};
pub use detail::{location_from_description, DetailExtractor, DetailOutcome};
pub use listing::extract_listings;
pub use pacing::{jittered, pause, random_delay};
pub use walker::{PageScan, PageStep, PaginationWalker, WalkEnd};

use crate::browser::{Browser, BrowserError};

/// Runs the configured lazy-load script on the current page
///
/// Script support is optional; any failure other than a closed session is
/// logged and ignored.
pub(crate) async fn run_scroll_script(
    browser: &mut dyn Browser,
    script: Option<&str>,
) -> Result<(), BrowserError> {
    let Some(script) = script else {
        return Ok(());
    };

    match browser.execute_script(script).await {
        Ok(()) => Ok(()),
        Err(BrowserError::Closed) => Err(BrowserError::Closed),
        Err(BrowserError::Unsupported(_)) => Ok(()),
        Err(e) => {
            tracing::debug!("Scroll script failed: {}", e);
            Ok(())
        }
    }
}
