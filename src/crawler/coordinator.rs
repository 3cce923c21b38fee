//! Crawl coordinator - main harvest orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! a harvest run, including:
//! - Walking every search target in queue order
//! - Visiting detail pages and degrading to preview records
//! - Failure counting, adaptive backoff and block handling
//! - Pacing, interruption and releasing the browser session

use crate::browser::{Browser, BrowserError};
use crate::config::{BlockPolicy, Config, DelayRange};
use crate::crawler::block::{BlockDetector, BlockSignal};
use crate::crawler::detail::{DetailExtractor, DetailOutcome};
use crate::crawler::pacing::{jittered, pause, random_delay};
use crate::crawler::walker::{PageScan, PageStep, PaginationWalker, WalkEnd};
use crate::dataset::{JobRecord, ListingRecord, ResultSet, SearchTarget};
use crate::site::SiteAdapter;
use crate::state::{BackoffPolicy, CrawlState, FailureVerdict, VisitOutcome};
use crate::storage::{RunStatus, Storage};
use crate::HarvestError;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Running totals of a harvest run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlCounters {
    pub targets: u64,
    pub pages: u64,
    pub listings: u64,
    pub extracted: u64,
    pub listing_only: u64,
    pub timed_out: u64,
    pub navigation_failed: u64,
    pub stale: u64,
    pub stale_pages: u64,
    pub failures: u64,
    pub blocks: u64,
    pub records_emitted: u64,
}

impl CrawlCounters {
    fn record_outcome(&mut self, outcome: VisitOutcome) {
        match outcome {
            VisitOutcome::Extracted => self.extracted += 1,
            VisitOutcome::ListingOnly => self.listing_only += 1,
            VisitOutcome::TimedOut => self.timed_out += 1,
            VisitOutcome::NavigationFailed => self.navigation_failed += 1,
            VisitOutcome::Stale => self.stale += 1,
        }
    }

    /// Returns the number of listings that ended in `outcome`
    pub fn outcome_count(&self, outcome: VisitOutcome) -> u64 {
        match outcome {
            VisitOutcome::Extracted => self.extracted,
            VisitOutcome::ListingOnly => self.listing_only,
            VisitOutcome::TimedOut => self.timed_out,
            VisitOutcome::NavigationFailed => self.navigation_failed,
            VisitOutcome::Stale => self.stale,
        }
    }
}

/// Everything a finished (or stopped) run produced
#[derive(Debug)]
pub struct CrawlReport {
    pub run_id: i64,
    pub status: RunStatus,
    pub results: ResultSet,
    pub counters: CrawlCounters,
    pub state: CrawlState,

    /// The block that ended the run, if one did
    pub block: Option<BlockSignal>,

    /// The fatal error that ended the run, if one did
    pub error: Option<String>,

    pub elapsed: Duration,
}

/// How a single target's walk ended, from the run's point of view
enum TargetEnd {
    /// Move on to the next target
    Next,
    Blocked,
    Interrupted,
}

/// Main harvest coordinator
///
/// Owns the browser session, the crawl state and the accumulated results for
/// one run. Consumed by [`Coordinator::run`].
pub struct Coordinator {
    config: Config,
    site: SiteAdapter,
    detector: BlockDetector,
    policy: BackoffPolicy,
    browser: Box<dyn Browser>,
    storage: Box<dyn Storage>,
    state: CrawlState,
    results: ResultSet,
    counters: CrawlCounters,
    run_id: i64,
    sequence: u64,
    block: Option<BlockSignal>,
    stop: Arc<AtomicBool>,
}

impl Coordinator {
    /// Creates a new coordinator and registers the run in storage
    ///
    /// # Arguments
    ///
    /// * `config` - The validated harvest configuration
    /// * `config_hash` - Hash of the configuration file, recorded on the run
    /// * `browser` - The browser session; closed when the run ends
    /// * `storage` - Durable record store
    /// * `stop` - Set from outside to interrupt the run at the next safe point
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(HarvestError)` - Unknown site preset or storage failure
    pub fn new(
        config: Config,
        config_hash: &str,
        browser: Box<dyn Browser>,
        mut storage: Box<dyn Storage>,
        stop: Arc<AtomicBool>,
    ) -> Result<Self, HarvestError> {
        let site = SiteAdapter::from_config(&config.site)?;
        let detector = BlockDetector::new(&site.expected_domain, &config.crawler.block_indicators);
        let policy = BackoffPolicy::from_config(&config.crawler);
        let run_id = storage.create_run(config_hash)?;

        tracing::info!("Created run {} for site '{}'", run_id, site.name);

        Ok(Self {
            config,
            site,
            detector,
            policy,
            browser,
            storage,
            state: CrawlState::new(),
            results: ResultSet::new(),
            counters: CrawlCounters::default(),
            run_id,
            sequence: 0,
            block: None,
            stop,
        })
    }

    pub fn run_id(&self) -> i64 {
        self.run_id
    }

    /// Runs the harvest to completion, block, interruption or fatal error
    ///
    /// The browser session is closed and the run's final status recorded on
    /// every one of those paths. Records accumulated before the run ended are
    /// always part of the report.
    pub async fn run(mut self) -> CrawlReport {
        let started = Instant::now();
        tracing::info!("Starting harvest run {}", self.run_id);

        let mut error = None;
        let status = match self.crawl().await {
            Ok(status) => status,
            Err(e) => {
                tracing::error!("Run {} failed: {}", self.run_id, e);
                error = Some(e.to_string());
                RunStatus::Failed
            }
        };

        if let Err(e) = self.browser.close().await {
            tracing::warn!("Failed to close browser session: {}", e);
        }

        if let Err(e) = self.storage.finish_run(self.run_id, status) {
            tracing::error!("Failed to record final status of run {}: {}", self.run_id, e);
            error.get_or_insert_with(|| e.to_string());
        }

        match status {
            RunStatus::Blocked => tracing::warn!(
                "Run {} stopped early (blocked) with {} records",
                self.run_id,
                self.results.len()
            ),
            RunStatus::Interrupted => tracing::warn!(
                "Run {} interrupted with {} records",
                self.run_id,
                self.results.len()
            ),
            _ => tracing::info!(
                "Run {} finished ({}) with {} unique records in {:?}",
                self.run_id,
                status,
                self.results.len(),
                started.elapsed()
            ),
        }

        CrawlReport {
            run_id: self.run_id,
            status,
            results: self.results,
            counters: self.counters,
            state: self.state,
            block: self.block,
            error,
            elapsed: started.elapsed(),
        }
    }

    /// Walks every target in queue order
    async fn crawl(&mut self) -> Result<RunStatus, HarvestError> {
        let targets = self.config.search_targets();
        tracing::info!("{} search targets queued", targets.len());

        for (index, target) in targets.into_iter().enumerate() {
            if self.stopped() {
                return Ok(RunStatus::Interrupted);
            }

            if index > 0 {
                self.pace(self.config.crawler.target_delay).await;
                if self.stopped() {
                    return Ok(RunStatus::Interrupted);
                }
            }

            self.counters.targets += 1;
            tracing::info!(
                "Target {}: {} (tag: {})",
                index + 1,
                target.query_url_template,
                target.tag.as_deref().unwrap_or("-")
            );

            match self.walk_target(target).await? {
                TargetEnd::Next => {}
                TargetEnd::Blocked => return Ok(RunStatus::Blocked),
                TargetEnd::Interrupted => return Ok(RunStatus::Interrupted),
            }
        }

        Ok(RunStatus::Completed)
    }

    /// Walks the pages of one target and visits their listings
    async fn walk_target(&mut self, target: SearchTarget) -> Result<TargetEnd, HarvestError> {
        let tag = target.tag.clone();
        let max_pages = target.max_pages;
        let mut walker = PaginationWalker::new(target, self.site.page_param.clone());

        loop {
            if self.stopped() {
                return Ok(TargetEnd::Interrupted);
            }

            let requested = walker.pages_requested();
            if requested > 0 && requested < max_pages {
                self.pace(self.config.crawler.page_delay).await;
            }

            let step = {
                let scan = PageScan {
                    site: &self.site,
                    detector: &self.detector,
                    scroll_script: self.config.browser.scroll_script.as_deref(),
                    listing_cap: self.config.crawler.max_listings_per_page,
                };
                walker.next_page(self.browser.as_mut(), &scan).await?
            };

            match step {
                PageStep::Listings {
                    page,
                    url,
                    listings,
                } => {
                    self.counters.pages += 1;
                    self.state.record_success(&self.policy);
                    tracing::debug!("Visiting {} listings from {}", listings.len(), url);

                    match self.visit_listings(page, listings, tag.as_deref()).await? {
                        TargetEnd::Next => {}
                        end => return Ok(end),
                    }
                }
                PageStep::Stale { page, url } => {
                    self.counters.stale_pages += 1;
                    tracing::warn!("Result cards on page {} went stale, skipping {}", page, url);
                }
                PageStep::Finished(WalkEnd::MaxPages) | PageStep::Finished(WalkEnd::EmptyPage) => {
                    return Ok(TargetEnd::Next);
                }
                PageStep::Finished(WalkEnd::Blocked(signal)) => {
                    return self.handle_block(signal).await;
                }
                PageStep::Finished(WalkEnd::NavigationFailure(message)) => {
                    tracing::warn!("Results page failed to load: {}", message);
                    return Ok(self.handle_failure().await);
                }
            }
        }
    }

    /// Visits every listing of one page in page order
    ///
    /// Returns `Next` to continue with the following page. Any other value
    /// ends the target.
    async fn visit_listings(
        &mut self,
        page: u32,
        listings: Vec<ListingRecord>,
        tag: Option<&str>,
    ) -> Result<TargetEnd, HarvestError> {
        let total = listings.len();

        for (index, listing) in listings.into_iter().enumerate() {
            if self.stopped() {
                return Ok(TargetEnd::Interrupted);
            }

            self.counters.listings += 1;

            if listing.detail_url.is_empty() {
                tracing::debug!("Card {} on page {} has no detail link", index + 1, page);
                self.emit(JobRecord::from_listing(&listing, tag, VisitOutcome::ListingOnly))?;
                continue;
            }

            self.pace(self.config.crawler.detail_delay).await;
            if self.stopped() {
                return Ok(TargetEnd::Interrupted);
            }

            tracing::info!(
                "Listing {}/{} on page {}: {}",
                index + 1,
                total,
                page,
                listing.detail_url
            );

            let outcome = {
                let extractor = DetailExtractor {
                    site: &self.site,
                    detector: &self.detector,
                    scroll_script: self.config.browser.scroll_script.as_deref(),
                    timeout: Duration::from_millis(self.config.crawler.detail_timeout_ms),
                    poll_interval: Duration::from_millis(self.config.crawler.poll_interval_ms),
                };
                extractor
                    .extract(self.browser.as_mut(), &listing, tag)
                    .await?
            };

            match outcome {
                DetailOutcome::Extracted(record) => {
                    self.state.record_success(&self.policy);
                    self.emit(record)?;
                }
                DetailOutcome::TimedOut(record) => {
                    tracing::warn!("Detail page never rendered: {}", listing.detail_url);
                    self.emit(record)?;
                }
                DetailOutcome::NavigationFailed { record, error } => {
                    tracing::warn!("Detail page failed to load: {}", error);
                    self.emit(record)?;
                    return Ok(self.handle_failure().await);
                }
                DetailOutcome::Stale => {
                    tracing::warn!("Stale element on {}, skipping", listing.detail_url);
                    self.counters.record_outcome(VisitOutcome::Stale);
                }
                DetailOutcome::Blocked(signal) => {
                    return self.handle_block(signal).await;
                }
            }
        }

        Ok(TargetEnd::Next)
    }

    /// Records a navigation failure and sleeps the backoff it calls for
    ///
    /// The current target is always abandoned; the run ends once the failure
    /// streak reaches the threshold.
    async fn handle_failure(&mut self) -> TargetEnd {
        self.counters.failures += 1;

        match self.state.record_failure(&self.policy) {
            FailureVerdict::Backoff(base) => {
                let delay = jittered(base);
                tracing::warn!(
                    "Failure {} of {}: backing off {:.1}s (multiplier {:.2})",
                    self.state.consecutive_failures(),
                    self.policy.max_consecutive_failures,
                    delay.as_secs_f64(),
                    self.state.backoff_multiplier()
                );
                pause(delay, &self.stop).await;
                TargetEnd::Next
            }
            FailureVerdict::Blocked => {
                tracing::warn!(
                    "{} consecutive failures, treating the run as blocked",
                    self.state.consecutive_failures()
                );
                TargetEnd::Blocked
            }
        }
    }

    /// Reacts to a block page according to the configured policy
    async fn handle_block(&mut self, signal: BlockSignal) -> Result<TargetEnd, HarvestError> {
        self.counters.blocks += 1;
        tracing::warn!("Block detected: {}", signal);
        self.capture_block_screenshot().await?;

        match self.config.crawler.block_policy {
            BlockPolicy::HaltRun => {
                self.state.mark_blocked();
                self.block = Some(signal);
                Ok(TargetEnd::Blocked)
            }
            BlockPolicy::SkipTarget => {
                let end = self.handle_failure().await;
                if matches!(end, TargetEnd::Blocked) {
                    self.block = Some(signal);
                }
                Ok(end)
            }
        }
    }

    /// Saves a screenshot of the blocking page when a directory is configured
    async fn capture_block_screenshot(&mut self) -> Result<(), HarvestError> {
        let Some(dir) = self.config.output.screenshot_dir.as_deref() else {
            return Ok(());
        };

        let dir = Path::new(dir);
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!(
            "blocked-run{}-{}.png",
            self.run_id,
            chrono::Utc::now().format("%Y%m%dT%H%M%S%3f")
        ));

        match self.browser.screenshot(&path).await {
            Ok(()) => tracing::info!("Saved block screenshot to {}", path.display()),
            Err(BrowserError::Unsupported(what)) => {
                tracing::debug!("Browser cannot take {}", what)
            }
            Err(BrowserError::Closed) => return Err(BrowserError::Closed.into()),
            Err(e) => tracing::warn!("Failed to save block screenshot: {}", e),
        }

        Ok(())
    }

    /// Persists a record and merges it into the result set
    fn emit(&mut self, record: JobRecord) -> Result<(), HarvestError> {
        self.sequence += 1;
        self.counters.record_outcome(record.outcome);
        self.counters.records_emitted += 1;
        self.storage
            .insert_record(self.run_id, self.sequence, &record)?;

        tracing::debug!(
            "Record {}: '{}' ({})",
            self.sequence,
            record.title,
            record.outcome
        );

        if !self.results.insert(record) {
            tracing::debug!("Merged duplicate posting into existing record");
        }
        Ok(())
    }

    /// Sleeps a random delay from `range`, scaled by the backoff multiplier
    async fn pace(&self, range: DelayRange) {
        pause(random_delay(range, self.state.backoff_multiplier()), &self.stop).await;
    }

    fn stopped(&self) -> bool {
        let stopped = self.stop.load(Ordering::SeqCst);
        if stopped {
            tracing::info!("Stop requested, ending run {}", self.run_id);
        }
        stopped
    }
}
