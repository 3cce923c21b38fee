//! Output module for the harvested dataset and run reports
//!
//! This module handles:
//! - Exporting the deduplicated dataset as CSV
//! - Generating markdown summaries of harvest runs
//! - Printing per-run statistics from the database

mod csv_export;
mod markdown;
pub mod stats;
mod traits;

pub use csv_export::{dataset_row, write_dataset, write_dataset_to, DATASET_COLUMNS};
pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use stats::{load_statistics, print_statistics, RunStatistics};
pub use traits::{OutputError, OutputResult, RunSummary, TargetLine};

use crate::config::Config;
use crate::crawler::CrawlReport;
use crate::dataset::{aggregate, ResultSet};
use crate::state::VisitOutcome;
use crate::storage::Storage;
use crate::HarvestError;
use std::path::Path;

/// Generates a run summary from storage
///
/// # Arguments
///
/// * `storage` - The storage backend containing the run's records
/// * `run_id` - The run to summarize
///
/// # Returns
///
/// * `Ok(RunSummary)` - Successfully generated summary
/// * `Err(HarvestError)` - The run does not exist or a query failed
pub fn generate_summary(storage: &dyn Storage, run_id: i64) -> Result<RunSummary, HarvestError> {
    let run = storage.get_run(run_id)?;

    // Calculate duration if finished
    let duration_seconds = match (
        run.started_at.parse::<chrono::DateTime<chrono::Utc>>(),
        run.finished_at
            .as_deref()
            .map(str::parse::<chrono::DateTime<chrono::Utc>>),
    ) {
        (Ok(started), Some(Ok(finished))) => Some((finished - started).num_seconds().max(0) as u64),
        _ => None,
    };

    let records_by_outcome = storage.count_records_by_outcome(run_id)?;

    Ok(RunSummary {
        run_id: run.id,
        started_at: run.started_at,
        finished_at: run.finished_at,
        duration_seconds,
        status: run.status.to_db_string().to_string(),
        config_hash: run.config_hash,
        records_emitted: records_by_outcome.values().sum(),
        unique_postings: storage.count_unique_postings(run_id)?,
        records_by_outcome,
        records_by_tag: storage.count_records_by_tag(run_id)?,
        ..RunSummary::default()
    })
}

impl RunSummary {
    /// Adds the site and the configured searches
    pub fn with_config(mut self, config: &Config) -> Self {
        self.site = config.site.preset.trim().to_ascii_lowercase();
        self.targets = config
            .search_targets()
            .into_iter()
            .map(|target| TargetLine {
                url: target.query_url_template,
                tag: target.tag,
                max_pages: target.max_pages,
            })
            .collect();
        self
    }

    /// Adds the live counters of a crawl that just ended
    pub fn with_report(mut self, report: &CrawlReport) -> Self {
        self.status = report.status.to_db_string().to_string();
        self.pages_walked = Some(report.counters.pages);
        self.stale_listings = Some(report.counters.outcome_count(VisitOutcome::Stale));
        self.stale_pages = Some(report.counters.stale_pages);
        self.failures = Some(report.counters.failures);
        self.block_reason = report.block.as_ref().map(ToString::to_string);
        self.error = report.error.clone();
        if self.duration_seconds.is_none() {
            self.duration_seconds = Some(report.elapsed.as_secs());
        }
        self
    }
}

/// Writes the CSV dataset and the markdown summary of a finished crawl
///
/// Called on every exit path of a run, so an interrupted or blocked run
/// still leaves its partial dataset behind.
pub fn write_run_outputs(
    config: &Config,
    report: &CrawlReport,
    storage: &dyn Storage,
) -> Result<(), HarvestError> {
    write_dataset(&report.results, Path::new(&config.output.csv_path))?;

    let summary = generate_summary(storage, report.run_id)?
        .with_config(config)
        .with_report(report);
    generate_markdown_summary(&summary, Path::new(&config.output.summary_path))?;
    tracing::info!("Summary written to {}", config.output.summary_path);

    Ok(())
}

/// Rebuilds the dataset of the most recent run from stored records
///
/// # Returns
///
/// * `Ok(Some((run_id, rows)))` - The run exported and the rows written
/// * `Ok(None)` - The database holds no runs yet
/// * `Err(HarvestError)` - Failed to read records or write the file
pub fn export_latest_run(
    storage: &dyn Storage,
    csv_path: &Path,
) -> Result<Option<(i64, usize)>, HarvestError> {
    let Some(run) = storage.get_latest_run()? else {
        return Ok(None);
    };

    let results: ResultSet = aggregate(storage.load_records(run.id)?);
    let rows = write_dataset(&results, csv_path)?;
    Ok(Some((run.id, rows)))
}
