//! Statistics generation from the harvest database
//!
//! This module provides functionality for extracting and displaying
//! per-run record statistics from the storage layer.

use crate::state::VisitOutcome;
use crate::storage::{RunRecord, Storage};
use crate::HarvestError;
use std::collections::HashMap;

/// Record statistics of one run
#[derive(Debug, Clone)]
pub struct RunStatistics {
    pub run: RunRecord,

    /// Total number of records emitted
    pub total_records: u64,

    /// Count of records by visit outcome
    pub records_by_outcome: HashMap<VisitOutcome, u64>,

    /// Number of distinct postings after deduplication
    pub unique_postings: u64,

    /// Records per tag
    pub records_by_tag: Vec<(String, u64)>,
}

/// Loads statistics of the most recent run
///
/// # Returns
///
/// * `Ok(Some(RunStatistics))` - Statistics of the latest run
/// * `Ok(None)` - The database holds no runs yet
/// * `Err(HarvestError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> Result<Option<RunStatistics>, HarvestError> {
    let Some(run) = storage.get_latest_run()? else {
        return Ok(None);
    };

    let records_by_outcome = storage.count_records_by_outcome(run.id)?;
    let total_records = records_by_outcome.values().sum();
    let unique_postings = storage.count_unique_postings(run.id)?;
    let records_by_tag = storage.count_records_by_tag(run.id)?;

    Ok(Some(RunStatistics {
        run,
        total_records,
        records_by_outcome,
        unique_postings,
        records_by_tag,
    }))
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &RunStatistics) {
    println!("=== Harvest Statistics (run {}) ===\n", stats.run.id);

    println!("Run:");
    println!("  Status: {}", stats.run.status);
    println!("  Started: {}", stats.run.started_at);
    if let Some(finished) = &stats.run.finished_at {
        println!("  Finished: {}", finished);
    }
    println!();

    println!("Overview:");
    println!("  Records emitted: {}", stats.total_records);
    println!("  Unique postings: {}", stats.unique_postings);
    println!();

    println!("Records by Outcome:");
    for outcome in VisitOutcome::all() {
        let count = stats.records_by_outcome.get(&outcome).copied().unwrap_or(0);
        let percentage = if stats.total_records > 0 {
            (count as f64 / stats.total_records as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", outcome, count, percentage);
    }
    println!();

    if !stats.records_by_tag.is_empty() {
        println!("Records by Tag:");
        for (tag, count) in &stats.records_by_tag {
            println!("  {}: {}", tag, count);
        }
        println!();
    }

    let extracted = stats
        .records_by_outcome
        .get(&VisitOutcome::Extracted)
        .copied()
        .unwrap_or(0);
    let success_rate = if stats.total_records > 0 {
        (extracted as f64 / stats.total_records as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Extraction Rate: {:.1}% ({} / {} records fully extracted)",
        success_rate, extracted, stats.total_records
    );
}
