//! Output error and summary types
//!
//! This module defines the error type shared by the output writers and the
//! data structure behind the markdown run summary.

use crate::state::VisitOutcome;
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] crate::storage::StorageError),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// One configured search as shown in the summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetLine {
    pub url: String,
    pub tag: Option<String>,
    pub max_pages: u32,
}

/// Summary of one harvest run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    // Run metadata
    pub run_id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub duration_seconds: Option<u64>,
    pub status: String,
    pub config_hash: String,
    pub site: String,

    // Searches
    pub targets: Vec<TargetLine>,

    // Record statistics
    pub records_emitted: u64,
    pub unique_postings: u64,
    pub records_by_outcome: HashMap<VisitOutcome, u64>,
    pub records_by_tag: Vec<(String, u64)>,

    // Live counters, only known right after a crawl
    pub pages_walked: Option<u64>,
    pub stale_listings: Option<u64>,
    pub stale_pages: Option<u64>,
    pub failures: Option<u64>,
    pub block_reason: Option<String>,
    pub error: Option<String>,
}

impl RunSummary {
    /// Creates a new empty summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the record count for one outcome
    pub fn outcome_count(&self, outcome: VisitOutcome) -> u64 {
        self.records_by_outcome.get(&outcome).copied().unwrap_or(0)
    }

    /// Returns the share of records built from preview fields only, as a percentage
    pub fn degraded_rate(&self) -> f64 {
        if self.records_emitted == 0 {
            return 0.0;
        }
        let degraded: u64 = VisitOutcome::all()
            .into_iter()
            .filter(VisitOutcome::is_degraded)
            .map(|outcome| self.outcome_count(outcome))
            .sum();
        (degraded as f64 / self.records_emitted as f64) * 100.0
    }
}
