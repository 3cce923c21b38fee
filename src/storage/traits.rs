//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::dataset::JobRecord;
use crate::state::VisitOutcome;
use crate::storage::{RunRecord, RunStatus};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Corrupt row in {table}: {message}")]
    CorruptRow { table: &'static str, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Records are written one at a time as the crawl emits them, so a run that
/// dies mid-way still leaves everything emitted so far recoverable.
pub trait Storage: Send {
    // ===== Run Management =====

    /// Creates a new harvest run
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Sets the final status of a run and stamps its finish time
    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()>;

    // ===== Records =====

    /// Appends one emitted record to a run
    ///
    /// # Arguments
    ///
    /// * `run_id` - The run that emitted the record
    /// * `sequence` - 1-based emission position within the run
    /// * `record` - The record itself
    fn insert_record(&mut self, run_id: i64, sequence: u64, record: &JobRecord)
        -> StorageResult<()>;

    /// Loads every record of a run in emission order
    fn load_records(&self, run_id: i64) -> StorageResult<Vec<JobRecord>>;

    // ===== Statistics =====

    /// Counts a run's records per visit outcome
    fn count_records_by_outcome(&self, run_id: i64) -> StorageResult<HashMap<VisitOutcome, u64>>;

    /// Counts a run's distinct canonical URLs
    fn count_unique_postings(&self, run_id: i64) -> StorageResult<u64>;

    /// Lists each tag of a run with the number of records carrying it
    fn count_records_by_tag(&self, run_id: i64) -> StorageResult<Vec<(String, u64)>>;
}
