//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::dataset::{JobRecord, EMPLOYMENT_SLOTS};
use crate::state::VisitOutcome;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{RunRecord, RunStatus};
use crate::HarvestError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use std::path::Path;

const RECORD_COLUMNS: &str = "tag, outcome, listing_only, title, company, recruiter, location,
    employment_type_1, employment_type_2, employment_type_3,
    employment_type_4, employment_type_5, employment_type_6,
    contract_duration, corp_to_corp, pay, work_type, description, detail_url, listing_url";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(HarvestError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, HarvestError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, HarvestError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
        Ok(RunRecord {
            id: row.get(0)?,
            started_at: row.get(1)?,
            finished_at: row.get(2)?,
            config_hash: row.get(3)?,
            status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
                .unwrap_or(RunStatus::Running),
        })
    }

    fn record_from_row(row: &Row<'_>) -> rusqlite::Result<(JobRecord, String)> {
        let outcome: String = row.get(1)?;
        let mut employment_types: [String; EMPLOYMENT_SLOTS] = Default::default();
        for (slot, value) in employment_types.iter_mut().enumerate() {
            *value = row.get(7 + slot)?;
        }

        let record = JobRecord {
            tag: row.get(0)?,
            // Replaced below once the outcome string is validated.
            outcome: VisitOutcome::Extracted,
            listing_only: row.get(2)?,
            title: row.get(3)?,
            company: row.get(4)?,
            recruiter: row.get(5)?,
            location: row.get(6)?,
            employment_types,
            contract_duration: row.get(13)?,
            corp_to_corp: row.get(14)?,
            pay: row.get(15)?,
            work_type: row.get(16)?,
            description: row.get(17)?,
            detail_url: row.get(18)?,
            listing_url: row.get(19)?,
        };
        Ok((record, outcome))
    }
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status FROM runs WHERE id = ?1",
                params![run_id],
                Self::run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status FROM runs ORDER BY id DESC LIMIT 1",
                [],
                Self::run_from_row,
            )
            .optional()?;

        Ok(run)
    }

    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![status.to_db_string(), now, run_id],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    // ===== Records =====

    fn insert_record(
        &mut self,
        run_id: i64,
        sequence: u64,
        record: &JobRecord,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let [e1, e2, e3, e4, e5, e6] = &record.employment_types;

        self.conn.execute(
            &format!(
                "INSERT INTO job_records (run_id, sequence, canonical_url, recorded_at, {})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                         ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24)",
                RECORD_COLUMNS
            ),
            params![
                run_id,
                sequence as i64,
                record.key(),
                now,
                record.tag,
                record.outcome.to_db_string(),
                record.listing_only,
                record.title,
                record.company,
                record.recruiter,
                record.location,
                e1,
                e2,
                e3,
                e4,
                e5,
                e6,
                record.contract_duration,
                record.corp_to_corp,
                record.pay,
                record.work_type,
                record.description,
                record.detail_url,
                record.listing_url,
            ],
        )?;
        Ok(())
    }

    fn load_records(&self, run_id: i64) -> StorageResult<Vec<JobRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM job_records WHERE run_id = ?1 ORDER BY sequence",
            RECORD_COLUMNS
        ))?;

        let rows = stmt.query_map(params![run_id], Self::record_from_row)?;

        let mut records = Vec::new();
        for row in rows {
            let (mut record, outcome) = row?;
            record.outcome =
                VisitOutcome::from_db_string(&outcome).ok_or_else(|| StorageError::CorruptRow {
                    table: "job_records",
                    message: format!("unknown outcome '{}'", outcome),
                })?;
            records.push(record);
        }

        Ok(records)
    }

    // ===== Statistics =====

    fn count_records_by_outcome(&self, run_id: i64) -> StorageResult<HashMap<VisitOutcome, u64>> {
        let mut stmt = self.conn.prepare(
            "SELECT outcome, COUNT(*) FROM job_records WHERE run_id = ?1 GROUP BY outcome",
        )?;

        let rows = stmt.query_map(params![run_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut counts = HashMap::new();
        for row in rows {
            let (outcome, count) = row?;
            if let Some(outcome) = VisitOutcome::from_db_string(&outcome) {
                counts.insert(outcome, count as u64);
            }
        }

        Ok(counts)
    }

    fn count_unique_postings(&self, run_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(DISTINCT canonical_url) FROM job_records WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_records_by_tag(&self, run_id: i64) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT tag, COUNT(*) FROM job_records
             WHERE run_id = ?1 AND tag IS NOT NULL AND tag != ''
             GROUP BY tag ORDER BY tag",
        )?;

        let rows = stmt.query_map(params![run_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
        })?;

        let mut counts = Vec::new();
        for row in rows {
            counts.push(row?);
        }
        Ok(counts)
    }
}
