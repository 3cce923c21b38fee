//! Database schema definitions and migrations
//!
//! This module contains all SQL schema definitions for the Job-Harvest database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track harvest runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL
);

-- Every emitted record, in emission order
CREATE TABLE IF NOT EXISTS job_records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    sequence INTEGER NOT NULL,
    canonical_url TEXT NOT NULL,
    tag TEXT,
    outcome TEXT NOT NULL,
    listing_only INTEGER NOT NULL DEFAULT 0,
    title TEXT NOT NULL,
    company TEXT NOT NULL,
    recruiter TEXT NOT NULL,
    location TEXT NOT NULL,
    employment_type_1 TEXT NOT NULL,
    employment_type_2 TEXT NOT NULL,
    employment_type_3 TEXT NOT NULL,
    employment_type_4 TEXT NOT NULL,
    employment_type_5 TEXT NOT NULL,
    employment_type_6 TEXT NOT NULL,
    contract_duration TEXT NOT NULL,
    corp_to_corp TEXT NOT NULL,
    pay TEXT NOT NULL,
    work_type TEXT NOT NULL,
    description TEXT NOT NULL,
    detail_url TEXT NOT NULL,
    listing_url TEXT NOT NULL,
    recorded_at TEXT NOT NULL,
    UNIQUE(run_id, sequence)
);

CREATE INDEX IF NOT EXISTS idx_job_records_run ON job_records(run_id);
CREATE INDEX IF NOT EXISTS idx_job_records_url ON job_records(canonical_url);
CREATE INDEX IF NOT EXISTS idx_job_records_outcome ON job_records(outcome);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
