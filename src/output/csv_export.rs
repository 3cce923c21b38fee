//! CSV dataset export
//!
//! Writes one row per unique posting with a fixed column layout, in the
//! order the postings were first seen.

use crate::dataset::{ResultEntry, ResultSet, EMPLOYMENT_SLOTS};
use crate::output::traits::OutputResult;
use std::io::Write;
use std::path::Path;

/// Dataset header, in column order
pub const DATASET_COLUMNS: [&str; 17] = [
    "Candidate/Tag",
    "Job Title",
    "Company",
    "Recruiter Name",
    "Location",
    "Employment Type 1",
    "Employment Type 2",
    "Employment Type 3",
    "Employment Type 4",
    "Employment Type 5",
    "Employment Type 6",
    "Contract Duration",
    "Corp-To-Corp",
    "Pay",
    "Work Type",
    "Job Description",
    "Job URL",
];

/// Builds the dataset row for one posting
pub fn dataset_row(entry: &ResultEntry) -> Vec<String> {
    let record = &entry.record;
    let mut row = Vec::with_capacity(DATASET_COLUMNS.len());

    row.push(entry.tag_label());
    row.push(record.title.clone());
    row.push(record.company.clone());
    row.push(record.recruiter.clone());
    row.push(record.location.clone());
    row.extend(record.employment_types.iter().cloned());
    row.push(record.contract_duration.clone());
    row.push(record.corp_to_corp.clone());
    row.push(record.pay.clone());
    row.push(record.work_type.clone());
    row.push(record.description.clone());
    row.push(record.job_url().to_string());

    debug_assert_eq!(row.len(), 11 + EMPLOYMENT_SLOTS);
    row
}

/// Writes the dataset to any writer
///
/// # Returns
///
/// The number of data rows written
pub fn write_dataset_to<W: Write>(results: &ResultSet, writer: W) -> OutputResult<usize> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(DATASET_COLUMNS)?;

    let mut rows = 0;
    for entry in results.iter() {
        csv.write_record(dataset_row(entry))?;
        rows += 1;
    }

    csv.flush()?;
    Ok(rows)
}

/// Writes the dataset to `path`, creating parent directories as needed
///
/// # Arguments
///
/// * `results` - The aggregated postings
/// * `path` - Destination CSV file; replaced if it exists
///
/// # Returns
///
/// * `Ok(usize)` - Number of data rows written
/// * `Err(OutputError)` - Failed to create or write the file
pub fn write_dataset(results: &ResultSet, path: &Path) -> OutputResult<usize> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = std::fs::File::create(path)?;
    let rows = write_dataset_to(results, file)?;
    tracing::info!("Wrote {} rows to {}", rows, path.display());
    Ok(rows)
}
