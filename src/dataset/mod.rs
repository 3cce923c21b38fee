//! Harvested records and their deduplicated aggregation
//!
//! Records stream in as they are emitted. The [`ResultSet`] keys them by
//! canonical URL, keeps the first record seen for each key and unions the
//! tags of every search that found it.

mod record;

pub use record::{JobRecord, ListingRecord, SearchTarget, EMPLOYMENT_SLOTS};

use std::collections::{BTreeSet, HashMap};

/// Separator between tags in the dataset's tag column
pub const TAG_SEPARATOR: &str = ", ";

/// One deduplicated posting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultEntry {
    /// Canonical URL
    pub key: String,

    /// First record seen for this key
    pub record: JobRecord,

    /// Every tag this posting was found under
    pub tags: BTreeSet<String>,
}

impl ResultEntry {
    /// Returns the sorted, deduplicated tags joined for display
    pub fn tag_label(&self) -> String {
        self.tags
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(TAG_SEPARATOR)
    }
}

/// Ordered map from canonical URL to record
///
/// Iteration follows the order in which keys were first seen.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    entries: Vec<ResultEntry>,
    index: HashMap<String, usize>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a record
    ///
    /// Returns `true` if the record introduced a new key. For a known key only
    /// the tag is merged; every other field keeps its first value.
    pub fn insert(&mut self, record: JobRecord) -> bool {
        let key = record.key();
        let tag = record
            .tag
            .as_deref()
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string);

        if let Some(&position) = self.index.get(&key) {
            if let Some(tag) = tag {
                self.entries[position].tags.insert(tag);
            }
            return false;
        }

        let mut tags = BTreeSet::new();
        if let Some(tag) = tag {
            tags.insert(tag);
        }

        self.index.insert(key.clone(), self.entries.len());
        self.entries.push(ResultEntry { key, record, tags });
        true
    }

    /// Returns the entry for a canonical URL
    pub fn get(&self, key: &str) -> Option<&ResultEntry> {
        self.index.get(key).map(|&position| &self.entries[position])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResultEntry> {
        self.entries.iter()
    }
}

impl Extend<JobRecord> for ResultSet {
    fn extend<I: IntoIterator<Item = JobRecord>>(&mut self, records: I) {
        for record in records {
            self.insert(record);
        }
    }
}

impl FromIterator<JobRecord> for ResultSet {
    fn from_iter<I: IntoIterator<Item = JobRecord>>(records: I) -> Self {
        let mut set = Self::new();
        set.extend(records);
        set
    }
}

/// Merges records from any number of searches into a deduplicated set
///
/// # Examples
///
/// ```
/// use job_harvest::dataset::{aggregate, JobRecord, ListingRecord};
/// use job_harvest::state::VisitOutcome;
///
/// let card = ListingRecord {
///     detail_url: "https://www.dice.com/job-detail/abc".to_string(),
///     title_preview: "Oracle EBS Consultant".to_string(),
///     ..Default::default()
/// };
/// let a = JobRecord::from_listing(&card, Some("Elizabeth"), VisitOutcome::TimedOut);
/// let b = JobRecord::from_listing(&card, Some("Connor"), VisitOutcome::TimedOut);
///
/// let results = aggregate(vec![a, b]);
/// assert_eq!(results.len(), 1);
/// assert_eq!(results.iter().next().unwrap().tag_label(), "Connor, Elizabeth");
/// ```
pub fn aggregate<I>(records: I) -> ResultSet
where
    I: IntoIterator<Item = JobRecord>,
{
    records.into_iter().collect()
}
