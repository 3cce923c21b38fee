use crate::state::VisitOutcome;
use crate::url::canonical_url;

/// Number of employment-type columns in the dataset
pub const EMPLOYMENT_SLOTS: usize = 6;

/// One search to walk, fixed once queued
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTarget {
    /// Search URL, optionally with a `{page}` placeholder
    pub query_url_template: String,

    /// Candidate or topic label for every record found by this search
    pub tag: Option<String>,

    /// Pages to walk at most
    pub max_pages: u32,
}

/// A card read from a results page
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListingRecord {
    /// Absolute detail page URL, empty when the card has none
    pub detail_url: String,
    pub title_preview: String,
    pub company_preview: String,
    pub location_preview: String,

    /// Results page the card came from, tagged with the card's position
    pub listing_url: String,
}

impl ListingRecord {
    /// Returns the deduplication key for this card
    pub fn key(&self) -> String {
        canonical_url(&self.detail_url, &self.listing_url)
    }
}

/// A harvested job posting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRecord {
    pub title: String,
    pub company: String,
    pub recruiter: String,
    pub location: String,
    pub employment_types: [String; EMPLOYMENT_SLOTS],
    pub contract_duration: String,
    pub corp_to_corp: String,
    pub pay: String,
    pub work_type: String,
    pub description: String,
    pub detail_url: String,
    pub listing_url: String,
    pub tag: Option<String>,

    /// True when only preview fields were available
    pub listing_only: bool,

    pub outcome: VisitOutcome,
}

impl JobRecord {
    /// Creates a record with only the preview fields of `listing`
    ///
    /// Used for cards without a detail page and for detail visits that
    /// timed out or failed to load.
    pub fn from_listing(listing: &ListingRecord, tag: Option<&str>, outcome: VisitOutcome) -> Self {
        Self {
            title: listing.title_preview.clone(),
            company: listing.company_preview.clone(),
            recruiter: String::new(),
            location: listing.location_preview.clone(),
            employment_types: Default::default(),
            contract_duration: String::new(),
            corp_to_corp: String::new(),
            pay: String::new(),
            work_type: String::new(),
            description: String::new(),
            detail_url: listing.detail_url.clone(),
            listing_url: listing.listing_url.clone(),
            tag: tag.map(str::to_string),
            listing_only: true,
            outcome,
        }
    }

    /// Returns the deduplication key for this record
    pub fn key(&self) -> String {
        canonical_url(&self.detail_url, &self.listing_url)
    }

    /// Returns the URL shown in the dataset: the detail page, else the results page
    pub fn job_url(&self) -> &str {
        if self.detail_url.trim().is_empty() {
            &self.listing_url
        } else {
            &self.detail_url
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing() -> ListingRecord {
        ListingRecord {
            detail_url: String::new(),
            title_preview: "SAP ABAP Developer".to_string(),
            company_preview: "Acme Staffing".to_string(),
            location_preview: "Remote".to_string(),
            listing_url: "https://www.dice.com/jobs?q=sap&page=2#card-3".to_string(),
        }
    }

    #[test]
    fn test_from_listing_keeps_previews() {
        let record = JobRecord::from_listing(&listing(), Some("Jose"), VisitOutcome::ListingOnly);

        assert_eq!(record.title, "SAP ABAP Developer");
        assert_eq!(record.company, "Acme Staffing");
        assert_eq!(record.location, "Remote");
        assert!(record.recruiter.is_empty());
        assert!(record.employment_types.iter().all(String::is_empty));
        assert_eq!(record.tag.as_deref(), Some("Jose"));
        assert!(record.listing_only);
        assert_eq!(record.outcome, VisitOutcome::ListingOnly);
    }

    #[test]
    fn test_job_url_falls_back_to_listing_page() {
        let mut record = JobRecord::from_listing(&listing(), None, VisitOutcome::ListingOnly);
        assert_eq!(record.job_url(), "https://www.dice.com/jobs?q=sap&page=2#card-3");

        record.detail_url = "https://www.dice.com/job-detail/abc".to_string();
        assert_eq!(record.job_url(), "https://www.dice.com/job-detail/abc");
    }

    #[test]
    fn test_key_prefers_detail_url() {
        let mut card = listing();
        let fallback_key = card.key();
        assert!(fallback_key.ends_with("#card-3"));

        card.detail_url = "https://www.dice.com/job-detail/abc?searchlink=x".to_string();
        assert_eq!(card.key(), "https://www.dice.com/job-detail/abc");
    }
}
