//! URL handling module for Job-Harvest
//!
//! This module provides search-page URL construction, canonical URL
//! computation for deduplication, domain extraction and wildcard matching.

mod canonical;
mod domain;
mod matcher;
mod pages;

// Re-export main functions
pub use canonical::{canonical_url, is_well_formed, normalize_url};
pub use domain::{extract_domain, host_of};
pub use matcher::matches_wildcard;
pub use pages::{page_url, PageParam, PAGE_PLACEHOLDER};

/// Returns true if `url` is hosted on a domain matching `pattern`
///
/// Unparseable URLs never match.
///
/// # Examples
///
/// ```
/// use job_harvest::url::on_domain;
///
/// assert!(on_domain("https://www.dice.com/jobs?q=rust", "*.dice.com"));
/// assert!(!on_domain("https://login.example.net/", "*.dice.com"));
/// assert!(!on_domain("not a url", "*.dice.com"));
/// ```
pub fn on_domain(url: &str, pattern: &str) -> bool {
    match host_of(url) {
        Some(host) => matches_wildcard(&pattern.to_lowercase(), &host),
        None => false,
    }
}
