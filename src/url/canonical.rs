use crate::UrlError;
use url::Url;

/// Query parameters that vary between searches for the same posting
///
/// Job boards append the originating search to detail links, so the same
/// posting reached from two queries would otherwise yield two keys.
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "searchlink",
    "searchid",
    "from",
    "tk",
];

/// Returns true if `url` parses as an absolute http(s) URL with a host
pub fn is_well_formed(url: &str) -> bool {
    match Url::parse(url.trim()) {
        Ok(parsed) => {
            matches!(parsed.scheme(), "http" | "https") && parsed.host_str().is_some()
        }
        Err(_) => false,
    }
}

/// Normalizes a URL for use as a deduplication key
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed or not http(s)
/// 2. Lowercase the host
/// 3. Remove a trailing slash from non-root paths
/// 4. Remove the fragment
/// 5. Remove search-tracking query parameters (case-insensitive keys)
/// 6. Sort remaining query parameters by key
///
/// # Examples
///
/// ```
/// use job_harvest::url::normalize_url;
///
/// let url = normalize_url("https://WWW.DICE.COM/job-detail/abc/?searchId=9#apply").unwrap();
/// assert_eq!(url.as_str(), "https://www.dice.com/job-detail/abc");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    let host = url.host_str().ok_or(UrlError::MissingDomain)?.to_lowercase();
    url.set_host(Some(&host))
        .map_err(|e| UrlError::Parse(format!("Failed to set host: {}", e)))?;

    let path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        url.set_path(path.trim_end_matches('/'));
    }

    url.set_fragment(None);

    if url.query().is_some() {
        let mut params: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !is_tracking_param(key))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        params.sort_by(|a, b| a.0.cmp(&b.0));

        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params);
        }
    }

    Ok(url)
}

fn is_tracking_param(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key.as_str())
}

/// Computes the canonical URL used as the deduplication key
///
/// The detail URL wins when it is present and well-formed; otherwise the
/// originating listing URL is used. Listing URLs carry a `#card-N` fragment
/// naming the card's position on its results page, and that fragment is kept
/// so distinct link-less cards from one page do not collapse into one key.
/// Unparseable input falls back to the trimmed raw string.
///
/// # Examples
///
/// ```
/// use job_harvest::url::canonical_url;
///
/// let key = canonical_url(
///     "https://www.dice.com/job-detail/abc?searchlink=q%3Drust",
///     "https://www.dice.com/jobs?q=rust&page=1#card-0",
/// );
/// assert_eq!(key, "https://www.dice.com/job-detail/abc");
///
/// let key = canonical_url("", "https://www.dice.com/jobs?q=rust&page=1#card-4");
/// assert_eq!(key, "https://www.dice.com/jobs?page=1&q=rust#card-4");
/// ```
pub fn canonical_url(detail_url: &str, listing_url: &str) -> String {
    if is_well_formed(detail_url) {
        if let Ok(url) = normalize_url(detail_url) {
            return url.to_string();
        }
    }

    match Url::parse(listing_url.trim()) {
        Ok(original) => match normalize_url(listing_url) {
            Ok(mut url) => {
                url.set_fragment(original.fragment());
                url.to_string()
            }
            Err(_) => listing_url.trim().to_string(),
        },
        Err(_) => listing_url.trim().to_string(),
    }
}
