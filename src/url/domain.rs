use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host (`about:blank`, `data:` pages), it returns None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use job_harvest::url::extract_domain;
///
/// let url = Url::parse("https://www.dice.com/jobs").unwrap();
/// assert_eq!(extract_domain(&url), Some("www.dice.com".to_string()));
///
/// let url = Url::parse("https://WWW.INDEED.COM/viewjob").unwrap();
/// assert_eq!(extract_domain(&url), Some("www.indeed.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Parses a URL string and returns its lowercase host
///
/// Returns None when the string does not parse or has no host.
pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url.trim())
        .ok()
        .as_ref()
        .and_then(extract_domain)
}
