/// Checks if a domain matches a wildcard pattern
///
/// Two kinds of pattern are supported:
/// 1. Exact match: "www.dice.com" matches only "www.dice.com"
/// 2. Wildcard match: "*.dice.com" matches the bare domain "dice.com" and
///    any subdomain such as "www.dice.com" or "api.v2.dice.com"
///
/// Both arguments are expected to be lowercase already.
///
/// # Examples
///
/// ```
/// use job_harvest::url::matches_wildcard;
///
/// assert!(matches_wildcard("www.dice.com", "www.dice.com"));
/// assert!(!matches_wildcard("www.dice.com", "dice.com"));
///
/// assert!(matches_wildcard("*.dice.com", "dice.com"));
/// assert!(matches_wildcard("*.dice.com", "www.dice.com"));
/// assert!(!matches_wildcard("*.dice.com", "dice.com.evil.net"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    match pattern.strip_prefix("*.") {
        Some(base) => {
            candidate == base
                || candidate
                    .strip_suffix(base)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        }
        None => candidate == pattern,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(matches_wildcard("www.indeed.com", "www.indeed.com"));
        assert!(!matches_wildcard("www.indeed.com", "secure.indeed.com"));
    }

    #[test]
    fn test_wildcard_matches_bare_and_subdomains() {
        assert!(matches_wildcard("*.indeed.com", "indeed.com"));
        assert!(matches_wildcard("*.indeed.com", "www.indeed.com"));
        assert!(matches_wildcard("*.indeed.com", "uk.www.indeed.com"));
    }

    #[test]
    fn test_wildcard_rejects_lookalikes() {
        assert!(!matches_wildcard("*.indeed.com", "notindeed.com"));
        assert!(!matches_wildcard("*.indeed.com", "indeed.com.phish.io"));
        assert!(!matches_wildcard("*.indeed.com", "indeed.co"));
    }

    #[test]
    fn test_empty_strings() {
        assert!(!matches_wildcard("*.dice.com", ""));
        assert!(!matches_wildcard("", "dice.com"));
    }
}
