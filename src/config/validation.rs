use crate::config::types::{
    BrowserConfig, Config, CrawlerConfig, DelayRange, OutputConfig, SiteConfig, TargetEntry,
};
use crate::ConfigError;
use url::Url;

/// Largest accepted `max-backoff-multiplier`
const MAX_BACKOFF_CEILING: f64 = 1_000.0;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_browser_config(&config.browser)?;
    validate_output_config(&config.output)?;
    validate_site_config(&config.site)?;
    validate_targets(&config.targets)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.default_max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "default-max-pages must be >= 1, got {}",
            config.default_max_pages
        )));
    }

    if config.max_consecutive_failures < 1 {
        return Err(ConfigError::Validation(format!(
            "max-consecutive-failures must be >= 1, got {}",
            config.max_consecutive_failures
        )));
    }

    if !(config.backoff_factor > 1.0) || !config.backoff_factor.is_finite() {
        return Err(ConfigError::Validation(format!(
            "backoff-factor must be greater than 1.0, got {}",
            config.backoff_factor
        )));
    }

    if !(config.backoff_decay > 0.0 && config.backoff_decay < 1.0) {
        return Err(ConfigError::Validation(format!(
            "backoff-decay must be between 0 and 1 (exclusive), got {}",
            config.backoff_decay
        )));
    }

    let ceiling = config.max_backoff_multiplier;
    if !(1.0..=MAX_BACKOFF_CEILING).contains(&ceiling) {
        return Err(ConfigError::Validation(format!(
            "max-backoff-multiplier must be between 1.0 and {}, got {}",
            MAX_BACKOFF_CEILING, ceiling
        )));
    }

    if config.poll_interval_ms == 0 {
        return Err(ConfigError::Validation(
            "poll-interval-ms must be > 0".to_string(),
        ));
    }

    if config.max_listings_per_page == Some(0) {
        return Err(ConfigError::Validation(
            "max-listings-per-page must be >= 1 when set".to_string(),
        ));
    }

    if config
        .block_indicators
        .iter()
        .any(|indicator| indicator.trim().is_empty())
    {
        return Err(ConfigError::Validation(
            "block-indicators cannot contain empty phrases".to_string(),
        ));
    }

    validate_delay("page-delay", &config.page_delay)?;
    validate_delay("detail-delay", &config.detail_delay)?;
    validate_delay("target-delay", &config.target_delay)?;

    Ok(())
}

fn validate_delay(name: &str, range: &DelayRange) -> Result<(), ConfigError> {
    if range.min_ms > range.max_ms {
        return Err(ConfigError::Validation(format!(
            "{} min-ms ({}) must not exceed max-ms ({})",
            name, range.min_ms, range.max_ms
        )));
    }
    Ok(())
}

/// Validates browser configuration
fn validate_browser_config(config: &BrowserConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.navigation_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "navigation-timeout-secs must be >= 1, got {}",
            config.navigation_timeout_secs
        )));
    }

    if let Some(proxy) = &config.proxy {
        Url::parse(proxy)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid proxy '{}': {}", proxy, e)))?;
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.csv_path.is_empty() {
        return Err(ConfigError::Validation(
            "csv-path cannot be empty".to_string(),
        ));
    }

    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    if config.summary_path.is_empty() {
        return Err(ConfigError::Validation(
            "summary-path cannot be empty".to_string(),
        ));
    }

    if config.screenshot_dir.as_deref() == Some("") {
        return Err(ConfigError::Validation(
            "screenshot-dir cannot be empty when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates the job board selection
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    if !crate::site::is_known_preset(&config.preset) {
        return Err(ConfigError::Validation(format!(
            "Unknown site preset '{}' (expected one of: {})",
            config.preset,
            crate::site::PRESET_NAMES.join(", ")
        )));
    }

    if let Some(pattern) = &config.expected_domain {
        validate_domain_pattern(pattern)?;
    }

    Ok(())
}

/// Validates the search targets
fn validate_targets(targets: &[TargetEntry]) -> Result<(), ConfigError> {
    for entry in targets {
        // Templates may carry a `{page}` placeholder; check the first page instead.
        let first_page = entry.url.trim().replace(crate::url::PAGE_PLACEHOLDER, "1");
        let url = Url::parse(&first_page).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid target URL '{}': {}", entry.url, e))
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Validation(format!(
                "Target URL '{}' must use http or https",
                entry.url
            )));
        }

        if url.host_str().is_none() {
            return Err(ConfigError::InvalidUrl(format!(
                "Target URL '{}' has no host",
                entry.url
            )));
        }

        if entry.max_pages == Some(0) {
            return Err(ConfigError::Validation(format!(
                "max-pages for '{}' must be >= 1",
                entry.url
            )));
        }
    }

    Ok(())
}

/// Validates a domain pattern (supports wildcards)
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    if let Some(domain) = pattern.strip_prefix("*.") {
        validate_domain_string(domain)?;
    } else {
        validate_domain_string(pattern)?;
    }

    Ok(())
}

/// Validates a domain string (without wildcard prefix)
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    // Must contain at least one dot (e.g., dice.com, not just "dice")
    if !domain.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must contain at least one dot (e.g., 'dice.com')",
            domain
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BlockPolicy;

    fn sample_config() -> Config {
        Config {
            crawler: CrawlerConfig::default(),
            browser: BrowserConfig::default(),
            output: OutputConfig {
                csv_path: "jobs.csv".to_string(),
                database_path: "jobs.db".to_string(),
                summary_path: "summary.md".to_string(),
                screenshot_dir: None,
            },
            site: SiteConfig {
                preset: "dice".to_string(),
                expected_domain: None,
            },
            targets: vec![TargetEntry {
                url: "https://www.dice.com/jobs?q=rust".to_string(),
                tag: Some("Ana".to_string()),
                max_pages: None,
            }],
        }
    }

    #[test]
    fn test_sample_config_is_valid() {
        assert!(validate(&sample_config()).is_ok());
    }

    #[test]
    fn test_validate_domain_pattern() {
        assert!(validate_domain_pattern("dice.com").is_ok());
        assert!(validate_domain_pattern("*.dice.com").is_ok());
        assert!(validate_domain_pattern("uk.indeed.com").is_ok());
        assert!(validate_domain_pattern("127.0.0.1").is_ok());

        assert!(validate_domain_pattern("").is_err());
        assert!(validate_domain_pattern("*.").is_err());
        assert!(validate_domain_pattern("dice").is_err());
        assert!(validate_domain_pattern(".dice.com").is_err());
        assert!(validate_domain_pattern("dice.com.").is_err());
    }

    #[test]
    fn test_backoff_bounds() {
        let mut config = sample_config();
        config.crawler.backoff_factor = 1.0;
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));

        let mut config = sample_config();
        config.crawler.backoff_decay = 1.0;
        assert!(validate(&config).is_err());

        let mut config = sample_config();
        config.crawler.backoff_decay = 0.0;
        assert!(validate(&config).is_err());

        let mut config = sample_config();
        config.crawler.max_consecutive_failures = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_backoff_ceiling_bounds() {
        let mut config = sample_config();
        config.crawler.max_backoff_multiplier = 0.5;
        assert!(validate(&config).is_err());

        config.crawler.max_backoff_multiplier = f64::INFINITY;
        assert!(validate(&config).is_err());

        config.crawler.max_backoff_multiplier = f64::NAN;
        assert!(validate(&config).is_err());

        config.crawler.max_backoff_multiplier = 1_000.0;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_inverted_delay_range_rejected() {
        let mut config = sample_config();
        config.crawler.detail_delay = DelayRange::new(5_000, 1_000);
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("detail-delay"));
    }

    #[test]
    fn test_unknown_preset_rejected() {
        let mut config = sample_config();
        config.site.preset = "monster".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_bad_expected_domain_rejected() {
        let mut config = sample_config();
        config.site.expected_domain = Some("not a domain".to_string());
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_target_urls() {
        let mut config = sample_config();
        config.targets[0].url = "https://www.dice.com/jobs?q=rust&page={page}".to_string();
        assert!(validate(&config).is_ok());

        config.targets[0].url = "ftp://www.dice.com/jobs".to_string();
        assert!(validate(&config).is_err());

        config.targets[0].url = "not a url".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));

        let mut config = sample_config();
        config.targets[0].max_pages = Some(0);
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_listing_cap_rejected() {
        let mut config = sample_config();
        config.crawler.max_listings_per_page = Some(0);
        assert!(validate(&config).is_err());

        config.crawler.max_listings_per_page = Some(2);
        config.crawler.block_policy = BlockPolicy::SkipTarget;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_bad_proxy_rejected() {
        let mut config = sample_config();
        config.browser.proxy = Some("::nope".to_string());
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }
}
