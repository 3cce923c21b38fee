//! Job board adapters
//!
//! Everything the crawl pipeline knows about a particular board lives in a
//! [`SiteAdapter`]: where the cards are, which selectors to try for each
//! field, how badges are read and how result pages are numbered. The pipeline
//! itself is the same for every board.

mod presets;

use crate::config::SiteConfig;
use crate::url::PageParam;
use crate::ConfigError;

/// Names accepted by `[site] preset`
pub const PRESET_NAMES: &[&str] = &["dice", "indeed"];

/// Returns true if `name` is a built-in adapter
pub fn is_known_preset(name: &str) -> bool {
    PRESET_NAMES.contains(&name.trim().to_ascii_lowercase().as_str())
}

/// Selectors evaluated inside one result card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingSelectors {
    /// Element whose `href` leads to the detail page
    pub link: String,
    pub title: String,
    pub company: String,
    pub location: String,
}

/// Ordered selector chains for detail page fields
///
/// The first selector yielding non-empty text wins.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldChains {
    pub title: Vec<String>,
    pub company: Vec<String>,
    pub location: Vec<String>,
    pub recruiter: Vec<String>,
    pub description: Vec<String>,
}

/// How a board exposes employment, pay and work-type badges
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BadgeRules {
    /// Badge elements whose `id` prefix names their kind
    ChipIds {
        selector: String,
        employment_prefix: String,
        pay_prefix: String,
        work_type_prefix: String,
    },

    /// Metadata snippets classified by their wording
    Keywords { selectors: Vec<String> },
}

/// Capability object describing one job board
#[derive(Debug, Clone, PartialEq)]
pub struct SiteAdapter {
    /// Preset name
    pub name: String,

    /// Wildcard host pattern every page must stay on, e.g. `*.dice.com`
    pub expected_domain: String,

    /// One element per result card
    pub card_selector: String,

    pub listing: ListingSelectors,

    /// Substring every genuine detail URL contains
    pub detail_url_marker: String,

    /// Element whose presence means the detail page has rendered
    pub ready_marker: String,

    pub fields: FieldChains,

    pub badges: BadgeRules,

    /// How result pages are addressed when the template has no placeholder
    pub page_param: PageParam,

    /// Boilerplate suffix stripped from detail titles
    pub title_suffix: Option<String>,

    /// Try to read the location out of the description when no field has it
    pub location_from_description: bool,
}

impl SiteAdapter {
    /// Returns the built-in adapter called `name`
    pub fn preset(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "dice" => Some(presets::dice()),
            "indeed" => Some(presets::indeed()),
            _ => None,
        }
    }

    /// Builds the adapter selected by the `[site]` section
    ///
    /// # Arguments
    ///
    /// * `config` - Preset name and optional expected-domain override
    ///
    /// # Returns
    ///
    /// * `Ok(SiteAdapter)` - The preset with overrides applied
    /// * `Err(ConfigError)` - The preset name is unknown
    pub fn from_config(config: &SiteConfig) -> Result<Self, ConfigError> {
        let mut adapter = Self::preset(&config.preset).ok_or_else(|| {
            ConfigError::Validation(format!("Unknown site preset '{}'", config.preset))
        })?;

        if let Some(pattern) = &config.expected_domain {
            adapter.expected_domain = pattern.trim().to_ascii_lowercase();
        }

        Ok(adapter)
    }

    /// Returns `true` if `url` has the shape of one of this board's detail pages
    pub fn is_detail_url(&self, url: &str) -> bool {
        !url.is_empty() && url.contains(&self.detail_url_marker)
    }

    /// Strips the configured suffix and surrounding whitespace from a title
    ///
    /// # Examples
    ///
    /// ```
    /// use job_harvest::site::SiteAdapter;
    ///
    /// let indeed = SiteAdapter::preset("indeed").unwrap();
    /// assert_eq!(indeed.clean_title("SAP Developer - job post"), "SAP Developer");
    /// ```
    pub fn clean_title(&self, raw: &str) -> String {
        match &self.title_suffix {
            Some(suffix) if !suffix.is_empty() => {
                raw.replace(suffix.as_str(), "").trim().to_string()
            }
            _ => raw.trim().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::parse_selector;

    fn all_selectors(adapter: &SiteAdapter) -> Vec<String> {
        let mut selectors = vec![
            adapter.card_selector.clone(),
            adapter.listing.link.clone(),
            adapter.listing.title.clone(),
            adapter.listing.company.clone(),
            adapter.listing.location.clone(),
            adapter.ready_marker.clone(),
        ];
        let fields = &adapter.fields;
        for chain in [
            &fields.title,
            &fields.company,
            &fields.location,
            &fields.recruiter,
            &fields.description,
        ] {
            selectors.extend(chain.iter().cloned());
        }
        match &adapter.badges {
            BadgeRules::ChipIds { selector, .. } => selectors.push(selector.clone()),
            BadgeRules::Keywords { selectors: s } => selectors.extend(s.iter().cloned()),
        }
        selectors
    }

    #[test]
    fn test_every_preset_selector_parses() {
        for name in PRESET_NAMES {
            let adapter = SiteAdapter::preset(name).unwrap();
            for selector in all_selectors(&adapter) {
                assert!(
                    parse_selector(&selector).is_ok(),
                    "{} selector does not parse: {}",
                    name,
                    selector
                );
            }
        }
    }

    #[test]
    fn test_preset_lookup() {
        assert!(is_known_preset("dice"));
        assert!(is_known_preset(" Indeed "));
        assert!(!is_known_preset("monster"));
        assert!(SiteAdapter::preset("monster").is_none());
        assert_eq!(SiteAdapter::preset("DICE").unwrap().name, "dice");
    }

    #[test]
    fn test_from_config_applies_domain_override() {
        let config = SiteConfig {
            preset: "dice".to_string(),
            expected_domain: Some("127.0.0.1".to_string()),
        };
        let adapter = SiteAdapter::from_config(&config).unwrap();
        assert_eq!(adapter.expected_domain, "127.0.0.1");

        let config = SiteConfig {
            preset: "indeed".to_string(),
            expected_domain: None,
        };
        let adapter = SiteAdapter::from_config(&config).unwrap();
        assert_eq!(adapter.expected_domain, "*.indeed.com");
    }

    #[test]
    fn test_from_config_unknown_preset() {
        let config = SiteConfig {
            preset: "monster".to_string(),
            expected_domain: None,
        };
        assert!(matches!(
            SiteAdapter::from_config(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_detail_url_shape() {
        let dice = SiteAdapter::preset("dice").unwrap();
        assert!(dice.is_detail_url("https://www.dice.com/job-detail/5f3c"));
        assert!(!dice.is_detail_url("https://www.dice.com/apply-redirect?id=1"));
        assert!(!dice.is_detail_url(""));

        let indeed = SiteAdapter::preset("indeed").unwrap();
        assert!(indeed.is_detail_url("https://www.indeed.com/viewjob?jk=abc123"));
        assert!(indeed.is_detail_url("https://www.indeed.com/rc/clk?jk=abc123&from=serp"));
    }

    #[test]
    fn test_clean_title() {
        let dice = SiteAdapter::preset("dice").unwrap();
        assert_eq!(dice.clean_title("  Oracle EBS Consultant \n"), "Oracle EBS Consultant");

        let indeed = SiteAdapter::preset("indeed").unwrap();
        assert_eq!(indeed.clean_title("Java Engineer - job post"), "Java Engineer");
    }
}
