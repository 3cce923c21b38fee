//! Block and ban detection
//!
//! Consulted after every navigation. A page is treated as a block when its
//! content or URL mentions a challenge phrase, or when the browser ended up
//! on a host outside the board's expected domain.

use crate::browser::{Browser, BrowserError};
use crate::url::on_domain;
use std::fmt;

/// Phrases that mark a challenge or denial page
pub const DEFAULT_INDICATORS: &[&str] = &[
    "captcha",
    "unusual traffic",
    "verify you're human",
    "access denied",
    "security check",
];

/// Why a page was classified as blocked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockSignal {
    /// A block phrase appeared in the page or its URL
    Indicator { phrase: String, in_url: bool },

    /// The page is hosted outside the expected domain
    OffDomain { url: String, expected: String },
}

impl fmt::Display for BlockSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Indicator { phrase, in_url } => {
                let place = if *in_url { "URL" } else { "page content" };
                write!(f, "'{}' found in {}", phrase, place)
            }
            Self::OffDomain { url, expected } => {
                write!(f, "redirected to {} (expected {})", url, expected)
            }
        }
    }
}

/// Classifies pages as blocked or not
#[derive(Debug, Clone)]
pub struct BlockDetector {
    indicators: Vec<String>,
    expected_domain: String,
}

impl BlockDetector {
    /// Creates a detector with the built-in vocabulary plus `extra` phrases
    ///
    /// # Arguments
    ///
    /// * `expected_domain` - Wildcard host pattern, e.g. `*.dice.com`
    /// * `extra` - Additional phrases, matched case-insensitively
    pub fn new(expected_domain: &str, extra: &[String]) -> Self {
        let mut indicators: Vec<String> =
            DEFAULT_INDICATORS.iter().map(|s| s.to_string()).collect();

        for phrase in extra {
            let phrase = phrase.trim().to_lowercase();
            if !phrase.is_empty() && !indicators.contains(&phrase) {
                indicators.push(phrase);
            }
        }

        Self {
            indicators,
            expected_domain: expected_domain.trim().to_lowercase(),
        }
    }

    /// Returns the signal for the first block condition found, if any
    ///
    /// # Examples
    ///
    /// ```
    /// use job_harvest::crawler::BlockDetector;
    ///
    /// let detector = BlockDetector::new("*.dice.com", &[]);
    /// let page = "<h1>Please complete the CAPTCHA to continue</h1>";
    /// assert!(detector.check("https://www.dice.com/jobs", page).is_some());
    /// assert!(detector.check("https://www.dice.com/jobs", "<h1>Jobs</h1>").is_none());
    /// assert!(detector.check("https://login.example.net/", "<h1>Jobs</h1>").is_some());
    /// ```
    pub fn check(&self, current_url: &str, page_content: &str) -> Option<BlockSignal> {
        let url = current_url.to_lowercase();
        let content = page_content.to_lowercase();

        for phrase in &self.indicators {
            if content.contains(phrase.as_str()) {
                return Some(BlockSignal::Indicator {
                    phrase: phrase.clone(),
                    in_url: false,
                });
            }
            if url.contains(phrase.as_str()) {
                return Some(BlockSignal::Indicator {
                    phrase: phrase.clone(),
                    in_url: true,
                });
            }
        }

        if !on_domain(current_url, &self.expected_domain) {
            return Some(BlockSignal::OffDomain {
                url: current_url.to_string(),
                expected: self.expected_domain.clone(),
            });
        }

        None
    }

    /// Returns true if the page is blocked
    pub fn is_blocked(&self, current_url: &str, page_content: &str) -> bool {
        self.check(current_url, page_content).is_some()
    }

    /// Checks the page currently loaded in `browser`
    pub async fn inspect(&self, browser: &dyn Browser) -> Result<Option<BlockSignal>, BrowserError> {
        let url = browser.current_url().await?;
        let content = browser.page_content().await?;
        Ok(self.check(&url, &content))
    }
}
