//! Configuration module for Job-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use job_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Searches configured: {}", config.targets.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BlockPolicy, BrowserConfig, Config, CrawlerConfig, DelayRange, OutputConfig, SiteConfig,
    TargetEntry,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};

use crate::dataset::SearchTarget;

impl Config {
    /// Returns the configured searches in queue order
    ///
    /// Targets without their own page limit get `crawler.default-max-pages`.
    pub fn search_targets(&self) -> Vec<SearchTarget> {
        self.targets
            .iter()
            .map(|entry| SearchTarget {
                query_url_template: entry.url.trim().to_string(),
                tag: entry
                    .tag
                    .as_deref()
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .map(str::to_string),
                max_pages: entry.max_pages.unwrap_or(self.crawler.default_max_pages),
            })
            .collect()
    }
}
