//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlState`: run-wide failure streak, backoff multiplier and block flag
//! - `VisitOutcome`: how a single listing visit ended

mod crawl_state;
mod outcome;

// Re-export main types
pub use crawl_state::{scale_duration, BackoffPolicy, CrawlState, FailureVerdict};
pub use outcome::VisitOutcome;
