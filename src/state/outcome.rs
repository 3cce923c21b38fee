//! Outcome definitions for listing visits
//!
//! Every listing taken from a results page ends in exactly one of these
//! outcomes. All but `Stale` produce a record.

use std::fmt;

/// How a single listing visit ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisitOutcome {
    /// Detail page rendered and fields were extracted
    Extracted,

    /// Card had no usable detail URL; record built from preview fields only
    ListingOnly,

    /// Detail page never showed its ready marker; record degraded to preview
    TimedOut,

    /// Detail navigation failed; record degraded to preview, target stopped
    NavigationFailed,

    /// Element went stale mid-extraction; listing skipped without a record
    Stale,
}

impl VisitOutcome {
    /// Returns true if the emitted record carries only preview fields
    pub fn is_degraded(&self) -> bool {
        matches!(
            self,
            Self::ListingOnly | Self::TimedOut | Self::NavigationFailed
        )
    }

    /// Converts the outcome to a database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Extracted => "extracted",
            Self::ListingOnly => "listing_only",
            Self::TimedOut => "timed_out",
            Self::NavigationFailed => "navigation_failed",
            Self::Stale => "stale",
        }
    }

    /// Parses an outcome from its database string representation
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "extracted" => Some(Self::Extracted),
            "listing_only" => Some(Self::ListingOnly),
            "timed_out" => Some(Self::TimedOut),
            "navigation_failed" => Some(Self::NavigationFailed),
            "stale" => Some(Self::Stale),
            _ => None,
        }
    }

    /// Returns all outcomes in reporting order
    pub fn all() -> [Self; 5] {
        [
            Self::Extracted,
            Self::ListingOnly,
            Self::TimedOut,
            Self::NavigationFailed,
            Self::Stale,
        ]
    }
}

impl fmt::Display for VisitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
