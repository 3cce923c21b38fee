//! Badge classification
//!
//! Detail pages show short badges such as "Contract", "6 Months",
//! "Corp To Corp" or "$70 - $80/hr". Employment badges are routed by wording
//! with a fixed precedence; pay and work-type badges are recognized by markers
//! the board attaches to them.

use crate::browser::{Browser, BrowserError};
use crate::dataset::EMPLOYMENT_SLOTS;
use crate::site::BadgeRules;
use std::collections::HashSet;

const WORK_SETTING_WORDS: &[&str] = &["remote", "hybrid", "on-site", "in-person", "in person"];

const JOB_TYPE_WORDS: &[&str] = &[
    "contract",
    "full-time",
    "full time",
    "part-time",
    "part time",
    "temporary",
    "internship",
    "permanent",
];

const PAY_WORDS: &[&str] = &["hour", "year", "month", "week", "salary", "annually"];

/// What a badge describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeKind {
    Employment,
    Pay,
    WorkType,
    Unknown,
}

/// Classifies a badge by its `id` prefix
pub fn classify_chip(id: &str, rules: &BadgeRules) -> BadgeKind {
    match rules {
        BadgeRules::ChipIds {
            employment_prefix,
            pay_prefix,
            work_type_prefix,
            ..
        } => {
            if id.starts_with(employment_prefix.as_str()) {
                BadgeKind::Employment
            } else if id.starts_with(pay_prefix.as_str()) {
                BadgeKind::Pay
            } else if id.starts_with(work_type_prefix.as_str()) {
                BadgeKind::WorkType
            } else {
                BadgeKind::Unknown
            }
        }
        BadgeRules::Keywords { .. } => BadgeKind::Unknown,
    }
}

/// Classifies a metadata snippet by its wording
///
/// Work setting is checked first, then job type, then pay.
pub fn classify_text(text: &str) -> BadgeKind {
    let lower = text.to_lowercase();

    if WORK_SETTING_WORDS.iter().any(|w| lower.contains(w)) {
        BadgeKind::WorkType
    } else if JOB_TYPE_WORDS.iter().any(|w| lower.contains(w)) {
        BadgeKind::Employment
    } else if lower.contains('$') || PAY_WORDS.iter().any(|w| lower.contains(w)) {
        BadgeKind::Pay
    } else {
        BadgeKind::Unknown
    }
}

/// Badge-derived fields of a job record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BadgeFields {
    pub employment_types: [String; EMPLOYMENT_SLOTS],
    pub contract_duration: String,
    pub corp_to_corp: String,
    pub pay: String,
    pub work_type: String,

    /// Employment badges that arrived after every slot was taken
    pub dropped: usize,
}

impl BadgeFields {
    fn filled_slots(&self) -> usize {
        self.employment_types
            .iter()
            .take_while(|slot| !slot.is_empty())
            .count()
    }

    /// Routes one employment badge
    ///
    /// Precedence, case-insensitive: "corp to corp" sets the corp-to-corp
    /// field, else "month" sets the contract duration, else the text takes
    /// the next free employment slot. Badges beyond the last slot are dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use job_harvest::crawler::BadgeFields;
    ///
    /// let mut badges = BadgeFields::default();
    /// badges.add_employment("Contract");
    /// badges.add_employment("Corp To Corp Month-to-month");
    /// badges.add_employment("12 Months");
    ///
    /// assert_eq!(badges.employment_types[0], "Contract");
    /// assert_eq!(badges.corp_to_corp, "Corp To Corp Month-to-month");
    /// assert_eq!(badges.contract_duration, "12 Months");
    /// ```
    pub fn add_employment(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        let lower = text.to_lowercase();
        if lower.contains("corp to corp") {
            self.corp_to_corp = text.to_string();
        } else if lower.contains("month") {
            self.contract_duration = text.to_string();
        } else {
            let filled = self.filled_slots();
            if filled < EMPLOYMENT_SLOTS {
                self.employment_types[filled] = text.to_string();
            } else {
                self.dropped += 1;
            }
        }
    }

    /// Records a pay badge; the first one wins
    pub fn add_pay(&mut self, text: &str) {
        if self.pay.is_empty() {
            self.pay = text.trim().to_string();
        }
    }

    /// Records a work-type badge; the first one wins
    pub fn add_work_type(&mut self, text: &str) {
        if self.work_type.is_empty() {
            self.work_type = text.trim().to_string();
        }
    }

    fn add(&mut self, kind: BadgeKind, text: &str) {
        match kind {
            BadgeKind::Employment => self.add_employment(text),
            BadgeKind::Pay => self.add_pay(text),
            BadgeKind::WorkType => self.add_work_type(text),
            BadgeKind::Unknown => {}
        }
    }
}

/// Reads and classifies every badge on the current page
///
/// A page without badges yields empty fields. Only stale references and
/// session-level failures are errors.
pub async fn read_badges(
    browser: &dyn Browser,
    rules: &BadgeRules,
) -> Result<BadgeFields, BrowserError> {
    let mut fields = BadgeFields::default();

    match rules {
        BadgeRules::ChipIds { selector, .. } => {
            for badge in browser.query(selector).await? {
                let text = badge.text.trim();
                if text.is_empty() {
                    continue;
                }
                let kind = classify_chip(badge.attr("id").unwrap_or(""), rules);
                fields.add(kind, text);
            }
        }
        BadgeRules::Keywords { selectors } => {
            // Overlapping selectors can return the same snippet twice.
            let mut seen = HashSet::new();
            for selector in selectors {
                for snippet in browser.query(selector).await? {
                    let text = snippet.text.trim().to_string();
                    if text.chars().count() < 3 || !seen.insert(text.clone()) {
                        continue;
                    }
                    fields.add(classify_text(&text), &text);
                }
            }
        }
    }

    if fields.dropped > 0 {
        tracing::debug!(
            "Dropped {} employment badge(s) beyond {} slots",
            fields.dropped,
            EMPLOYMENT_SLOTS
        );
    }

    Ok(fields)
}
