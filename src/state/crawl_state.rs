use crate::config::CrawlerConfig;
use std::time::Duration;

/// Parameters of the failure/backoff state machine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
    /// Failure streak length that ends the run
    pub max_consecutive_failures: u32,

    /// Multiplier growth per failure (> 1)
    pub factor: f64,

    /// Multiplier shrink per success (< 1)
    pub decay: f64,

    /// Backoff sleep at multiplier 1.0
    pub base: Duration,

    /// The multiplier never grows past this
    pub max_multiplier: f64,
}

impl BackoffPolicy {
    /// Builds the policy from the crawler section of the configuration
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_consecutive_failures: config.max_consecutive_failures,
            factor: config.backoff_factor,
            decay: config.backoff_decay,
            base: Duration::from_millis(config.backoff_base_ms),
            max_multiplier: config.max_backoff_multiplier,
        }
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_consecutive_failures: 3,
            factor: 2.0,
            decay: 0.9,
            base: Duration::from_secs(10),
            max_multiplier: 64.0,
        }
    }
}

/// Multiplies `base` by `factor`, saturating instead of overflowing
///
/// # Examples
///
/// ```
/// use job_harvest::state::scale_duration;
/// use std::time::Duration;
///
/// assert_eq!(scale_duration(Duration::from_secs(2), 1.5), Duration::from_secs(3));
/// assert_eq!(scale_duration(Duration::from_secs(1), f64::MAX), Duration::MAX);
/// ```
pub fn scale_duration(base: Duration, factor: f64) -> Duration {
    if factor.is_nan() || factor <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(base.as_secs_f64() * factor).unwrap_or(Duration::MAX)
}

/// What the controller must do after a failure has been recorded
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FailureVerdict {
    /// Sleep for the given duration, then keep going
    Backoff(Duration),

    /// The streak hit the threshold; the run is over
    Blocked,
}

/// Run-wide crawl state
///
/// Owned by the coordinator alone. Failures in one target's pages carry over
/// into the pacing of the next target.
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlState {
    consecutive_failures: u32,
    backoff_multiplier: f64,
    blocked: bool,
}

impl CrawlState {
    /// Creates the initial state: no failures, multiplier 1.0, not blocked
    pub fn new() -> Self {
        Self {
            consecutive_failures: 0,
            backoff_multiplier: 1.0,
            blocked: false,
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn backoff_multiplier(&self) -> f64 {
        self.backoff_multiplier
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    /// Records a page-level or navigation failure
    ///
    /// Grows the multiplier and either asks for a backoff sleep or, once the
    /// streak reaches the policy threshold, moves to the terminal blocked
    /// state.
    pub fn record_failure(&mut self, policy: &BackoffPolicy) -> FailureVerdict {
        if self.blocked {
            return FailureVerdict::Blocked;
        }

        self.consecutive_failures += 1;
        let ceiling = policy.max_multiplier.max(1.0);
        self.backoff_multiplier = (self.backoff_multiplier * policy.factor.max(1.0)).min(ceiling);

        if self.consecutive_failures >= policy.max_consecutive_failures {
            self.blocked = true;
            return FailureVerdict::Blocked;
        }

        FailureVerdict::Backoff(self.scale(policy.base))
    }

    /// Records a successful navigation or extraction
    ///
    /// Clears the streak and decays the multiplier toward 1.0 rather than
    /// resetting it, so recovery from a bad patch stays gradual.
    pub fn record_success(&mut self, policy: &BackoffPolicy) {
        self.consecutive_failures = 0;
        self.backoff_multiplier = (self.backoff_multiplier * policy.decay).max(1.0);
    }

    /// Enters the terminal blocked state directly
    pub fn mark_blocked(&mut self) {
        self.blocked = true;
    }

    /// Scales a pacing duration by the current multiplier
    pub fn scale(&self, base: Duration) -> Duration {
        scale_duration(base, self.backoff_multiplier)
    }
}

impl Default for CrawlState {
    fn default() -> Self {
        Self::new()
    }
}
