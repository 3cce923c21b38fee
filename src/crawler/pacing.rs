//! Randomized pacing between navigations
//!
//! Every pause is drawn from a configured range and stretched by the current
//! backoff multiplier, so a run that has been failing slows down everywhere.

use crate::config::DelayRange;
use crate::state::scale_duration;
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::Instant;

/// Lower and upper bound of the backoff jitter factor
const JITTER: (f64, f64) = (0.8, 1.2);

/// Longest stretch a pause sleeps without checking the stop flag
const STOP_CHECK_INTERVAL: Duration = Duration::from_millis(200);

/// Draws a delay from `range` and scales it by `multiplier`
///
/// # Examples
///
/// ```
/// use job_harvest::config::DelayRange;
/// use job_harvest::crawler::random_delay;
/// use std::time::Duration;
///
/// let delay = random_delay(DelayRange::new(100, 200), 2.0);
/// assert!(delay >= Duration::from_millis(200) && delay <= Duration::from_millis(400));
/// ```
pub fn random_delay(range: DelayRange, multiplier: f64) -> Duration {
    let millis = if range.max_ms > range.min_ms {
        rand::thread_rng().gen_range(range.min_ms..=range.max_ms)
    } else {
        range.min_ms
    };

    scale_duration(Duration::from_millis(millis), multiplier.max(1.0))
}

/// Randomizes a backoff sleep by ±20%
pub fn jittered(base: Duration) -> Duration {
    if base.is_zero() {
        return base;
    }
    let factor = rand::thread_rng().gen_range(JITTER.0..=JITTER.1);
    scale_duration(base, factor)
}

/// Sleeps for `delay`, waking early once `stop` is set
///
/// Zero delays skip the timer entirely. Returns `false` when the pause was
/// cut short by a stop request.
pub async fn pause(delay: Duration, stop: &AtomicBool) -> bool {
    if delay.is_zero() {
        return !stop.load(Ordering::SeqCst);
    }
    tracing::debug!("Pausing {:.1}s", delay.as_secs_f64());

    let deadline = Instant::now().checked_add(delay);
    loop {
        if stop.load(Ordering::SeqCst) {
            tracing::debug!("Pause cut short by stop request");
            return false;
        }

        let remaining = match deadline {
            Some(deadline) => deadline.saturating_duration_since(Instant::now()),
            None => STOP_CHECK_INTERVAL,
        };
        if remaining.is_zero() {
            return true;
        }
        tokio::time::sleep(remaining.min(STOP_CHECK_INTERVAL)).await;
    }
}
