//! Exponential backoff with jitter for rate-limited requests

use rand::Rng;
use std::time::Duration;

pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 1.5;

/// Upper bound of the jitter as a fraction of the current backoff
const JITTER_FRACTION: f64 = 0.1;

/// Pure backoff calculator; callers own the counters via [`RetryState`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            multiplier: DEFAULT_BACKOFF_MULTIPLIER,
        }
    }
}

impl RetryPolicy {
    pub fn new(multiplier: f64) -> Self {
        Self { multiplier }
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Returns `(delay, next_backoff)` where
    /// `delay = backoff + uniform(0, 0.1 * backoff)` and
    /// `next_backoff = backoff * multiplier`.
    pub fn next_delay(&self, backoff: Duration) -> (Duration, Duration) {
        self.next_delay_with(backoff, &mut rand::thread_rng())
    }

    /// Same as [`next_delay`](Self::next_delay) with a caller-supplied RNG
    pub fn next_delay_with<R: Rng + ?Sized>(&self, backoff: Duration, rng: &mut R) -> (Duration, Duration) {
        let base = backoff.as_secs_f64();
        let jitter = if base > 0.0 {
            rng.gen_range(0.0..=JITTER_FRACTION * base)
        } else {
            0.0
        };

        let delay = Duration::from_secs_f64(base + jitter);
        let next_backoff = backoff.mul_f64(self.multiplier);
        (delay, next_backoff)
    }

    pub fn should_retry(&self, retries_remaining: u32) -> bool {
        retries_remaining > 0
    }
}

/// Per-fetch retry bookkeeping; never shared between dates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryState {
    pub backoff: Duration,
    pub retries_remaining: u32,
}

impl RetryState {
    pub fn new(initial_backoff: Duration, max_retries: u32) -> Self {
        Self {
            backoff: initial_backoff,
            retries_remaining: max_retries,
        }
    }

    /// Consume one retry and return how long to wait, or `None` once the
    /// budget is spent.
    pub fn advance(&mut self, policy: &RetryPolicy) -> Option<Duration> {
        if !policy.should_retry(self.retries_remaining) {
            return None;
        }

        let (delay, next_backoff) = policy.next_delay(self.backoff);
        self.backoff = next_backoff;
        self.retries_remaining -= 1;
        Some(delay)
    }
}
