use std::time::Duration;

use ferry_model::{JitterStrategy, PollStrategy};
use rand::Rng;

/// Runtime form of a [`PollStrategy`].
#[derive(Clone, Debug, PartialEq)]
pub struct PollPolicy {
    pub initial_delay: Duration,
    pub first: Duration,
    pub max: Duration,
    pub factor: f64,
    pub jitter: JitterStrategy,
    pub timeout: Duration,
}

impl PollPolicy {
    /// Fixed interval, no initial delay, no jitter.
    pub fn fixed(interval: Duration, timeout: Duration) -> Self {
        Self {
            initial_delay: Duration::ZERO,
            first: interval,
            max: interval,
            factor: 1.0,
            jitter: JitterStrategy::None,
            timeout,
        }
    }

    /// Interval to wait after the `attempt`-th check (zero-based), before jitter.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exp = self.factor.powi(attempt.min(i32::MAX as u32) as i32);
        let secs = self.first.as_secs_f64() * exp;
        if !secs.is_finite() || secs >= self.max.as_secs_f64() {
            return self.max;
        }
        Duration::from_secs_f64(secs).max(self.first)
    }

    /// Interval to wait after the `attempt`-th check with jitter applied.
    pub fn delay(&self, attempt: u32) -> Duration {
        let base = self.base_delay(attempt);
        let ms = base.as_millis() as u64;
        if ms == 0 {
            return base;
        }
        match self.jitter {
            JitterStrategy::None => base,
            JitterStrategy::Full => Duration::from_millis(rand::thread_rng().gen_range(0..=ms)),
            JitterStrategy::Equal => {
                Duration::from_millis(rand::thread_rng().gen_range(ms / 2..=ms))
            }
        }
    }
}

impl From<&PollStrategy> for PollPolicy {
    fn from(s: &PollStrategy) -> Self {
        Self {
            initial_delay: Duration::from_millis(s.initial_delay_ms),
            first: Duration::from_millis(s.backoff.first_ms),
            max: Duration::from_millis(s.backoff.max_ms),
            factor: s.backoff.factor,
            jitter: s.backoff.jitter,
            timeout: Duration::from_millis(s.timeout_ms),
        }
    }
}
