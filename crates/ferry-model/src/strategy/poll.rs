use serde::{Deserialize, Serialize};

use crate::{
    TimeoutMs,
    error::{ModelError, ModelResult},
};

use super::BackoffStrategy;

/// Describes one bounded wait for an eventually-consistent remote state.
///
/// Every poll is bounded by `timeout_ms`; there is no "wait forever" value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollStrategy {
    /// Quiet period before the first check.
    #[serde(default)]
    pub initial_delay_ms: u64,
    /// Interval between checks.
    pub backoff: BackoffStrategy,
    /// Overall deadline measured from the start of the wait, initial delay included.
    pub timeout_ms: TimeoutMs,
}

impl PollStrategy {
    /// Wait for an instance to reach its running state: 5s then growing to 15s, 5 minutes total.
    pub fn instance_running() -> Self {
        Self {
            initial_delay_ms: 0,
            backoff: BackoffStrategy {
                jitter: super::JitterStrategy::Equal,
                first_ms: 5_000,
                max_ms: 15_000,
                factor: 1.5,
            },
            timeout_ms: 300_000,
        }
    }

    /// Wait for a runner to register: 30s quiet period, then every 10s, 5 minutes total.
    pub fn worker_registered() -> Self {
        Self {
            initial_delay_ms: 30_000,
            backoff: BackoffStrategy::fixed(10_000),
            timeout_ms: 300_000,
        }
    }

    /// Replace the overall deadline.
    pub fn with_timeout_ms(mut self, timeout_ms: TimeoutMs) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn validate(&self) -> ModelResult<()> {
        if self.timeout_ms == 0 {
            return Err(ModelError::invalid("poll.timeoutMs", "must be > 0"));
        }
        self.backoff.validate()
    }
}
