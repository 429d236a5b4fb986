use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Interval growth between consecutive polls.
///
/// The n-th interval is `first_ms * factor^n`, capped at `max_ms`.
/// `factor = 1.0` gives a fixed interval.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackoffStrategy {
    pub jitter: super::JitterStrategy,
    pub first_ms: u64,
    pub max_ms: u64,
    pub factor: f64,
}

impl BackoffStrategy {
    /// Fixed interval without jitter.
    pub fn fixed(interval_ms: u64) -> Self {
        Self {
            jitter: super::JitterStrategy::None,
            first_ms: interval_ms,
            max_ms: interval_ms,
            factor: 1.0,
        }
    }

    pub fn validate(&self) -> ModelResult<()> {
        if self.first_ms == 0 {
            return Err(ModelError::invalid("backoff.firstMs", "must be > 0"));
        }
        if self.max_ms < self.first_ms {
            return Err(ModelError::invalid(
                "backoff.maxMs",
                format!("{} is less than firstMs {}", self.max_ms, self.first_ms),
            ));
        }
        if !self.factor.is_finite() || self.factor < 1.0 {
            return Err(ModelError::invalid(
                "backoff.factor",
                format!("{} must be a finite number >= 1.0", self.factor),
            ));
        }
        Ok(())
    }
}
