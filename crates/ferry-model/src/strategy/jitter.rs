use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{ModelError, ModelResult};

/// Controls how random jitter is applied to poll intervals.
///
/// Many lifecycles start at the same moment and poll the same two services;
/// jitter spreads their requests so they do not hit the APIs in lockstep.
///
/// Strategies:
/// - `None`: No jitter. Intervals are deterministic.
/// - `Full`: Delay is uniformly sampled from `[0, base]`.
/// - `Equal`: Delay is sampled from `[base/2, base]`.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JitterStrategy {
    #[default]
    None,
    Full,
    Equal,
}

impl FromStr for JitterStrategy {
    type Err = ModelError;
    fn from_str(s: &str) -> ModelResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(JitterStrategy::None),
            "full" => Ok(JitterStrategy::Full),
            "equal" => Ok(JitterStrategy::Equal),
            other => Err(ModelError::UnknownJitter(other.to_string())),
        }
    }
}
