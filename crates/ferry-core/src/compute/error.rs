use thiserror::Error;

use ferry_model::InstanceId;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{op} rejected by provider: {message}")]
    Api {
        op: &'static str,
        code: Option<String>,
        message: String,
    },

    #[error("provider did not return an instance id")]
    MissingInstanceId,

    #[error("instance {instance} not running after {waited_ms}ms ({attempts} checks)")]
    RunningTimeout {
        instance: InstanceId,
        waited_ms: u64,
        attempts: u32,
    },

    #[error("instance {instance} entered state '{state}' while waiting for it to run")]
    UnexpectedState { instance: InstanceId, state: String },

    #[error("termination not acknowledged for: {}", join_ids(.unacknowledged))]
    PartialTermination { unacknowledged: Vec<InstanceId> },

    #[error("wait for instance {instance} canceled")]
    Canceled { instance: InstanceId },
}

impl ProviderError {
    /// Convenience constructor for a rejected remote call.
    pub fn api(op: &'static str, message: impl Into<String>) -> Self {
        Self::Api {
            op,
            code: None,
            message: message.into(),
        }
    }

    /// Bounded error category for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::Api { .. } => "api",
            ProviderError::MissingInstanceId => "missing_instance_id",
            ProviderError::RunningTimeout { .. } => "running_timeout",
            ProviderError::UnexpectedState { .. } => "unexpected_state",
            ProviderError::PartialTermination { .. } => "partial_termination",
            ProviderError::Canceled { .. } => "canceled",
        }
    }
}

fn join_ids(ids: &[InstanceId]) -> String {
    ids.iter()
        .map(InstanceId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_termination_lists_every_id() {
        let err = ProviderError::PartialTermination {
            unacknowledged: vec!["i-1".into(), "i-2".into()],
        };
        assert_eq!(err.to_string(), "termination not acknowledged for: i-1, i-2");
        assert_eq!(err.kind(), "partial_termination");
    }
}
