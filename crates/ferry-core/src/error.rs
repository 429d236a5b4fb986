use thiserror::Error;

use ferry_model::ModelError;

use crate::{
    compute::ProviderError,
    orchestrator::{LifecycleFailure, StopReport},
    registry::RegistrationError,
};

/// Why one worker lifecycle failed.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("registration error: {0}")]
    Registration(#[from] RegistrationError),

    #[error("canceled before the worker registered")]
    Canceled,

    #[error("lifecycle task aborted: {0}")]
    Aborted(String),
}

impl LifecycleError {
    /// `true` if the run was canceled rather than a collaborator failing.
    pub fn is_canceled(&self) -> bool {
        matches!(
            self,
            LifecycleError::Canceled
                | LifecycleError::Provider(ProviderError::Canceled { .. })
                | LifecycleError::Registration(RegistrationError::Canceled { .. })
        )
    }
}

/// Run-level failure reported by the orchestrator.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ModelError),

    #[error(
        "{} of {requested} worker lifecycles failed: {}",
        .failures.len(),
        summarize(.failures)
    )]
    Start {
        requested: usize,
        failures: Vec<LifecycleFailure>,
    },

    #[error("stop degraded: {}", .0.summary())]
    Stop(Box<StopReport>),
}

fn summarize(failures: &[LifecycleFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
