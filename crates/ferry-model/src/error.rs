use thiserror::Error;

/// Configuration problems detected before any remote call is made.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown mode: {0} (expected: start|stop)")]
    UnknownMode(String),

    #[error("unknown jitter strategy: {0}")]
    UnknownJitter(String),

    #[error("missing required input: {0}")]
    Missing(&'static str),

    #[error("invalid input '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ModelError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

pub type ModelResult<T> = Result<T, ModelError>;
