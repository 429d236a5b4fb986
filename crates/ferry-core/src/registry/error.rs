use thiserror::Error;

use ferry_model::WorkerLabel;

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("{op}: unauthorized: {message}")]
    Unauthorized { op: &'static str, message: String },

    #[error("{op}: rate limited: {message}")]
    RateLimited { op: &'static str, message: String },

    #[error("{op}: not found")]
    NotFound { op: &'static str },

    #[error("{op}: service returned {status}: {message}")]
    Api {
        op: &'static str,
        status: u16,
        message: String,
    },

    #[error("{op}: service unavailable: {message}")]
    Unavailable { op: &'static str, message: String },

    #[error("{op}: malformed response: {message}")]
    Decode { op: &'static str, message: String },

    #[error("worker {label} not registered after {waited_ms}ms ({attempts} checks)")]
    RegistrationTimeout {
        label: WorkerLabel,
        waited_ms: u64,
        attempts: u32,
    },

    #[error("wait for worker {label} canceled")]
    Canceled { label: WorkerLabel },
}

impl RegistrationError {
    /// Bounded error category for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            RegistrationError::Unauthorized { .. } => "unauthorized",
            RegistrationError::RateLimited { .. } => "rate_limited",
            RegistrationError::NotFound { .. } => "not_found",
            RegistrationError::Api { .. } => "api",
            RegistrationError::Unavailable { .. } => "unavailable",
            RegistrationError::Decode { .. } => "decode",
            RegistrationError::RegistrationTimeout { .. } => "registration_timeout",
            RegistrationError::Canceled { .. } => "canceled",
        }
    }
}
