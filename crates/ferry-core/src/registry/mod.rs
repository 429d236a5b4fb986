//! Registration service seam.
//!
//! [`RegistryApi`] is the raw collaborator; [`RegistryAdapter`] adds the bounded
//! registration wait and idempotent removal by label.
mod adapter;
pub use adapter::RegistryAdapter;

mod error;
pub use error::RegistrationError;

use async_trait::async_trait;
use ferry_model::{RegisteredWorker, RegistrationToken, WorkerId, WorkerLabel};

/// Authenticated remote calls against a CI registration service.
#[async_trait]
pub trait RegistryApi: Send + Sync {
    /// Service name used in logs and metrics.
    fn name(&self) -> &'static str;

    /// Fetch a fresh single-use registration token.
    async fn create_registration_token(&self) -> Result<RegistrationToken, RegistrationError>;

    /// Registered workers carrying `label`.
    ///
    /// Implementations may return extra entries; callers filter again by label.
    async fn list_workers(
        &self,
        label: &WorkerLabel,
    ) -> Result<Vec<RegisteredWorker>, RegistrationError>;

    /// Remove one worker registration.
    ///
    /// Returns [`RegistrationError::NotFound`] if the worker is already gone.
    async fn delete_worker(&self, worker: WorkerId) -> Result<(), RegistrationError>;
}
