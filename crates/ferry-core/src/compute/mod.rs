//! Compute provider seam.
//!
//! [`ComputeApi`] is the raw collaborator (one method per remote call);
//! [`ComputeAdapter`] layers the bounded running-state wait and batch
//! acknowledgement checks on top of it.
mod adapter;
pub use adapter::ComputeAdapter;

mod error;
pub use error::ProviderError;

use async_trait::async_trait;
use ferry_model::{
    InstanceId, InstanceSizing, InstanceState, NetworkPlacement, Tags, WorkerLabel,
};

use crate::BootstrapPayload;

/// Everything the provider needs to create one worker instance.
#[derive(Debug, Clone, Copy)]
pub struct InstanceRequest<'a> {
    pub label: &'a WorkerLabel,
    pub payload: &'a BootstrapPayload,
    pub sizing: &'a InstanceSizing,
    pub placement: &'a NetworkPlacement,
    pub tags: &'a Tags,
}

/// Authenticated remote calls against a compute provider.
#[async_trait]
pub trait ComputeApi: Send + Sync {
    /// Provider name used in logs and metrics.
    fn name(&self) -> &'static str;

    /// Launch exactly one instance running `request.payload` at first boot.
    async fn create_instance(&self, request: InstanceRequest<'_>) -> Result<InstanceId, ProviderError>;

    /// Current provider-side state of one instance.
    async fn describe_instance_state(
        &self,
        instance: &InstanceId,
    ) -> Result<InstanceState, ProviderError>;

    /// Request termination of all `instances` in one call.
    ///
    /// Returns the ids the provider acknowledged.
    async fn terminate_instances(
        &self,
        instances: &[InstanceId],
    ) -> Result<Vec<InstanceId>, ProviderError>;
}
