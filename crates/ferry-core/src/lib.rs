mod bootstrap;
pub use bootstrap::BootstrapPayload;

pub mod compute;
pub use compute::{ComputeAdapter, ComputeApi, InstanceRequest, ProviderError};

mod error;
pub use error::{LifecycleError, ProvisionError};

mod label;
pub use label::LabelGenerator;

pub mod metrics;
pub use metrics::{LifecycleOutcome, MetricsBackend, MetricsHandle, NoOpMetrics, noop_metrics};

pub mod orchestrator;
pub use orchestrator::{Cleanup, LifecycleFailure, Orchestrator, Stage, StartReport, StopReport};

pub mod poll;
pub use poll::{PollError, PollPolicy, Probe, poll_until};

pub mod registry;
pub use registry::{RegistrationError, RegistryAdapter, RegistryApi};

#[cfg(test)]
mod mock;

pub mod prelude {
    pub use crate::compute::{ComputeApi, ProviderError};
    pub use crate::error::ProvisionError;
    pub use crate::orchestrator::{Orchestrator, StartReport, StopReport};
    pub use crate::registry::{RegistrationError, RegistryApi};
}
