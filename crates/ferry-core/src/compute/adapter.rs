use std::{collections::HashSet, fmt, sync::Arc};

use ferry_model::{InstanceId, InstanceState};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::{
    compute::{ComputeApi, InstanceRequest, ProviderError},
    metrics::MetricsHandle,
    poll::{PollError, PollPolicy, Probe, poll_until},
};

/// Compute operations used by the orchestrator.
#[derive(Clone)]
pub struct ComputeAdapter {
    api: Arc<dyn ComputeApi>,
    metrics: MetricsHandle,
}

impl ComputeAdapter {
    pub fn new(api: Arc<dyn ComputeApi>, metrics: MetricsHandle) -> Self {
        Self { api, metrics }
    }

    /// Create one instance. On error nothing was created.
    #[instrument(level = "debug", skip(self, request), fields(label = %request.label))]
    pub async fn create_instance(
        &self,
        request: InstanceRequest<'_>,
    ) -> Result<InstanceId, ProviderError> {
        let instance = self
            .api
            .create_instance(request)
            .await
            .map_err(|e| self.observe(e))?;
        info!(instance = %instance, label = %request.label, "instance created");
        Ok(instance)
    }

    /// Wait until the provider reports `instance` as running.
    ///
    /// Fails on timeout, on a terminal provider state, or on cancellation.
    /// In every failure case the instance may still exist.
    #[instrument(level = "debug", skip(self, policy, cancel), fields(instance = %instance))]
    pub async fn await_running(
        &self,
        instance: &InstanceId,
        policy: &PollPolicy,
        cancel: &CancellationToken,
    ) -> Result<(), ProviderError> {
        let res = poll_until(policy, cancel, || async {
            match self.api.describe_instance_state(instance).await? {
                InstanceState::Running => Ok::<_, ProviderError>(Probe::Ready(())),
                state if state.is_terminal() => Err(ProviderError::UnexpectedState {
                    instance: instance.clone(),
                    state: state.to_string(),
                }),
                state => {
                    debug!(state = %state, "instance not running yet");
                    Ok(Probe::Pending)
                }
            }
        })
        .await;

        match res {
            Ok(()) => {
                info!(instance = %instance, "instance is up and running");
                Ok(())
            }
            Err(PollError::Check(e)) => Err(self.observe(e)),
            Err(PollError::Timeout { attempts, elapsed }) => {
                Err(self.observe(ProviderError::RunningTimeout {
                    instance: instance.clone(),
                    waited_ms: elapsed.as_millis() as u64,
                    attempts,
                }))
            }
            Err(PollError::Canceled { .. }) => Err(ProviderError::Canceled {
                instance: instance.clone(),
            }),
        }
    }

    /// Terminate `instances` with exactly one batched provider call.
    ///
    /// Ids the provider did not acknowledge are surfaced as [`ProviderError::PartialTermination`].
    #[instrument(level = "debug", skip(self, instances), fields(count = instances.len()))]
    pub async fn terminate(&self, instances: &[InstanceId]) -> Result<(), ProviderError> {
        if instances.is_empty() {
            return Ok(());
        }
        let acknowledged = self
            .api
            .terminate_instances(instances)
            .await
            .map_err(|e| self.observe(e))?;

        let acknowledged: HashSet<&InstanceId> = acknowledged.iter().collect();
        let unacknowledged: Vec<InstanceId> = instances
            .iter()
            .filter(|id| !acknowledged.contains(id))
            .cloned()
            .collect();

        if !unacknowledged.is_empty() {
            return Err(self.observe(ProviderError::PartialTermination { unacknowledged }));
        }
        info!(instances = %DisplayIds(instances), "instances terminated");
        Ok(())
    }

    fn observe(&self, e: ProviderError) -> ProviderError {
        warn!(provider = self.api.name(), error = %e, "compute provider call failed");
        self.metrics.record_adapter_error(self.api.name(), e.kind());
        e
    }
}

impl fmt::Debug for ComputeAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputeAdapter")
            .field("api", &self.api.name())
            .field("metrics", &"<handle>")
            .finish()
    }
}

struct DisplayIds<'a>(&'a [InstanceId]);

impl fmt::Display for DisplayIds<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, id) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            f.write_str(id.as_str())?;
        }
        Ok(())
    }
}
