use std::{fmt, sync::Arc};

use ferry_model::{RegisteredWorker, RegistrationToken, WorkerLabel};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::{
    metrics::MetricsHandle,
    poll::{PollError, PollPolicy, Probe, poll_until},
    registry::{RegistrationError, RegistryApi},
};

/// Registration operations used by the orchestrator.
#[derive(Clone)]
pub struct RegistryAdapter {
    api: Arc<dyn RegistryApi>,
    metrics: MetricsHandle,
}

impl RegistryAdapter {
    pub fn new(api: Arc<dyn RegistryApi>, metrics: MetricsHandle) -> Self {
        Self { api, metrics }
    }

    pub async fn get_registration_token(&self) -> Result<RegistrationToken, RegistrationError> {
        let token = self
            .api
            .create_registration_token()
            .await
            .map_err(|e| self.observe(e))?;
        debug!(expires_at = ?token.expires_at(), "registration token issued");
        Ok(token)
    }

    /// Wait until a worker tagged with `label` reports itself online.
    #[instrument(level = "debug", skip(self, policy, cancel), fields(label = %label))]
    pub async fn await_worker_registered(
        &self,
        label: &WorkerLabel,
        policy: &PollPolicy,
        cancel: &CancellationToken,
    ) -> Result<RegisteredWorker, RegistrationError> {
        let res = poll_until(policy, cancel, || async {
            let workers = self.api.list_workers(label).await?;
            match workers
                .into_iter()
                .find(|w| w.has_label(label.as_str()) && w.is_ready())
            {
                Some(worker) => Ok::<_, RegistrationError>(Probe::Ready(worker)),
                None => {
                    debug!("worker not registered yet");
                    Ok(Probe::Pending)
                }
            }
        })
        .await;

        match res {
            Ok(worker) => {
                info!(label = %label, worker = %worker.name, "worker is registered");
                Ok(worker)
            }
            Err(PollError::Check(e)) => Err(self.observe(e)),
            Err(PollError::Timeout { attempts, elapsed }) => {
                Err(self.observe(RegistrationError::RegistrationTimeout {
                    label: label.clone(),
                    waited_ms: elapsed.as_millis() as u64,
                    attempts,
                }))
            }
            Err(PollError::Canceled { .. }) => Err(RegistrationError::Canceled {
                label: label.clone(),
            }),
        }
    }

    /// Deregister every worker carrying `label`.
    ///
    /// Idempotent: workers that are already gone count as removed.
    /// Returns the number of registrations actually deleted.
    #[instrument(level = "debug", skip(self), fields(label = %label))]
    pub async fn remove_worker(&self, label: &WorkerLabel) -> Result<usize, RegistrationError> {
        let workers = self
            .api
            .list_workers(label)
            .await
            .map_err(|e| self.observe(e))?;

        let mut removed = 0;
        for worker in workers.iter().filter(|w| w.has_label(label.as_str())) {
            match self.api.delete_worker(worker.id).await {
                Ok(()) => removed += 1,
                Err(RegistrationError::NotFound { .. }) => {
                    debug!(worker = %worker.name, "worker already removed");
                }
                Err(e) => return Err(self.observe(e)),
            }
        }

        if removed == 0 {
            info!(label = %label, "no registered worker left for label");
        } else {
            info!(label = %label, removed, "worker registration removed");
        }
        Ok(removed)
    }

    fn observe(&self, e: RegistrationError) -> RegistrationError {
        warn!(service = self.api.name(), error = %e, "registration service call failed");
        self.metrics.record_adapter_error(self.api.name(), e.kind());
        e
    }
}

impl fmt::Debug for RegistryAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryAdapter")
            .field("api", &self.api.name())
            .field("metrics", &"<handle>")
            .finish()
    }
}
