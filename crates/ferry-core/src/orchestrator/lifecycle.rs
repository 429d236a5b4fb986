use std::sync::{Arc, Mutex, PoisonError};

use ferry_model::{InstanceId, LABEL_TAG_KEY, StartSpec, Tags, WorkerLabel};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    BootstrapPayload,
    compute::{ComputeAdapter, InstanceRequest},
    error::LifecycleError,
    metrics::{LifecycleOutcome, MetricsHandle},
    orchestrator::{Cleanup, LifecycleFailure, Stage},
    poll::PollPolicy,
    registry::RegistryAdapter,
};

/// Instance id of a lifecycle that still owns a live instance.
///
/// Set right after creation and cleared once compensation has run, so the
/// orchestrator can reclaim the instance if the lifecycle task dies in between.
#[derive(Clone, Debug, Default)]
pub(crate) struct CreatedSlot(Arc<Mutex<Option<InstanceId>>>);

impl CreatedSlot {
    fn set(&self, instance: &InstanceId) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = Some(instance.clone());
    }

    fn clear(&self) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).take();
    }

    pub(crate) fn take(&self) -> Option<InstanceId> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}

/// One worker's start lifecycle: `Created -> ComputeRunning -> Registered`.
///
/// Any failure after the instance exists goes through [`Lifecycle::compensate`]
/// before it is reported.
pub(crate) struct Lifecycle {
    pub(crate) index: usize,
    pub(crate) label: WorkerLabel,
    pub(crate) spec: Arc<StartSpec>,
    pub(crate) running: Arc<PollPolicy>,
    pub(crate) registered: Arc<PollPolicy>,
    pub(crate) compute: ComputeAdapter,
    pub(crate) registry: RegistryAdapter,
    pub(crate) metrics: MetricsHandle,
    pub(crate) cancel: CancellationToken,
    pub(crate) created: CreatedSlot,
}

impl Lifecycle {
    #[instrument(name = "lifecycle", level = "info", skip(self), fields(worker = self.index, label = %self.label))]
    pub(crate) async fn run(self) -> Result<InstanceId, LifecycleFailure> {
        let started = Instant::now();
        self.metrics.record_lifecycle_started();

        let res = self.converge().await;

        let outcome = match &res {
            Ok(_) => LifecycleOutcome::Registered,
            Err(f) if f.cause.is_canceled() => LifecycleOutcome::Canceled,
            Err(_) => LifecycleOutcome::Failed,
        };
        self.metrics
            .record_lifecycle_completed(outcome, started.elapsed().as_millis() as u64);
        res
    }

    async fn converge(&self) -> Result<InstanceId, LifecycleFailure> {
        if self.cancel.is_cancelled() {
            return Err(self.fail(Stage::Token, LifecycleError::Canceled));
        }
        let token = self
            .registry
            .get_registration_token()
            .await
            .map_err(|e| self.fail(Stage::Token, e.into()))?;

        let payload = BootstrapPayload::render(&self.spec.bootstrap, &token, &self.label);
        drop(token);

        let mut own = Tags::new();
        own.insert(LABEL_TAG_KEY, self.label.as_str());
        let tags = self.spec.tags.merged(&own);

        // last checkpoint where cancellation leaves nothing behind
        if self.cancel.is_cancelled() {
            return Err(self.fail(Stage::Create, LifecycleError::Canceled));
        }
        let instance = self
            .compute
            .create_instance(InstanceRequest {
                label: &self.label,
                payload: &payload,
                sizing: &self.spec.sizing,
                placement: &self.spec.placement,
                tags: &tags,
            })
            .await
            .map_err(|e| self.fail(Stage::Create, e.into()))?;
        self.created.set(&instance);
        debug!(instance = %instance, state = "created", "lifecycle advanced");

        if let Err(e) = self
            .compute
            .await_running(&instance, &self.running, &self.cancel)
            .await
        {
            return Err(self.compensate(Stage::AwaitRunning, instance, e.into()).await);
        }
        debug!(instance = %instance, state = "compute-running", "lifecycle advanced");

        if let Err(e) = self
            .registry
            .await_worker_registered(&self.label, &self.registered, &self.cancel)
            .await
        {
            return Err(self.compensate(Stage::AwaitRegistered, instance, e.into()).await);
        }
        info!(instance = %instance, state = "registered", "worker ready for jobs");
        Ok(instance)
    }

    /// Failure before any instance exists: nothing to clean up.
    fn fail(&self, stage: Stage, cause: LifecycleError) -> LifecycleFailure {
        warn!(stage = %stage, error = %cause, "lifecycle failed");
        LifecycleFailure {
            index: self.index,
            label: self.label.clone(),
            stage,
            instance: None,
            cause,
            cleanup: Cleanup::NotNeeded,
        }
    }

    /// Failure with a live instance: terminate it before reporting.
    async fn compensate(
        &self,
        stage: Stage,
        instance: InstanceId,
        cause: LifecycleError,
    ) -> LifecycleFailure {
        warn!(stage = %stage, instance = %instance, error = %cause, "lifecycle failed; terminating instance");

        let cleanup = reclaim(&self.compute, &self.metrics, &self.label, &instance).await;
        self.created.clear();

        LifecycleFailure {
            index: self.index,
            label: self.label.clone(),
            stage,
            instance: Some(instance),
            cause,
            cleanup,
        }
    }
}

/// Terminate an instance whose lifecycle failed, reporting whether that was confirmed.
pub(crate) async fn reclaim(
    compute: &ComputeAdapter,
    metrics: &MetricsHandle,
    label: &WorkerLabel,
    instance: &InstanceId,
) -> Cleanup {
    match compute.terminate(std::slice::from_ref(instance)).await {
        Ok(()) => Cleanup::Terminated,
        Err(e) => {
            error!(
                instance = %instance,
                label = %label,
                error = %e,
                "unreconciled instance: compensating termination failed, manual cleanup required",
            );
            metrics.record_unreconciled_instance();
            Cleanup::Unreconciled(e)
        }
    }
}
