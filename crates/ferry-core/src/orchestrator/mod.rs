//! Provisioning orchestrator.
//!
//! - `start`: one concurrent lifecycle per requested worker, joined before returning.
//! - `stop`: batched termination and deregistration, run side by side.
mod lifecycle;

mod report;
pub use report::{Cleanup, LifecycleFailure, Stage, StartReport, StopReport};

use std::sync::Arc;

use ferry_model::{StartSpec, StopSpec};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::{
    compute::{ComputeAdapter, ComputeApi},
    error::{LifecycleError, ProvisionError},
    label::LabelGenerator,
    metrics::{MetricsHandle, noop_metrics},
    poll::PollPolicy,
    registry::{RegistryAdapter, RegistryApi},
};

use lifecycle::{CreatedSlot, Lifecycle, reclaim};

/// Drives workers through create, run, register (start) and terminate, deregister (stop).
///
/// Owns no global state: adapters, label generator and metrics are injected at construction.
pub struct Orchestrator {
    compute: ComputeAdapter,
    registry: RegistryAdapter,
    labels: Arc<LabelGenerator>,
    metrics: MetricsHandle,
}

impl Orchestrator {
    /// Create an orchestrator with a no-op metrics backend.
    pub fn new(
        compute: Arc<dyn ComputeApi>,
        registry: Arc<dyn RegistryApi>,
        labels: LabelGenerator,
    ) -> Self {
        Self::with_metrics(compute, registry, labels, noop_metrics())
    }

    /// Create an orchestrator reporting to `metrics`.
    pub fn with_metrics(
        compute: Arc<dyn ComputeApi>,
        registry: Arc<dyn RegistryApi>,
        labels: LabelGenerator,
        metrics: MetricsHandle,
    ) -> Self {
        Self {
            compute: ComputeAdapter::new(compute, Arc::clone(&metrics)),
            registry: RegistryAdapter::new(registry, Arc::clone(&metrics)),
            labels: Arc::new(labels),
            metrics,
        }
    }

    /// Provision `spec.count` workers concurrently.
    ///
    /// Returns `Err` only for invalid input, before any remote call. Lifecycle failures
    /// are collected in the returned [`StartReport`]; every lifecycle has settled by
    /// the time this returns.
    #[instrument(level = "info", skip_all, fields(count = spec.count))]
    pub async fn start(
        &self,
        spec: &StartSpec,
        cancel: &CancellationToken,
    ) -> Result<StartReport, ProvisionError> {
        spec.validate()?;

        let spec = Arc::new(spec.clone());
        let running = Arc::new(PollPolicy::from(&spec.running_poll));
        let registered = Arc::new(PollPolicy::from(&spec.registered_poll));

        let mut handles = Vec::with_capacity(spec.count);
        for index in 0..spec.count {
            let lifecycle = Lifecycle {
                index,
                label: self.labels.generate(),
                spec: Arc::clone(&spec),
                running: Arc::clone(&running),
                registered: Arc::clone(&registered),
                compute: self.compute.clone(),
                registry: self.registry.clone(),
                metrics: Arc::clone(&self.metrics),
                cancel: cancel.child_token(),
                created: CreatedSlot::default(),
            };
            let label = lifecycle.label.clone();
            let created = lifecycle.created.clone();
            handles.push((index, label, created, tokio::spawn(lifecycle.run())));
        }

        let mut report = StartReport::new(spec.count);
        for (index, label, created, handle) in handles {
            match handle.await {
                Ok(Ok(instance)) => report.record_success(label, instance),
                Ok(Err(failure)) => report.record_failure(failure),
                Err(join) => {
                    error!(worker = index, label = %label, error = %join, "lifecycle task aborted");
                    let instance = created.take();
                    let cleanup = match &instance {
                        Some(instance) => {
                            warn!(instance = %instance, label = %label, "terminating instance of aborted lifecycle");
                            reclaim(&self.compute, &self.metrics, &label, instance).await
                        }
                        None => Cleanup::NotNeeded,
                    };
                    report.record_failure(LifecycleFailure {
                        index,
                        label,
                        stage: Stage::Task,
                        instance,
                        cause: LifecycleError::Aborted(join.to_string()),
                        cleanup,
                    });
                }
            }
        }

        if report.is_success() {
            info!(provisioned = report.provisioned().len(), "all workers registered");
        } else {
            warn!(
                provisioned = report.provisioned().len(),
                failed = report.failures().len(),
                "some workers failed to provision",
            );
        }
        Ok(report)
    }

    /// Terminate `spec.instance_ids` in one batched call and deregister `spec.labels`.
    ///
    /// Both steps always run; neither waits on the other's outcome.
    #[instrument(level = "info", skip_all, fields(instances = spec.instance_ids.len(), labels = spec.labels.len()))]
    pub async fn stop(&self, spec: &StopSpec) -> Result<StopReport, ProvisionError> {
        spec.validate()?;

        let terminate = self.compute.terminate(&spec.instance_ids);
        let deregister = async {
            let mut out = Vec::with_capacity(spec.labels.len());
            for label in &spec.labels {
                out.push((label.clone(), self.registry.remove_worker(label).await));
            }
            out
        };
        if spec.labels.is_empty() {
            warn!("no worker labels given; skipping deregistration");
        }

        let (termination, deregistration) = tokio::join!(terminate, deregister);
        let report = StopReport {
            instance_ids: spec.instance_ids.clone(),
            termination,
            deregistration,
        };

        if report.is_success() {
            info!("instances terminated and workers deregistered");
        } else {
            warn!(summary = %report.summary(), "stop finished degraded");
        }
        Ok(report)
    }
}
