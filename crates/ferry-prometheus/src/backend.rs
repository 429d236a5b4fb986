use std::sync::Arc;

use prometheus::{
    CounterVec, Encoder, HistogramOpts, HistogramVec, IntCounter, Opts, Registry, TextEncoder,
    proto::MetricFamily,
};

use ferry_core::{LifecycleOutcome, MetricsBackend};

const NAMESPACE: &str = "ferry";

/// Prometheus-backed [`MetricsBackend`].
///
/// All labels are bounded:
/// - `outcome`: "registered", "failed", "canceled"
/// - `adapter`: "ec2", "github"
/// - `error_kind`: the adapter error category ("api", "running_timeout", ...)
#[derive(Clone)]
pub struct PrometheusMetrics {
    lifecycles_started: IntCounter,
    lifecycles_completed: CounterVec,
    lifecycle_duration: HistogramVec,
    adapter_errors: CounterVec,
    unreconciled: IntCounter,
    registry: Arc<Registry>,
}

impl PrometheusMetrics {
    pub fn new_with_registry(registry: Arc<Registry>) -> Result<Self, prometheus::Error> {
        let lifecycles_started = IntCounter::with_opts(
            Opts::new("lifecycles_started_total", "Worker start lifecycles begun")
                .namespace(NAMESPACE),
        )?;
        registry.register(Box::new(lifecycles_started.clone()))?;

        let lifecycles_completed = CounterVec::new(
            Opts::new("lifecycles_completed_total", "Worker start lifecycles finished")
                .namespace(NAMESPACE),
            &["outcome"],
        )?;
        registry.register(Box::new(lifecycles_completed.clone()))?;

        // boot plus agent registration takes minutes, not milliseconds
        let lifecycle_duration = HistogramVec::new(
            HistogramOpts::new(
                "lifecycle_duration_seconds",
                "Time from lifecycle start to outcome",
            )
            .namespace(NAMESPACE)
            .buckets(vec![5.0, 15.0, 30.0, 60.0, 90.0, 120.0, 180.0, 300.0, 600.0]),
            &["outcome"],
        )?;
        registry.register(Box::new(lifecycle_duration.clone()))?;

        let adapter_errors = CounterVec::new(
            Opts::new("adapter_errors_total", "Failed collaborator calls").namespace(NAMESPACE),
            &["adapter", "error_kind"],
        )?;
        registry.register(Box::new(adapter_errors.clone()))?;

        let unreconciled = IntCounter::with_opts(
            Opts::new(
                "unreconciled_instances_total",
                "Instances whose compensating termination could not be confirmed",
            )
            .namespace(NAMESPACE),
        )?;
        registry.register(Box::new(unreconciled.clone()))?;

        Ok(Self {
            lifecycles_started,
            lifecycles_completed,
            lifecycle_duration,
            adapter_errors,
            unreconciled,
            registry,
        })
    }

    pub fn new() -> Result<Self, prometheus::Error> {
        Self::new_with_registry(Arc::new(Registry::new()))
    }

    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Render every registered metric in the text exposition format.
    pub fn encode_text(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl MetricsBackend for PrometheusMetrics {
    fn record_lifecycle_started(&self) {
        self.lifecycles_started.inc();
    }

    fn record_lifecycle_completed(&self, outcome: LifecycleOutcome, duration_ms: u64) {
        self.lifecycles_completed
            .with_label_values(&[outcome.as_label()])
            .inc();
        self.lifecycle_duration
            .with_label_values(&[outcome.as_label()])
            .observe(duration_ms as f64 / 1000.0);
    }

    fn record_adapter_error(&self, adapter: &str, error_kind: &str) {
        self.adapter_errors
            .with_label_values(&[adapter, error_kind])
            .inc();
    }

    fn record_unreconciled_instance(&self) {
        self.unreconciled.inc();
    }
}
