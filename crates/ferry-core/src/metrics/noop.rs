use crate::metrics::backend::{LifecycleOutcome, MetricsBackend};

/// No-op metrics backend that compiles to nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpMetrics;

impl MetricsBackend for NoOpMetrics {
    #[inline(always)]
    fn record_lifecycle_started(&self) {}

    #[inline(always)]
    fn record_lifecycle_completed(&self, _: LifecycleOutcome, _: u64) {}

    #[inline(always)]
    fn record_adapter_error(&self, _: &str, _: &str) {}

    #[inline(always)]
    fn record_unreconciled_instance(&self) {}
}
