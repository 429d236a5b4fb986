use std::sync::Arc;

/// How a single worker lifecycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleOutcome {
    /// Worker registered and ready for jobs.
    Registered,
    /// Lifecycle failed; any created instance was handed to compensating termination.
    Failed,
    /// Run was canceled before the worker registered.
    Canceled,
}

impl LifecycleOutcome {
    /// Return label value for metrics.
    #[inline]
    pub fn as_label(&self) -> &'static str {
        match self {
            LifecycleOutcome::Registered => "registered",
            LifecycleOutcome::Failed => "failed",
            LifecycleOutcome::Canceled => "canceled",
        }
    }
}

/// Backend metrics collection interface.
pub trait MetricsBackend: Send + Sync + 'static {
    /// Record that a start lifecycle began.
    fn record_lifecycle_started(&self);
    /// Record lifecycle completion with outcome and duration.
    ///
    /// # Arguments
    /// - `outcome`: How the lifecycle ended
    /// - `duration_ms`: Wall time from lifecycle start to outcome
    fn record_lifecycle_completed(&self, outcome: LifecycleOutcome, duration_ms: u64);
    /// Record a collaborator call failure.
    ///
    /// # Arguments
    /// - `adapter`: Collaborator name (`ec2`, `github`, ...)
    /// - `error_kind`: Bounded error category
    fn record_adapter_error(&self, adapter: &str, error_kind: &str);
    /// Record an instance whose compensating termination could not be confirmed.
    ///
    /// Every increment means a possibly running, billable instance that needs an operator.
    fn record_unreconciled_instance(&self);
}

/// Shared handle to metrics backend.
pub type MetricsHandle = Arc<dyn MetricsBackend>;
