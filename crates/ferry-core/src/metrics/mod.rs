//! Metrics collection abstraction for provisioning runs.
//!
//! Backends (prometheus, statsd, etc) implement [`MetricsBackend`] and are handed to the
//! [`crate::Orchestrator`], which shares them with both adapters.
mod backend;
pub use backend::{LifecycleOutcome, MetricsBackend, MetricsHandle};

mod noop;
pub use noop::NoOpMetrics;

use std::sync::Arc;

/// Create a no-op metrics handle.
#[inline]
pub fn noop_metrics() -> MetricsHandle {
    Arc::new(NoOpMetrics)
}
