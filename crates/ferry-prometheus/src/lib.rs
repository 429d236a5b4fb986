//! Prometheus metrics backend for ferry runs.
//!
//! [`PrometheusMetrics`] implements [`ferry_core::MetricsBackend`]. A ferry run is a
//! short-lived process, so nothing is served over HTTP; the binary renders the
//! text exposition with [`PrometheusMetrics::encode_text`] and drops it into a
//! node-exporter textfile directory.
//!
//! ## Metrics
//! - `ferry_lifecycles_started_total` - Counter
//! - `ferry_lifecycles_completed_total{outcome}` - Counter
//! - `ferry_lifecycle_duration_seconds{outcome}` - Histogram
//! - `ferry_adapter_errors_total{adapter, error_kind}` - Counter
//! - `ferry_unreconciled_instances_total` - Counter

mod backend;
pub use backend::PrometheusMetrics;

pub use prometheus::{Encoder, Registry, TextEncoder};
