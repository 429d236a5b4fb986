//! Well-known string keys shared by the adapters.

/// Resource tag key carrying the [`crate::WorkerLabel`] on every created instance.
///
/// Lets an operator trace a stray instance back to the lifecycle that created it.
pub const LABEL_TAG_KEY: &str = "ferry:label";

/// Prefix used for generated worker labels when none is configured.
pub const DEFAULT_LABEL_PREFIX: &str = "ferry";
