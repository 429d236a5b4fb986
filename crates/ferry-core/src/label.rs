use std::sync::atomic::{AtomicU64, Ordering};

use ferry_model::{DEFAULT_LABEL_PREFIX, WorkerLabel};
use uuid::Uuid;

/// Source of unique [`WorkerLabel`]s for one process run.
///
/// Format: `{prefix}-{rand}-{seq:x}`.
/// - `prefix`: configured label prefix
/// - `rand`  : 8 hex chars of a v4 UUID, keeps labels distinct across processes
/// - `seq`   : per-generator hex sequence, keeps labels distinct within a process
///
/// Safe to share between concurrently running lifecycles.
#[derive(Debug)]
pub struct LabelGenerator {
    prefix: String,
    seq: AtomicU64,
}

impl LabelGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            seq: AtomicU64::new(1),
        }
    }

    /// Produce the next label.
    pub fn generate(&self) -> WorkerLabel {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let rand = Uuid::new_v4().simple().to_string();
        WorkerLabel::new(format!("{}-{}-{seq:x}", self.prefix, &rand[..8]))
    }
}

impl Default for LabelGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_LABEL_PREFIX)
    }
}
