use std::fmt;

use serde::{Deserialize, Serialize};

/// Correlation key tying one compute instance to its CI-side registration.
///
/// Generated once per provisioning attempt and never reused within a process run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerLabel(String);

impl WorkerLabel {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkerLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WorkerLabel {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for WorkerLabel {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for WorkerLabel {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
