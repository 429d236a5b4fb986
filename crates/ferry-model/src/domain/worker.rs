use std::fmt;

use serde::{Deserialize, Serialize};

/// Registration-service identifier of a worker entry.
pub type WorkerId = u64;

/// Connectivity status reported by the registration service for a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerStatus {
    Online,
    Offline,
    Other(String),
}

impl From<&str> for WorkerStatus {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "online" => WorkerStatus::Online,
            "offline" => WorkerStatus::Offline,
            other => WorkerStatus::Other(other.to_string()),
        }
    }
}

/// One entry in the registration service's worker listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredWorker {
    pub id: WorkerId,
    pub name: String,
    pub status: WorkerStatus,
    pub busy: bool,
    pub labels: Vec<String>,
}

impl RegisteredWorker {
    /// Returns `true` if the worker carries the given label.
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    /// A worker is ready once it reports itself online, busy or not.
    pub fn is_ready(&self) -> bool {
        self.status == WorkerStatus::Online
    }
}

/// Short-lived credential a fresh instance uses to register itself.
///
/// The secret never shows up in `Debug` output.
#[derive(Clone, Serialize, Deserialize)]
pub struct RegistrationToken {
    token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<String>,
}

impl RegistrationToken {
    pub fn new(token: impl Into<String>, expires_at: Option<String>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    /// The raw token value. Only the bootstrap payload should read this.
    pub fn secret(&self) -> &str {
        &self.token
    }

    pub fn expires_at(&self) -> Option<&str> {
        self.expires_at.as_deref()
    }
}

impl fmt::Debug for RegistrationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationToken")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_redacts_token() {
        let token = RegistrationToken::new("AABBCC", Some("2026-01-01T00:00:00Z".into()));
        let dbg = format!("{token:?}");
        assert!(!dbg.contains("AABBCC"));
        assert!(dbg.contains("<redacted>"));
        assert_eq!(token.secret(), "AABBCC");
    }

    #[test]
    fn status_parsing_is_case_insensitive() {
        assert_eq!(WorkerStatus::from("Online"), WorkerStatus::Online);
        assert_eq!(WorkerStatus::from("offline"), WorkerStatus::Offline);
        assert_eq!(
            WorkerStatus::from("idle"),
            WorkerStatus::Other("idle".into())
        );
    }

    #[test]
    fn ready_means_online_regardless_of_busy() {
        let mut w = RegisteredWorker {
            id: 1,
            name: "ip-10-0-0-1".into(),
            status: WorkerStatus::Online,
            busy: true,
            labels: vec!["ferry-1abc".into(), "self-hosted".into()],
        };
        assert!(w.is_ready());
        assert!(w.has_label("ferry-1abc"));
        assert!(!w.has_label("ferry-2abc"));

        w.status = WorkerStatus::Offline;
        assert!(!w.is_ready());
    }
}
