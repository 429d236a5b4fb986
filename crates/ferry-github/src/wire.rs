//! GitHub REST payloads.
use serde::Deserialize;

use ferry_model::{RegisteredWorker, RegistrationToken, WorkerStatus};

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub(crate) token: String,
    #[serde(default)]
    pub(crate) expires_at: Option<String>,
}

impl From<TokenResponse> for RegistrationToken {
    fn from(r: TokenResponse) -> Self {
        RegistrationToken::new(r.token, r.expires_at)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RunnersPage {
    pub(crate) total_count: usize,
    #[serde(default)]
    pub(crate) runners: Vec<Runner>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Runner {
    id: u64,
    name: String,
    status: String,
    #[serde(default)]
    busy: bool,
    #[serde(default)]
    labels: Vec<RunnerLabel>,
}

#[derive(Debug, Deserialize)]
struct RunnerLabel {
    name: String,
}

impl From<Runner> for RegisteredWorker {
    fn from(r: Runner) -> Self {
        RegisteredWorker {
            id: r.id,
            name: r.name,
            status: WorkerStatus::from(r.status.as_str()),
            busy: r.busy,
            labels: r.labels.into_iter().map(|l| l.name).collect(),
        }
    }
}
