use std::{fmt, time::Duration};

use async_trait::async_trait;
use reqwest::{
    Client, RequestBuilder, Response,
    header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT},
};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use ferry_core::{RegistrationError, RegistryApi};
use ferry_model::{RegisteredWorker, RegistrationToken, WorkerId, WorkerLabel};

use crate::{
    error::{ConfigError, from_status, from_transport},
    wire::{RunnersPage, TokenResponse},
};

const API_VERSION: &str = "2022-11-28";
const PER_PAGE: usize = 100;

/// Connection settings for the GitHub REST API.
#[derive(Clone)]
pub struct GithubConfig {
    /// API base, e.g. `https://api.github.com`.
    pub api_url: String,
    /// `owner/repo` the workers attach to.
    pub repository: String,
    pub token: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl GithubConfig {
    pub const DEFAULT_API_URL: &'static str = "https://api.github.com";

    pub fn new(repository: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            api_url: Self::DEFAULT_API_URL.to_string(),
            repository: repository.into(),
            token: token.into(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.token.trim().is_empty() {
            return Err(ConfigError::MissingToken);
        }
        match self.repository.split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
                Ok(())
            }
            _ => Err(ConfigError::Repository(self.repository.clone())),
        }
    }
}

impl fmt::Debug for GithubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubConfig")
            .field("api_url", &self.api_url)
            .field("repository", &self.repository)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// [`RegistryApi`] backed by the repository-level self-hosted runner endpoints.
#[derive(Clone)]
pub struct GithubRegistry {
    client: Client,
    runners_url: String,
    token: String,
}

impl fmt::Debug for GithubRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubRegistry")
            .field("runners_url", &self.runners_url)
            .finish_non_exhaustive()
    }
}

impl GithubRegistry {
    pub fn new(config: &GithubConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("ferry/", env!("CARGO_PKG_VERSION"))),
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            runners_url: runners_url(&config.api_url, &config.repository),
            token: config.token.clone(),
        })
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        req.bearer_auth(&self.token)
    }

    async fn send(&self, op: &'static str, req: RequestBuilder) -> Result<Response, RegistrationError> {
        let resp = self
            .authed(req)
            .send()
            .await
            .map_err(|e| from_transport(op, e))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let exhausted = resp
            .headers()
            .get("x-ratelimit-remaining")
            .is_some_and(|v| v.as_bytes() == b"0");
        let body = resp.text().await.unwrap_or_default();
        Err(from_status(op, status, exhausted, body))
    }

    async fn json<T: DeserializeOwned>(
        &self,
        op: &'static str,
        req: RequestBuilder,
    ) -> Result<T, RegistrationError> {
        self.send(op, req)
            .await?
            .json()
            .await
            .map_err(|e| RegistrationError::Decode {
                op,
                message: e.to_string(),
            })
    }
}

fn runners_url(api_url: &str, repository: &str) -> String {
    format!(
        "{}/repos/{}/actions/runners",
        api_url.trim_end_matches('/'),
        repository
    )
}

#[async_trait]
impl RegistryApi for GithubRegistry {
    fn name(&self) -> &'static str {
        "github"
    }

    #[instrument(level = "debug", skip(self))]
    async fn create_registration_token(&self) -> Result<RegistrationToken, RegistrationError> {
        let url = format!("{}/registration-token", self.runners_url);
        let resp: TokenResponse = self
            .json("create_registration_token", self.client.post(url))
            .await?;
        Ok(resp.into())
    }

    /// GitHub cannot filter runners by label server-side; all pages are read and
    /// filtered here.
    #[instrument(level = "debug", skip(self), fields(label = %label))]
    async fn list_workers(
        &self,
        label: &WorkerLabel,
    ) -> Result<Vec<RegisteredWorker>, RegistrationError> {
        let mut matched = Vec::new();
        let mut seen = 0;
        let mut page = 1;
        loop {
            let req = self
                .client
                .get(&self.runners_url)
                .query(&[("per_page", PER_PAGE), ("page", page)]);
            let body: RunnersPage = self.json("list_workers", req).await?;

            let fetched = body.runners.len();
            seen += fetched;
            matched.extend(
                body.runners
                    .into_iter()
                    .map(RegisteredWorker::from)
                    .filter(|w| w.has_label(label.as_str())),
            );

            if fetched == 0 || seen >= body.total_count {
                break;
            }
            page += 1;
        }
        debug!(seen, matched = matched.len(), "runners listed");
        Ok(matched)
    }

    #[instrument(level = "debug", skip(self))]
    async fn delete_worker(&self, worker: WorkerId) -> Result<(), RegistrationError> {
        let url = format!("{}/{worker}", self.runners_url);
        self.send("delete_worker", self.client.delete(url)).await?;
        Ok(())
    }
}
