use std::{path::PathBuf, time::Duration};

use clap::Parser;

use ferry_github::GithubConfig;
use ferry_model::{
    BootstrapSpec, DEFAULT_LABEL_PREFIX, InstanceId, InstanceSizing, Mode, ModelError,
    ModelResult, NetworkPlacement, PollStrategy, StartSpec, StopSpec, Tag, Tags, WorkerLabel,
};
use ferry_observe::{LoggerConfig, LoggerFormat, LoggerLevel};

/// Provision ephemeral self-hosted GitHub Actions runners on EC2.
///
/// Every flag can also be set through the environment variable a workflow
/// step exports for it, so the binary runs unchanged as an action.
#[derive(Debug, Parser)]
#[command(name = "ferry", version)]
pub struct Args {
    /// `start` provisions workers, `stop` tears them down.
    #[arg(long, env = "INPUT_MODE")]
    pub mode: Mode,

    #[arg(long, env = "INPUT_GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: String,

    /// `owner/repo` the runners attach to.
    #[arg(long, env = "GITHUB_REPOSITORY")]
    pub repository: String,

    #[arg(long, env = "GITHUB_API_URL", default_value = GithubConfig::DEFAULT_API_URL)]
    pub github_api_url: String,

    /// Web base passed to the runner's `config.sh --url`.
    #[arg(long, env = "GITHUB_SERVER_URL", default_value = "https://github.com")]
    pub github_server_url: String,

    #[arg(long, env = "INPUT_COUNT", default_value_t = 1)]
    pub count: usize,

    /// JSON array; one worker per element, overriding `--count`.
    #[arg(long, env = "INPUT_SERVICES")]
    pub services: Option<String>,

    #[arg(long, env = "INPUT_EC2_IMAGE_ID")]
    pub ec2_image_id: Option<String>,

    #[arg(long, env = "INPUT_EC2_INSTANCE_TYPE")]
    pub ec2_instance_type: Option<String>,

    #[arg(long, env = "INPUT_SUBNET_ID")]
    pub subnet_id: Option<String>,

    #[arg(long, env = "INPUT_SECURITY_GROUP_ID", value_delimiter = ',')]
    pub security_group_id: Vec<String>,

    /// Instance profile attached to every worker.
    #[arg(long, env = "INPUT_IAM_ROLE_NAME")]
    pub iam_role_name: Option<String>,

    #[arg(long, env = "INPUT_KEY_NAME")]
    pub key_name: Option<String>,

    /// Root volume size in GiB.
    #[arg(long, env = "INPUT_ROOT_VOLUME_SIZE", default_value_t = InstanceSizing::DEFAULT_ROOT_VOLUME_GB)]
    pub root_volume_size: i32,

    #[arg(long, env = "INPUT_EPHEMERAL_VOLUMES", default_value_t = InstanceSizing::DEFAULT_EPHEMERAL_VOLUMES)]
    pub ephemeral_volumes: u8,

    /// JSON `[{"Key": "...", "Value": "..."}]`.
    #[arg(long, env = "INPUT_AWS_RESOURCE_TAGS")]
    pub aws_resource_tags: Option<String>,

    /// Directory of a runner baked into the image. Skips the download when set.
    #[arg(long, env = "INPUT_RUNNER_HOME_DIR")]
    pub runner_home_dir: Option<PathBuf>,

    #[arg(long, env = "INPUT_RUNNER_VERSION")]
    pub runner_version: Option<String>,

    /// Shell run on the instance before the runner is configured.
    #[arg(long, env = "INPUT_PRE_RUNNER_SCRIPT", default_value = "")]
    pub pre_runner_script: String,

    /// Runner labels added next to the generated one.
    #[arg(long, env = "INPUT_EXTRA_LABELS", value_delimiter = ',', default_value = "worker")]
    pub extra_labels: Vec<String>,

    #[arg(long, env = "INPUT_LABEL_PREFIX", default_value = DEFAULT_LABEL_PREFIX)]
    pub label_prefix: String,

    /// Stop: JSON array of instance ids.
    #[arg(long, env = "INPUT_EC2_INSTANCE_IDS")]
    pub ec2_instance_ids: Option<String>,

    /// Stop: JSON array of worker labels.
    #[arg(long, env = "INPUT_LABELS")]
    pub labels: Option<String>,

    #[arg(long, env = "AWS_REGION")]
    pub aws_region: Option<String>,

    #[arg(long, env = "INPUT_RUNNING_TIMEOUT", default_value_t = 300)]
    pub running_timeout_secs: u64,

    #[arg(long, env = "INPUT_REGISTER_TIMEOUT", default_value_t = 300)]
    pub register_timeout_secs: u64,

    #[arg(long, env = "FERRY_LOG_FORMAT", default_value = "text")]
    pub log_format: LoggerFormat,

    #[arg(long, env = "FERRY_LOG_LEVEL", default_value = "info")]
    pub log_level: LoggerLevel,

    /// Write a Prometheus textfile here when the run ends.
    #[arg(long, env = "FERRY_METRICS_FILE")]
    pub metrics_file: Option<PathBuf>,

    /// Step output file; outputs are appended as `name=value` lines.
    #[arg(long, env = "GITHUB_OUTPUT")]
    pub github_output: Option<PathBuf>,
}

impl Args {
    pub fn logger_config(&self) -> LoggerConfig {
        LoggerConfig {
            format: self.log_format,
            level: self.log_level.clone(),
            ..LoggerConfig::default()
        }
    }

    pub fn github_config(&self) -> GithubConfig {
        GithubConfig::new(&self.repository, &self.github_token).with_api_url(&self.github_api_url)
    }

    /// Start inputs as a spec. The orchestrator validates it again before any call.
    pub fn start_spec(&self) -> ModelResult<StartSpec> {
        let count = match non_empty(&self.services) {
            Some(raw) => parse_json::<Vec<serde_json::Value>>("services", raw)?.len(),
            None => self.count,
        };

        let mut sizing = InstanceSizing::new(
            required("ec2-image-id", &self.ec2_image_id)?,
            required("ec2-instance-type", &self.ec2_instance_type)?,
        );
        sizing.root_volume_gb = self.root_volume_size;
        sizing.ephemeral_volumes = self.ephemeral_volumes;
        sizing.key_name = non_empty(&self.key_name).map(str::to_string);
        sizing.iam_role_name = non_empty(&self.iam_role_name).map(str::to_string);

        let placement = NetworkPlacement {
            subnet_id: required("subnet-id", &self.subnet_id)?,
            security_group_ids: trimmed(&self.security_group_id),
        };
        if placement.security_group_ids.is_empty() {
            return Err(ModelError::Missing("security-group-id"));
        }

        let bootstrap = BootstrapSpec {
            server_url: format!(
                "{}/{}",
                self.github_server_url.trim_end_matches('/'),
                self.repository
            ),
            runner_version: non_empty(&self.runner_version).unwrap_or_default().to_string(),
            runner_home_dir: self
                .runner_home_dir
                .clone()
                .filter(|p| !p.as_os_str().is_empty()),
            pre_runner_script: self.pre_runner_script.clone(),
            extra_labels: trimmed(&self.extra_labels),
        };

        let mut tags = Tags::new();
        if let Some(raw) = non_empty(&self.aws_resource_tags) {
            for tag in parse_json::<Vec<Tag>>("aws-resource-tags", raw)? {
                tags.insert(tag.key, tag.value);
            }
        }

        Ok(StartSpec {
            count,
            sizing,
            placement,
            bootstrap,
            tags,
            running_poll: PollStrategy::instance_running()
                .with_timeout_ms(secs_to_ms(self.running_timeout_secs)),
            registered_poll: PollStrategy::worker_registered()
                .with_timeout_ms(secs_to_ms(self.register_timeout_secs)),
        })
    }

    pub fn stop_spec(&self) -> ModelResult<StopSpec> {
        let raw_ids = non_empty(&self.ec2_instance_ids).ok_or(ModelError::Missing("ec2-instance-ids"))?;
        let instance_ids = parse_json::<Vec<String>>("ec2-instance-ids", raw_ids)?
            .into_iter()
            .map(InstanceId::from)
            .collect();

        let labels = match non_empty(&self.labels) {
            Some(raw) => parse_json::<Vec<String>>("labels", raw)?
                .into_iter()
                .map(WorkerLabel::from)
                .collect(),
            None => Vec::new(),
        };

        Ok(StopSpec {
            instance_ids,
            labels,
        })
    }
}

/// Workflow inputs that are not set arrive as empty strings.
fn non_empty(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn required(field: &'static str, v: &Option<String>) -> ModelResult<String> {
    non_empty(v)
        .map(str::to_string)
        .ok_or(ModelError::Missing(field))
}

fn trimmed(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_json<T: serde::de::DeserializeOwned>(field: &'static str, raw: &str) -> ModelResult<T> {
    serde_json::from_str(raw).map_err(|e| ModelError::Invalid {
        field,
        reason: e.to_string(),
    })
}

fn secs_to_ms(secs: u64) -> u64 {
    Duration::from_secs(secs).as_millis() as u64
}
