use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{
    PollStrategy, Tags,
    error::{ModelError, ModelResult},
};

/// Instance shape passed to the compute provider on creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceSizing {
    pub image_id: String,
    pub instance_type: String,
    /// Root volume size in GiB.
    pub root_volume_gb: i32,
    /// Number of instance-store volumes to map (`ephemeral0`, `ephemeral1`, ...).
    pub ephemeral_volumes: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_name: Option<String>,
    /// Instance profile attached to the instance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iam_role_name: Option<String>,
}

impl InstanceSizing {
    pub const DEFAULT_ROOT_VOLUME_GB: i32 = 30;
    pub const DEFAULT_EPHEMERAL_VOLUMES: u8 = 2;

    pub fn new(image_id: impl Into<String>, instance_type: impl Into<String>) -> Self {
        Self {
            image_id: image_id.into(),
            instance_type: instance_type.into(),
            root_volume_gb: Self::DEFAULT_ROOT_VOLUME_GB,
            ephemeral_volumes: Self::DEFAULT_EPHEMERAL_VOLUMES,
            key_name: None,
            iam_role_name: None,
        }
    }

    fn validate(&self) -> ModelResult<()> {
        if self.image_id.trim().is_empty() {
            return Err(ModelError::Missing("ec2-image-id"));
        }
        if self.instance_type.trim().is_empty() {
            return Err(ModelError::Missing("ec2-instance-type"));
        }
        if self.root_volume_gb <= 0 {
            return Err(ModelError::invalid(
                "root-volume-size",
                format!("{} GiB", self.root_volume_gb),
            ));
        }
        // instance-store devices are mapped to /dev/sdb../dev/sdy
        if self.ephemeral_volumes > 24 {
            return Err(ModelError::invalid(
                "ephemeral-volumes",
                format!("{} exceeds 24", self.ephemeral_volumes),
            ));
        }
        Ok(())
    }
}

/// Where created instances are attached in the provider network.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkPlacement {
    pub subnet_id: String,
    pub security_group_ids: Vec<String>,
}

impl NetworkPlacement {
    fn validate(&self) -> ModelResult<()> {
        if self.subnet_id.trim().is_empty() {
            return Err(ModelError::Missing("subnet-id"));
        }
        if self.security_group_ids.iter().all(|g| g.trim().is_empty()) {
            return Err(ModelError::Missing("security-group-id"));
        }
        Ok(())
    }
}

/// Inputs of the boot-time script that installs and starts the runner agent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapSpec {
    /// URL the agent registers against (e.g. `https://github.com/owner/repo`).
    pub server_url: String,
    /// Agent release used by the fresh-install variant.
    pub runner_version: String,
    /// Pre-baked variant: agent already unpacked in this directory of the image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runner_home_dir: Option<PathBuf>,
    /// Shell snippet sourced before the agent is configured.
    #[serde(default)]
    pub pre_runner_script: String,
    /// Labels attached to the runner in addition to its worker label.
    #[serde(default)]
    pub extra_labels: Vec<String>,
}

impl BootstrapSpec {
    /// Returns `true` when the image already contains the agent.
    pub fn is_prebaked(&self) -> bool {
        self.runner_home_dir.is_some()
    }

    fn validate(&self) -> ModelResult<()> {
        if self.server_url.trim().is_empty() {
            return Err(ModelError::Missing("server-url"));
        }
        if !self.is_prebaked() && self.runner_version.trim().is_empty() {
            return Err(ModelError::Missing("runner-version"));
        }
        if let Some(bad) = self
            .extra_labels
            .iter()
            .find(|l| l.is_empty() || l.contains(',') || l.contains(char::is_whitespace))
        {
            return Err(ModelError::invalid(
                "extra-labels",
                format!("'{bad}' must be non-empty without commas or whitespace"),
            ));
        }
        Ok(())
    }
}

/// Everything a start run needs, built once from the inputs.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSpec {
    /// Number of workers to provision. Zero is a valid no-op run.
    pub count: usize,
    pub sizing: InstanceSizing,
    pub placement: NetworkPlacement,
    pub bootstrap: BootstrapSpec,
    #[serde(default, skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,
    pub running_poll: PollStrategy,
    pub registered_poll: PollStrategy,
}

impl StartSpec {
    /// Upper bound on concurrently provisioned workers per run.
    pub const MAX_COUNT: usize = 64;

    pub fn validate(&self) -> ModelResult<()> {
        if self.count > Self::MAX_COUNT {
            return Err(ModelError::invalid(
                "count",
                format!("{} exceeds the limit of {}", self.count, Self::MAX_COUNT),
            ));
        }
        self.sizing.validate()?;
        self.placement.validate()?;
        self.bootstrap.validate()?;
        self.running_poll.validate()?;
        self.registered_poll.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mk_spec() -> StartSpec {
        StartSpec {
            count: 2,
            sizing: InstanceSizing::new("ami-123", "c5.large"),
            placement: NetworkPlacement {
                subnet_id: "subnet-1".into(),
                security_group_ids: vec!["sg-1".into()],
            },
            bootstrap: BootstrapSpec {
                server_url: "https://github.com/acme/app".into(),
                runner_version: "2.311.0".into(),
                runner_home_dir: None,
                pre_runner_script: String::new(),
                extra_labels: vec!["worker".into()],
            },
            tags: Tags::new(),
            running_poll: PollStrategy::instance_running(),
            registered_poll: PollStrategy::worker_registered(),
        }
    }

    #[test]
    fn valid_spec_passes() {
        assert!(mk_spec().validate().is_ok());
    }

    #[test]
    fn missing_image_is_reported_by_input_name() {
        let mut spec = mk_spec();
        spec.sizing.image_id = " ".into();
        assert!(matches!(
            spec.validate(),
            Err(ModelError::Missing("ec2-image-id"))
        ));
    }

    #[test]
    fn fresh_install_requires_runner_version() {
        let mut spec = mk_spec();
        spec.bootstrap.runner_version.clear();
        assert!(matches!(
            spec.validate(),
            Err(ModelError::Missing("runner-version"))
        ));

        spec.bootstrap.runner_home_dir = Some("/opt/actions-runner".into());
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn count_is_bounded() {
        let mut spec = mk_spec();
        spec.count = StartSpec::MAX_COUNT + 1;
        assert!(matches!(
            spec.validate(),
            Err(ModelError::Invalid { field: "count", .. })
        ));

        spec.count = 0;
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn extra_labels_must_not_break_label_list() {
        let mut spec = mk_spec();
        spec.bootstrap.extra_labels = vec!["gpu,large".into()];
        assert!(spec.validate().is_err());
    }

    #[test]
    fn empty_security_groups_are_rejected() {
        let mut spec = mk_spec();
        spec.placement.security_group_ids = vec![String::new()];
        assert!(matches!(
            spec.validate(),
            Err(ModelError::Missing("security-group-id"))
        ));
    }
}
