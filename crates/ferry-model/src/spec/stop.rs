use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{
    InstanceId, WorkerLabel,
    error::{ModelError, ModelResult},
};

/// Teardown request for resources created by an earlier start run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopSpec {
    /// Instances to terminate in one batched call.
    pub instance_ids: Vec<InstanceId>,
    /// Worker labels whose registrations are removed. May be empty.
    #[serde(default)]
    pub labels: Vec<WorkerLabel>,
}

impl StopSpec {
    pub fn validate(&self) -> ModelResult<()> {
        if self.instance_ids.is_empty() {
            return Err(ModelError::Missing("ec2-instance-ids"));
        }
        let mut seen = HashSet::new();
        for id in &self.instance_ids {
            if id.as_str().trim().is_empty() {
                return Err(ModelError::invalid("ec2-instance-ids", "empty instance id"));
            }
            if !seen.insert(id) {
                return Err(ModelError::invalid(
                    "ec2-instance-ids",
                    format!("duplicate instance id {id}"),
                ));
            }
        }
        if self.labels.iter().any(|l| l.as_str().trim().is_empty()) {
            return Err(ModelError::invalid("labels", "empty label"));
        }
        Ok(())
    }
}
