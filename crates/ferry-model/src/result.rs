use serde::Serialize;

use crate::{InstanceId, WorkerLabel};

/// Successfully provisioned workers of one start run.
///
/// `labels[i]` and `instance_ids[i]` always describe the same worker.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisioningResult {
    labels: Vec<WorkerLabel>,
    instance_ids: Vec<InstanceId>,
}

impl ProvisioningResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one registered worker.
    pub fn push(&mut self, label: WorkerLabel, instance: InstanceId) {
        self.labels.push(label);
        self.instance_ids.push(instance);
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[WorkerLabel] {
        &self.labels
    }

    pub fn instance_ids(&self) -> &[InstanceId] {
        &self.instance_ids
    }

    /// Iterate `(label, instance)` pairs in provisioning order.
    pub fn pairs(&self) -> impl Iterator<Item = (&WorkerLabel, &InstanceId)> {
        self.labels.iter().zip(self.instance_ids.iter())
    }
}

impl FromIterator<(WorkerLabel, InstanceId)> for ProvisioningResult {
    fn from_iter<I: IntoIterator<Item = (WorkerLabel, InstanceId)>>(iter: I) -> Self {
        let mut out = Self::new();
        for (label, instance) in iter {
            out.push(label, instance);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_index_correspondence() {
        let result: ProvisioningResult = [
            (WorkerLabel::from("ferry-1"), InstanceId::from("i-a")),
            (WorkerLabel::from("ferry-2"), InstanceId::from("i-b")),
        ]
        .into_iter()
        .collect();

        assert_eq!(result.len(), 2);
        assert_eq!(result.labels()[1].as_str(), "ferry-2");
        assert_eq!(result.instance_ids()[1].as_str(), "i-b");

        let pairs: Vec<_> = result.pairs().map(|(l, i)| (l.as_str(), i.as_str())).collect();
        assert_eq!(pairs, [("ferry-1", "i-a"), ("ferry-2", "i-b")]);
    }

    #[test]
    fn serializes_as_two_arrays() {
        let mut result = ProvisioningResult::new();
        result.push("ferry-1".into(), "i-a".into());
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(json, r#"{"labels":["ferry-1"],"instanceIds":["i-a"]}"#);
    }
}
