//! Pure translation of ferry request types into EC2 shapes.
use aws_sdk_ec2::types::{
    BlockDeviceMapping, EbsBlockDevice, IamInstanceProfileSpecification, ResourceType, Tag,
    TagSpecification,
};
use base64::{Engine, engine::general_purpose::STANDARD};
use ferry_core::BootstrapPayload;
use ferry_model::{InstanceSizing, InstanceState, Tags};

const ROOT_DEVICE: &str = "/dev/sda1";

/// Root volume plus one instance-store mapping per ephemeral volume (`/dev/sdb`, `/dev/sdc`, ...).
pub(crate) fn block_device_mappings(sizing: &InstanceSizing) -> Vec<BlockDeviceMapping> {
    let mut mappings = Vec::with_capacity(1 + sizing.ephemeral_volumes as usize);
    mappings.push(
        BlockDeviceMapping::builder()
            .device_name(ROOT_DEVICE)
            .ebs(
                EbsBlockDevice::builder()
                    .volume_size(sizing.root_volume_gb)
                    .build(),
            )
            .build(),
    );
    for n in 0..sizing.ephemeral_volumes {
        let letter = char::from(b'b' + n);
        mappings.push(
            BlockDeviceMapping::builder()
                .device_name(format!("/dev/sd{letter}"))
                .virtual_name(format!("ephemeral{n}"))
                .build(),
        );
    }
    mappings
}

/// Instance tag specification, `None` when there is nothing to tag.
pub(crate) fn tag_specification(tags: &Tags) -> Option<TagSpecification> {
    if tags.is_empty() {
        return None;
    }
    let tags = tags
        .iter()
        .map(|t| Tag::builder().key(&t.key).value(&t.value).build())
        .collect();
    Some(
        TagSpecification::builder()
            .resource_type(ResourceType::Instance)
            .set_tags(Some(tags))
            .build(),
    )
}

pub(crate) fn instance_profile(sizing: &InstanceSizing) -> Option<IamInstanceProfileSpecification> {
    sizing
        .iam_role_name
        .as_deref()
        .map(|name| IamInstanceProfileSpecification::builder().name(name).build())
}

/// EC2 expects user data base64-encoded.
pub(crate) fn encode_user_data(payload: &BootstrapPayload) -> String {
    STANDARD.encode(payload.as_bytes())
}

pub(crate) fn map_state(name: &aws_sdk_ec2::types::InstanceStateName) -> InstanceState {
    // EC2 state names match ferry's lowercase names
    match name.as_str().parse() {
        Ok(state) => state,
        Err(never) => match never {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_ec2::types::InstanceStateName;

    #[test]
    fn default_sizing_maps_root_and_two_ephemeral_volumes() {
        let sizing = InstanceSizing::new("ami-1", "c5.large");
        let mappings = block_device_mappings(&sizing);

        let devices: Vec<_> = mappings.iter().filter_map(|m| m.device_name()).collect();
        assert_eq!(devices, vec!["/dev/sda1", "/dev/sdb", "/dev/sdc"]);
        assert_eq!(
            mappings[0].ebs().and_then(|e| e.volume_size()),
            Some(InstanceSizing::DEFAULT_ROOT_VOLUME_GB)
        );
        assert_eq!(mappings[1].virtual_name(), Some("ephemeral0"));
        assert_eq!(mappings[2].virtual_name(), Some("ephemeral1"));
    }

    #[test]
    fn no_ephemeral_volumes_leaves_only_root() {
        let mut sizing = InstanceSizing::new("ami-1", "t3.micro");
        sizing.ephemeral_volumes = 0;
        sizing.root_volume_gb = 80;

        let mappings = block_device_mappings(&sizing);
        assert_eq!(mappings.len(), 1);
        assert_eq!(mappings[0].ebs().and_then(|e| e.volume_size()), Some(80));
    }

    #[test]
    fn tags_become_one_instance_tag_specification() {
        assert!(tag_specification(&Tags::new()).is_none());

        let mut tags = Tags::new();
        tags.insert("team", "ci").insert("ferry:label", "ferry-abc-1");
        let spec = tag_specification(&tags).unwrap();

        assert_eq!(spec.resource_type(), Some(&ResourceType::Instance));
        let pairs: Vec<_> = spec
            .tags()
            .iter()
            .map(|t| (t.key().unwrap_or_default(), t.value().unwrap_or_default()))
            .collect();
        assert_eq!(pairs, vec![("team", "ci"), ("ferry:label", "ferry-abc-1")]);
    }

    #[test]
    fn instance_profile_only_when_role_given() {
        let mut sizing = InstanceSizing::new("ami-1", "c5.large");
        assert!(instance_profile(&sizing).is_none());

        sizing.iam_role_name = Some("runner-role".into());
        assert_eq!(
            instance_profile(&sizing).and_then(|p| p.name().map(str::to_string)),
            Some("runner-role".to_string())
        );
    }

    #[test]
    fn provider_state_names_map_onto_instance_state() {
        assert_eq!(map_state(&InstanceStateName::Running), InstanceState::Running);
        assert_eq!(map_state(&InstanceStateName::Pending), InstanceState::Pending);
        assert_eq!(
            map_state(&InstanceStateName::ShuttingDown),
            InstanceState::ShuttingDown
        );
        assert!(map_state(&InstanceStateName::Terminated).is_terminal());
    }
}
