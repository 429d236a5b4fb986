use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_ec2::{
    Client,
    config::Region,
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    types::InstanceType,
};
use ferry_core::{ComputeApi, InstanceRequest, ProviderError};
use ferry_model::{InstanceId, InstanceState};
use tracing::{debug, instrument};

use crate::request::{
    block_device_mappings, encode_user_data, instance_profile, map_state, tag_specification,
};

/// Returned by `DescribeInstances` for ids the API has not caught up with yet.
const INSTANCE_NOT_FOUND: &str = "InvalidInstanceID.NotFound";

/// [`ComputeApi`] backed by the EC2 API.
#[derive(Debug, Clone)]
pub struct Ec2Compute {
    client: Client,
}

impl Ec2Compute {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the default AWS credential and region chain.
    ///
    /// `region` overrides whatever the chain resolves.
    pub async fn from_env(region: Option<String>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region));
        }
        let config = loader.load().await;
        Self::new(Client::new(&config))
    }
}

#[async_trait]
impl ComputeApi for Ec2Compute {
    fn name(&self) -> &'static str {
        "ec2"
    }

    #[instrument(level = "debug", skip_all, fields(label = %request.label))]
    async fn create_instance(
        &self,
        request: InstanceRequest<'_>,
    ) -> Result<InstanceId, ProviderError> {
        let sizing = request.sizing;
        let out = self
            .client
            .run_instances()
            .image_id(&sizing.image_id)
            .instance_type(InstanceType::from(sizing.instance_type.as_str()))
            .min_count(1)
            .max_count(1)
            .user_data(encode_user_data(request.payload))
            .subnet_id(&request.placement.subnet_id)
            .set_security_group_ids(Some(request.placement.security_group_ids.clone()))
            .set_block_device_mappings(Some(block_device_mappings(sizing)))
            .set_key_name(sizing.key_name.clone())
            .set_iam_instance_profile(instance_profile(sizing))
            .set_tag_specifications(tag_specification(request.tags).map(|t| vec![t]))
            .send()
            .await
            .map_err(|e| provider_error("RunInstances", e))?;

        out.instances()
            .first()
            .and_then(|i| i.instance_id())
            .map(InstanceId::from)
            .ok_or(ProviderError::MissingInstanceId)
    }

    async fn describe_instance_state(
        &self,
        instance: &InstanceId,
    ) -> Result<InstanceState, ProviderError> {
        let res = self
            .client
            .describe_instances()
            .instance_ids(instance.as_str())
            .send()
            .await;

        match res {
            Ok(out) => {
                let state = out
                    .reservations()
                    .iter()
                    .flat_map(|r| r.instances())
                    .find(|i| i.instance_id() == Some(instance.as_str()))
                    .and_then(|i| i.state())
                    .and_then(|s| s.name());
                Ok(state.map_or(InstanceState::Pending, map_state))
            }
            Err(e) if e.code() == Some(INSTANCE_NOT_FOUND) => {
                debug!(instance = %instance, "instance not visible yet");
                Ok(InstanceState::Pending)
            }
            Err(e) => Err(provider_error("DescribeInstances", e)),
        }
    }

    #[instrument(level = "debug", skip_all, fields(count = instances.len()))]
    async fn terminate_instances(
        &self,
        instances: &[InstanceId],
    ) -> Result<Vec<InstanceId>, ProviderError> {
        let ids = instances.iter().map(|i| i.as_str().to_string()).collect();
        let out = self
            .client
            .terminate_instances()
            .set_instance_ids(Some(ids))
            .send()
            .await
            .map_err(|e| provider_error("TerminateInstances", e))?;

        Ok(out
            .terminating_instances()
            .iter()
            .filter_map(|change| change.instance_id())
            .map(InstanceId::from)
            .collect())
    }
}

fn provider_error<E>(op: &'static str, err: SdkError<E>) -> ProviderError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    let code = err.code().map(str::to_string);
    let message = err
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| DisplayErrorContext(&err).to_string());
    ProviderError::Api { op, code, message }
}
