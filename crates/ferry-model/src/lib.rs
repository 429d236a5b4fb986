mod domain;
pub use domain::{DEFAULT_LABEL_PREFIX, LABEL_TAG_KEY};
pub use domain::{
    InstanceId, InstanceState, RegisteredWorker, RegistrationToken, Tag, Tags, WorkerId,
    TimeoutMs, WorkerLabel, WorkerStatus,
};

mod error;
pub use error::{ModelError, ModelResult};

mod result;
pub use result::ProvisioningResult;

mod spec;
pub use spec::{BootstrapSpec, InstanceSizing, Mode, NetworkPlacement, StartSpec, StopSpec};

mod strategy;
pub use strategy::{BackoffStrategy, JitterStrategy, PollStrategy};
