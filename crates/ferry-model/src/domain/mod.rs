mod constants;
pub use constants::{DEFAULT_LABEL_PREFIX, LABEL_TAG_KEY};

mod instance;
pub use instance::{InstanceId, InstanceState};

mod label;
pub use label::WorkerLabel;

mod tags;
pub use tags::{Tag, Tags};

mod worker;
pub use worker::{RegisteredWorker, RegistrationToken, WorkerId, WorkerStatus};

/// Timeout value in milliseconds.
pub type TimeoutMs = u64;
