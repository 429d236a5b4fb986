//! In-memory collaborators for unit tests.
use std::{
    collections::{HashMap, HashSet},
    sync::{
        Mutex,
        atomic::{AtomicU64, Ordering},
    },
};

use async_trait::async_trait;
use ferry_model::{
    InstanceId, InstanceState, RegisteredWorker, RegistrationToken, Tags, WorkerId, WorkerLabel,
    WorkerStatus,
};

use crate::{
    compute::{ComputeApi, InstanceRequest, ProviderError},
    metrics::{LifecycleOutcome, MetricsBackend},
    registry::{RegistrationError, RegistryApi},
};

#[derive(Default)]
struct Instance {
    ordinal: usize,
    describes: usize,
    forced: Option<InstanceState>,
    terminated: bool,
}

#[derive(Default)]
struct ComputeState {
    next: usize,
    instances: HashMap<InstanceId, Instance>,
    created: Vec<CreatedInstance>,
    terminate_calls: Vec<Vec<InstanceId>>,
}

/// What the mock was asked to create.
#[derive(Debug, Clone)]
pub(crate) struct CreatedInstance {
    pub(crate) id: InstanceId,
    pub(crate) label: WorkerLabel,
    pub(crate) tags: Tags,
    pub(crate) payload: String,
}

/// Compute provider whose instances run after a fixed number of checks.
pub(crate) struct MockCompute {
    state: Mutex<ComputeState>,
    running_after: usize,
    never_running: HashSet<usize>,
    fail_create: HashSet<usize>,
    panic_describing: HashSet<usize>,
    drop_ack: HashSet<String>,
    fail_terminate: bool,
}

impl MockCompute {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(ComputeState::default()),
            running_after: 1,
            never_running: HashSet::new(),
            fail_create: HashSet::new(),
            panic_describing: HashSet::new(),
            drop_ack: HashSet::new(),
            fail_terminate: false,
        }
    }

    /// Report `Running` on the `n`th describe call.
    pub(crate) fn running_after(mut self, n: usize) -> Self {
        self.running_after = n.max(1);
        self
    }

    /// The `n`th instance (creation order, 0-based) stays pending forever.
    pub(crate) fn never_running_nth(mut self, n: usize) -> Self {
        self.never_running.insert(n);
        self
    }

    /// The `n`th create call fails.
    pub(crate) fn fail_create_nth(mut self, n: usize) -> Self {
        self.fail_create.insert(n);
        self
    }

    /// Describing the `n`th instance panics the calling task.
    pub(crate) fn panic_describing_nth(mut self, n: usize) -> Self {
        self.panic_describing.insert(n);
        self
    }

    /// Terminate calls succeed but never acknowledge `id`.
    pub(crate) fn drop_ack_for(mut self, id: &str) -> Self {
        self.drop_ack.insert(id.to_string());
        self
    }

    /// Every terminate call is rejected.
    pub(crate) fn fail_terminate(mut self) -> Self {
        self.fail_terminate = true;
        self
    }

    /// Register an instance that was not created through the mock.
    pub(crate) fn seed(&self, id: &InstanceId) {
        let mut st = self.state.lock().unwrap();
        let ordinal = st.next;
        st.next += 1;
        st.instances.insert(
            id.clone(),
            Instance {
                ordinal,
                ..Instance::default()
            },
        );
    }

    pub(crate) fn set_state(&self, id: &InstanceId, state: InstanceState) {
        let mut st = self.state.lock().unwrap();
        if let Some(inst) = st.instances.get_mut(id) {
            inst.forced = Some(state);
        }
    }

    pub(crate) fn describe_calls(&self, id: &InstanceId) -> usize {
        let st = self.state.lock().unwrap();
        st.instances.get(id).map_or(0, |i| i.describes)
    }

    pub(crate) fn terminate_calls(&self) -> Vec<Vec<InstanceId>> {
        self.state.lock().unwrap().terminate_calls.clone()
    }

    pub(crate) fn created(&self) -> Vec<CreatedInstance> {
        self.state.lock().unwrap().created.clone()
    }

    /// Instances created or seeded and not terminated.
    pub(crate) fn live_instances(&self) -> Vec<InstanceId> {
        let st = self.state.lock().unwrap();
        let mut live: Vec<_> = st
            .instances
            .iter()
            .filter(|(_, i)| !i.terminated)
            .map(|(id, _)| id.clone())
            .collect();
        live.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        live
    }
}

#[async_trait]
impl ComputeApi for MockCompute {
    fn name(&self) -> &'static str {
        "mock-compute"
    }

    async fn create_instance(
        &self,
        request: InstanceRequest<'_>,
    ) -> Result<InstanceId, ProviderError> {
        let mut st = self.state.lock().unwrap();
        let ordinal = st.next;
        st.next += 1;
        if self.fail_create.contains(&ordinal) {
            return Err(ProviderError::api("RunInstances", "insufficient capacity"));
        }

        let id = InstanceId::new(format!("i-{ordinal:04}"));
        st.instances.insert(
            id.clone(),
            Instance {
                ordinal,
                ..Instance::default()
            },
        );
        st.created.push(CreatedInstance {
            id: id.clone(),
            label: request.label.clone(),
            tags: request.tags.clone(),
            payload: request.payload.as_str().to_string(),
        });
        Ok(id)
    }

    async fn describe_instance_state(
        &self,
        instance: &InstanceId,
    ) -> Result<InstanceState, ProviderError> {
        let mut st = self.state.lock().unwrap();
        let Some(inst) = st.instances.get_mut(instance) else {
            return Err(ProviderError::api("DescribeInstances", "unknown instance"));
        };
        inst.describes += 1;
        if self.panic_describing.contains(&inst.ordinal) && !inst.terminated {
            let ordinal = inst.ordinal;
            drop(st);
            panic!("describe of instance #{ordinal} blew up");
        }

        if inst.terminated {
            return Ok(InstanceState::Terminated);
        }
        if let Some(state) = &inst.forced {
            return Ok(state.clone());
        }
        if self.never_running.contains(&inst.ordinal) || inst.describes < self.running_after {
            return Ok(InstanceState::Pending);
        }
        Ok(InstanceState::Running)
    }

    async fn terminate_instances(
        &self,
        instances: &[InstanceId],
    ) -> Result<Vec<InstanceId>, ProviderError> {
        let mut st = self.state.lock().unwrap();
        st.terminate_calls.push(instances.to_vec());
        if self.fail_terminate {
            return Err(ProviderError::api("TerminateInstances", "request throttled"));
        }

        let mut acknowledged = Vec::with_capacity(instances.len());
        for id in instances {
            if self.drop_ack.contains(id.as_str()) {
                continue;
            }
            if let Some(inst) = st.instances.get_mut(id) {
                inst.terminated = true;
            }
            acknowledged.push(id.clone());
        }
        Ok(acknowledged)
    }
}

#[derive(Default)]
struct RegistryState {
    tokens_issued: usize,
    next_id: WorkerId,
    workers: Vec<RegisteredWorker>,
    list_calls: HashMap<String, usize>,
    ordinals: HashMap<String, usize>,
    /// Labels whose registration is managed by the test, never auto-registered.
    manual: HashSet<String>,
}

/// Registration service where workers show up online after a fixed number of lookups.
pub(crate) struct MockRegistry {
    state: Mutex<RegistryState>,
    online_after: usize,
    never_register: HashSet<usize>,
    never_register_all: bool,
    fail_token: HashSet<usize>,
    delete_not_found: bool,
    unavailable: bool,
}

impl MockRegistry {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(RegistryState {
                next_id: 1,
                ..RegistryState::default()
            }),
            online_after: 1,
            never_register: HashSet::new(),
            never_register_all: false,
            fail_token: HashSet::new(),
            delete_not_found: false,
            unavailable: false,
        }
    }

    /// A worker appears online on the `n`th lookup of its label.
    pub(crate) fn online_after(mut self, n: usize) -> Self {
        self.online_after = n.max(1);
        self
    }

    /// The `n`th label looked up (0-based) never registers.
    pub(crate) fn never_register_nth(mut self, n: usize) -> Self {
        self.never_register.insert(n);
        self
    }

    /// No worker ever registers.
    pub(crate) fn never_register(mut self) -> Self {
        self.never_register_all = true;
        self
    }

    /// The `n`th token request (0-based) fails.
    pub(crate) fn fail_token_nth(mut self, n: usize) -> Self {
        self.fail_token.insert(n);
        self
    }

    /// Deletes report the worker as already gone (and remove it).
    pub(crate) fn delete_returns_not_found(mut self) -> Self {
        self.delete_not_found = true;
        self
    }

    /// Every call fails as if the service were down.
    pub(crate) fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// Add an online worker for `label`.
    pub(crate) fn seed_worker(&self, label: &WorkerLabel) {
        let mut st = self.state.lock().unwrap();
        st.manual.insert(label.as_str().to_string());
        let id = st.next_id;
        st.next_id += 1;
        st.workers.push(online_worker(id, label));
    }

    pub(crate) fn list_calls(&self, label: &WorkerLabel) -> usize {
        let st = self.state.lock().unwrap();
        st.list_calls.get(label.as_str()).copied().unwrap_or(0)
    }

    pub(crate) fn tokens_issued(&self) -> usize {
        self.state.lock().unwrap().tokens_issued
    }

    /// Labels of every worker still registered.
    pub(crate) fn registered_labels(&self) -> Vec<String> {
        let st = self.state.lock().unwrap();
        st.workers
            .iter()
            .flat_map(|w| w.labels.first().cloned())
            .collect()
    }

    fn check_available(&self, op: &'static str) -> Result<(), RegistrationError> {
        if self.unavailable {
            return Err(RegistrationError::Unavailable {
                op,
                message: "connection refused".into(),
            });
        }
        Ok(())
    }
}

fn online_worker(id: WorkerId, label: &WorkerLabel) -> RegisteredWorker {
    RegisteredWorker {
        id,
        name: format!("runner-{id}"),
        status: WorkerStatus::Online,
        busy: false,
        labels: vec![label.as_str().to_string(), "self-hosted".into()],
    }
}

#[async_trait]
impl RegistryApi for MockRegistry {
    fn name(&self) -> &'static str {
        "mock-registry"
    }

    async fn create_registration_token(&self) -> Result<RegistrationToken, RegistrationError> {
        self.check_available("create_registration_token")?;
        let mut st = self.state.lock().unwrap();
        let n = st.tokens_issued;
        st.tokens_issued += 1;
        if self.fail_token.contains(&n) {
            return Err(RegistrationError::RateLimited {
                op: "create_registration_token",
                message: "secondary rate limit".into(),
            });
        }
        Ok(RegistrationToken::new(format!("tok-{n}"), None))
    }

    async fn list_workers(
        &self,
        label: &WorkerLabel,
    ) -> Result<Vec<RegisteredWorker>, RegistrationError> {
        self.check_available("list_workers")?;
        let mut st = self.state.lock().unwrap();
        let key = label.as_str().to_string();

        let next_ordinal = st.ordinals.len();
        let ordinal = *st.ordinals.entry(key.clone()).or_insert(next_ordinal);
        let calls = {
            let c = st.list_calls.entry(key.clone()).or_insert(0);
            *c += 1;
            *c
        };

        let blocked = self.never_register_all || self.never_register.contains(&ordinal);
        let known = st.workers.iter().any(|w| w.has_label(&key));
        if !blocked && !known && !st.manual.contains(&key) && calls >= self.online_after {
            let id = st.next_id;
            st.next_id += 1;
            st.workers.push(online_worker(id, label));
            // registered once; later removal must stick
            st.manual.insert(key.clone());
        }

        Ok(st
            .workers
            .iter()
            .filter(|w| w.has_label(&key))
            .cloned()
            .collect())
    }

    async fn delete_worker(&self, worker: WorkerId) -> Result<(), RegistrationError> {
        self.check_available("delete_worker")?;
        let mut st = self.state.lock().unwrap();
        let before = st.workers.len();
        st.workers.retain(|w| w.id != worker);
        if self.delete_not_found || st.workers.len() == before {
            return Err(RegistrationError::NotFound { op: "delete_worker" });
        }
        Ok(())
    }
}

/// Metrics backend that keeps counts for assertions.
#[derive(Default)]
pub(crate) struct RecordingMetrics {
    started: AtomicU64,
    registered: AtomicU64,
    failed: AtomicU64,
    canceled: AtomicU64,
    adapter_errors: AtomicU64,
    unreconciled: AtomicU64,
}

impl RecordingMetrics {
    pub(crate) fn started(&self) -> u64 {
        self.started.load(Ordering::Relaxed)
    }

    pub(crate) fn completed(&self, outcome: LifecycleOutcome) -> u64 {
        match outcome {
            LifecycleOutcome::Registered => self.registered.load(Ordering::Relaxed),
            LifecycleOutcome::Failed => self.failed.load(Ordering::Relaxed),
            LifecycleOutcome::Canceled => self.canceled.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn adapter_errors(&self) -> u64 {
        self.adapter_errors.load(Ordering::Relaxed)
    }

    pub(crate) fn unreconciled(&self) -> u64 {
        self.unreconciled.load(Ordering::Relaxed)
    }
}

impl MetricsBackend for RecordingMetrics {
    fn record_lifecycle_started(&self) {
        self.started.fetch_add(1, Ordering::Relaxed);
    }

    fn record_lifecycle_completed(&self, outcome: LifecycleOutcome, _duration_ms: u64) {
        let counter = match outcome {
            LifecycleOutcome::Registered => &self.registered,
            LifecycleOutcome::Failed => &self.failed,
            LifecycleOutcome::Canceled => &self.canceled,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn record_adapter_error(&self, _adapter: &str, _error_kind: &str) {
        self.adapter_errors.fetch_add(1, Ordering::Relaxed);
    }

    fn record_unreconciled_instance(&self) {
        self.unreconciled.fetch_add(1, Ordering::Relaxed);
    }
}
