use std::fmt;

use ferry_model::{InstanceId, ProvisioningResult, WorkerLabel};

use crate::{
    compute::ProviderError,
    error::{LifecycleError, ProvisionError},
    registry::RegistrationError,
};

/// Lifecycle step a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Token,
    Create,
    AwaitRunning,
    AwaitRegistered,
    /// The lifecycle task itself panicked or was aborted.
    Task,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Token => "registration-token",
            Stage::Create => "create-instance",
            Stage::AwaitRunning => "await-running",
            Stage::AwaitRegistered => "await-registered",
            Stage::Task => "task",
        })
    }
}

/// What happened to the instance of a failed lifecycle.
#[derive(Debug)]
pub enum Cleanup {
    /// No instance had been created.
    NotNeeded,
    /// Compensating termination was acknowledged.
    Terminated,
    /// Compensating termination failed; the instance may still be running.
    Unreconciled(ProviderError),
}

/// One failed start lifecycle.
#[derive(Debug)]
pub struct LifecycleFailure {
    pub index: usize,
    pub label: WorkerLabel,
    pub stage: Stage,
    pub instance: Option<InstanceId>,
    pub cause: LifecycleError,
    pub cleanup: Cleanup,
}

impl LifecycleFailure {
    /// `true` if a created instance could not be confirmed terminated.
    pub fn is_unreconciled(&self) -> bool {
        matches!(self.cleanup, Cleanup::Unreconciled(_))
    }
}

impl fmt::Display for LifecycleFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "worker #{} ({}) failed at {}: {}",
            self.index, self.label, self.stage, self.cause
        )?;
        match (&self.instance, &self.cleanup) {
            (Some(id), Cleanup::Terminated) => write!(f, " (instance {id} terminated)"),
            (Some(id), Cleanup::Unreconciled(e)) => {
                write!(f, " (instance {id} NOT confirmed terminated: {e})")
            }
            _ => Ok(()),
        }
    }
}

/// Outcome of a start run after every lifecycle settled.
#[derive(Debug)]
pub struct StartReport {
    requested: usize,
    provisioned: ProvisioningResult,
    failures: Vec<LifecycleFailure>,
}

impl StartReport {
    pub(crate) fn new(requested: usize) -> Self {
        Self {
            requested,
            provisioned: ProvisioningResult::new(),
            failures: Vec::new(),
        }
    }

    pub(crate) fn record_success(&mut self, label: WorkerLabel, instance: InstanceId) {
        self.provisioned.push(label, instance);
    }

    pub(crate) fn record_failure(&mut self, failure: LifecycleFailure) {
        self.failures.push(failure);
    }

    pub fn requested(&self) -> usize {
        self.requested
    }

    /// Registered workers, in request order.
    pub fn provisioned(&self) -> &ProvisioningResult {
        &self.provisioned
    }

    /// Failed lifecycles, in request order.
    pub fn failures(&self) -> &[LifecycleFailure] {
        &self.failures
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Failures whose instance could not be confirmed terminated.
    pub fn unreconciled(&self) -> impl Iterator<Item = &LifecycleFailure> {
        self.failures.iter().filter(|f| f.is_unreconciled())
    }

    /// Split into the successful pairs and, if anything failed, the consolidated error.
    pub fn into_parts(self) -> (ProvisioningResult, Option<ProvisionError>) {
        let err = if self.failures.is_empty() {
            None
        } else {
            Some(ProvisionError::Start {
                requested: self.requested,
                failures: self.failures,
            })
        };
        (self.provisioned, err)
    }

    pub fn into_result(self) -> Result<ProvisioningResult, ProvisionError> {
        match self.into_parts() {
            (provisioned, None) => Ok(provisioned),
            (_, Some(err)) => Err(err),
        }
    }
}

/// Outcome of a stop run. Both steps are always attempted.
#[derive(Debug)]
pub struct StopReport {
    pub instance_ids: Vec<InstanceId>,
    pub termination: Result<(), ProviderError>,
    /// Per label: number of registrations removed, or why removal failed.
    pub deregistration: Vec<(WorkerLabel, Result<usize, RegistrationError>)>,
}

impl StopReport {
    pub fn is_success(&self) -> bool {
        self.termination.is_ok() && self.deregistration.iter().all(|(_, r)| r.is_ok())
    }

    /// Human-readable list of what went wrong, `"ok"` if nothing did.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if let Err(e) = &self.termination {
            parts.push(format!("termination failed: {e}"));
        }
        for (label, res) in &self.deregistration {
            if let Err(e) = res {
                parts.push(format!("deregistration of {label} failed: {e}"));
            }
        }
        if parts.is_empty() {
            "ok".to_string()
        } else {
            parts.join("; ")
        }
    }

    pub fn into_result(self) -> Result<(), ProvisionError> {
        if self.is_success() {
            Ok(())
        } else {
            Err(ProvisionError::Stop(Box::new(self)))
        }
    }
}
