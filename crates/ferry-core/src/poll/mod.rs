//! Bounded wait for an eventually-consistent remote condition.
//!
//! Both adapters wait through [`poll_until`]: suspend, check, suspend again,
//! until the check reports [`Probe::Ready`], the deadline passes, or the run is canceled.
mod policy;
pub use policy::PollPolicy;

use std::{future::Future, time::Duration};

use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Result of one check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe<T> {
    /// Condition met.
    Ready(T),
    /// Not yet; check again after the next interval.
    Pending,
}

/// Why a poll ended without the condition being met.
#[derive(Debug)]
pub enum PollError<E> {
    /// Deadline passed.
    Timeout { attempts: u32, elapsed: Duration },
    /// The cancellation token fired while waiting.
    Canceled { attempts: u32 },
    /// The check itself failed; polling stops on the first such error.
    Check(E),
}

/// Run `check` until it returns [`Probe::Ready`] or `policy.timeout` elapses.
///
/// - the first check runs after `policy.initial_delay` (cut short by the deadline);
/// - between checks the task sleeps for `policy.delay(attempt)`, never past the deadline;
/// - at least one check always runs unless the token is already canceled;
/// - a check that returns `Err` ends the poll immediately.
///
/// Checks are not interrupted once started: each collaborator call is expected to carry
/// its own request timeout.
pub async fn poll_until<T, E, F, Fut>(
    policy: &PollPolicy,
    cancel: &CancellationToken,
    mut check: F,
) -> Result<T, PollError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Probe<T>, E>>,
{
    let started = Instant::now();
    let deadline = started + policy.timeout;
    let mut attempts: u32 = 0;

    if !policy.initial_delay.is_zero() {
        let quiet = policy.initial_delay.min(policy.timeout);
        tokio::select! {
            _ = sleep(quiet) => {}
            _ = cancel.cancelled() => return Err(PollError::Canceled { attempts }),
        }
    }

    loop {
        if cancel.is_cancelled() {
            return Err(PollError::Canceled { attempts });
        }

        attempts += 1;
        match check().await {
            Ok(Probe::Ready(v)) => return Ok(v),
            Ok(Probe::Pending) => {}
            Err(e) => return Err(PollError::Check(e)),
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(PollError::Timeout {
                attempts,
                elapsed: now - started,
            });
        }
        let delay = policy.delay(attempts - 1).min(deadline - now);
        trace!(attempt = attempts, delay_ms = delay.as_millis() as u64, "condition pending");

        tokio::select! {
            _ = sleep(delay) => {}
            _ = cancel.cancelled() => return Err(PollError::Canceled { attempts }),
        }
    }
}
