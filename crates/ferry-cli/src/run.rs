use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use ferry_core::Orchestrator;

use crate::{args::Args, output};

/// Provision workers and publish whatever registered, even on partial failure.
pub async fn start(
    orchestrator: &Orchestrator,
    args: &Args,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let spec = args.start_spec().context("invalid start inputs")?;
    let report = orchestrator.start(&spec, cancel).await?;

    for failure in report.unreconciled() {
        if let Some(instance) = &failure.instance {
            error!(instance = %instance, label = %failure.label, "instance needs manual termination");
        }
    }

    info!(
        requested = report.requested(),
        registered = report.provisioned().len(),
        failed = report.failures().len(),
        "start settled",
    );
    let (provisioned, err) = report.into_parts();
    output::publish(&provisioned, args.github_output.as_deref())?;

    match err {
        Some(err) => Err(err.into()),
        None => {
            info!(workers = provisioned.len(), "start finished");
            Ok(())
        }
    }
}

/// Terminate the given instances and deregister their workers.
pub async fn stop(orchestrator: &Orchestrator, args: &Args) -> anyhow::Result<()> {
    let spec = args.stop_spec().context("invalid stop inputs")?;
    orchestrator.stop(&spec).await?.into_result()?;
    info!("stop finished");
    Ok(())
}
