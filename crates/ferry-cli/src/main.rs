mod args;
mod output;
mod run;
mod signal;

use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use ferry_aws::Ec2Compute;
use ferry_core::{LabelGenerator, MetricsHandle, Orchestrator, noop_metrics};
use ferry_github::GithubRegistry;
use ferry_model::Mode;
use ferry_observe::init_logger;
use ferry_prometheus::PrometheusMetrics;

use crate::args::Args;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 1) logger
    init_logger(&args.logger_config())?;
    info!(mode = %args.mode, repository = %args.repository, "ferry starting");

    // 2) metrics
    let prometheus = match &args.metrics_file {
        Some(_) => Some(PrometheusMetrics::new()?),
        None => None,
    };
    let metrics: MetricsHandle = match &prometheus {
        Some(m) => Arc::new(m.clone()) as MetricsHandle,
        None => noop_metrics(),
    };

    // 3) collaborators
    let compute = Ec2Compute::from_env(args.aws_region.clone()).await;
    let registry = GithubRegistry::new(&args.github_config())?;
    let orchestrator = Orchestrator::with_metrics(
        Arc::new(compute),
        Arc::new(registry),
        LabelGenerator::new(args.label_prefix.as_str()),
        metrics,
    );

    // 4) signals
    let cancel = CancellationToken::new();
    signal::cancel_on_shutdown(cancel.clone());

    // 5) run
    let outcome = match args.mode {
        Mode::Start => run::start(&orchestrator, &args, &cancel).await,
        Mode::Stop => run::stop(&orchestrator, &args).await,
    };

    if let (Some(m), Some(path)) = (&prometheus, &args.metrics_file) {
        if let Err(e) = output::write_metrics_file(path, m) {
            warn!(error = %e, path = %path.display(), "failed to write metrics file");
        }
    }
    outcome
}
