use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::Path,
};

use anyhow::Context;

use ferry_model::ProvisioningResult;
use ferry_prometheus::PrometheusMetrics;

/// Step outputs as `name=value` lines.
pub fn render_step_outputs(result: &ProvisioningResult) -> serde_json::Result<String> {
    Ok(format!(
        "labels={}\nec2-instance-ids={}\n",
        serde_json::to_string(result.labels())?,
        serde_json::to_string(result.instance_ids())?,
    ))
}

/// Append step outputs to `step_output` (if set) and print the result as JSON on stdout.
pub fn publish(result: &ProvisioningResult, step_output: Option<&Path>) -> anyhow::Result<()> {
    if let Some(path) = step_output {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("open step output file {}", path.display()))?;
        file.write_all(render_step_outputs(result)?.as_bytes())
            .with_context(|| format!("write step output file {}", path.display()))?;
    }

    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer(&mut stdout, result)?;
    writeln!(stdout)?;
    Ok(())
}

/// Replace `path` with the current text exposition.
///
/// Written next to the target and renamed so the textfile collector never reads a partial file.
pub fn write_metrics_file(path: &Path, metrics: &PrometheusMetrics) -> anyhow::Result<()> {
    let text = metrics.encode_text()?;
    let tmp = path.with_extension("prom.tmp");
    fs::write(&tmp, text).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("rename to {}", path.display()))?;
    Ok(())
}
