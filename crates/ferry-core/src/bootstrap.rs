use std::fmt;

use ferry_model::{BootstrapSpec, RegistrationToken, WorkerLabel};

const PRE_RUNNER_SCRIPT: &str = "pre-runner-script.sh";
const HEREDOC_MARKER: &str = "FERRY_PRE_RUNNER";

/// Boot-time script handed to the compute provider as user data.
///
/// Runs as root at first boot: sources the pre-runner hook, locates or downloads the
/// runner agent, registers it with the token and label, then runs it in the foreground.
/// Contains the registration token, so it never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct BootstrapPayload {
    script: String,
}

impl BootstrapPayload {
    /// Render the script for one worker.
    pub fn render(spec: &BootstrapSpec, token: &RegistrationToken, label: &WorkerLabel) -> Self {
        let mut lines: Vec<String> = vec!["#!/bin/bash".into()];

        match &spec.runner_home_dir {
            Some(home) => lines.push(format!("cd {}", shell_quote(&home.to_string_lossy()))),
            None => lines.push("mkdir actions-runner && cd actions-runner".into()),
        }

        lines.push(format!("cat > {PRE_RUNNER_SCRIPT} <<'{HEREDOC_MARKER}'"));
        lines.push(spec.pre_runner_script.clone());
        lines.push(HEREDOC_MARKER.into());
        lines.push(format!("source {PRE_RUNNER_SCRIPT}"));

        if !spec.is_prebaked() {
            let version = &spec.runner_version;
            let tarball = format!("actions-runner-linux-${{RUNNER_ARCH}}-{version}.tar.gz");
            lines.push(
                r#"case $(uname -m) in aarch64) ARCH="arm64" ;; amd64|x86_64) ARCH="x64" ;; esac && export RUNNER_ARCH=${ARCH}"#
                    .into(),
            );
            lines.push(format!(
                "curl -O -L https://github.com/actions/runner/releases/download/v{version}/{tarball}"
            ));
            lines.push(format!("tar xzf ./{tarball}"));
        }

        let mut labels = vec![label.as_str()];
        labels.extend(spec.extra_labels.iter().map(String::as_str));

        lines.push("export RUNNER_ALLOW_RUNASROOT=1".into());
        lines.push(format!(
            "./config.sh --unattended --url {} --token {} --labels {}",
            shell_quote(&spec.server_url),
            shell_quote(token.secret()),
            shell_quote(&labels.join(",")),
        ));
        lines.push("./run.sh".into());

        Self {
            script: lines.join("\n"),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.script
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.script.as_bytes()
    }
}

impl fmt::Debug for BootstrapPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootstrapPayload")
            .field("len", &self.script.len())
            .finish()
    }
}

/// Single-quote `s` for POSIX shells.
fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mk_spec(home: Option<&str>) -> BootstrapSpec {
        BootstrapSpec {
            server_url: "https://github.com/acme/app".into(),
            runner_version: "2.311.0".into(),
            runner_home_dir: home.map(Into::into),
            pre_runner_script: "yum install -y git".into(),
            extra_labels: vec!["worker".into()],
        }
    }

    fn token() -> RegistrationToken {
        RegistrationToken::new("AAATOKEN", None)
    }

    #[test]
    fn fresh_install_downloads_requested_version() {
        let label = WorkerLabel::from("ferry-1a2b3c4d-1");
        let payload = BootstrapPayload::render(&mk_spec(None), &token(), &label);
        let script = payload.as_str();

        assert!(script.starts_with("#!/bin/bash\nmkdir actions-runner && cd actions-runner\n"));
        assert!(script.contains(
            "releases/download/v2.311.0/actions-runner-linux-${RUNNER_ARCH}-2.311.0.tar.gz"
        ));
        assert!(script.contains("tar xzf ./actions-runner-linux-${RUNNER_ARCH}-2.311.0.tar.gz"));
        assert!(script.contains(
            "--url 'https://github.com/acme/app' --token 'AAATOKEN' --labels 'ferry-1a2b3c4d-1,worker'"
        ));
        assert!(script.ends_with("./run.sh"));
    }

    #[test]
    fn prebaked_image_skips_download() {
        let label = WorkerLabel::from("ferry-1a2b3c4d-1");
        let payload =
            BootstrapPayload::render(&mk_spec(Some("/opt/actions-runner")), &token(), &label);
        let script = payload.as_str();

        assert!(script.contains("cd '/opt/actions-runner'"));
        assert!(!script.contains("curl"));
        assert!(!script.contains("mkdir actions-runner"));
        assert!(script.contains("./config.sh"));
    }

    #[test]
    fn pre_runner_hook_is_written_verbatim_and_sourced_before_config() {
        let mut spec = mk_spec(None);
        spec.pre_runner_script = "echo \"$HOME\" && export A='b'".into();
        let payload = BootstrapPayload::render(&spec, &token(), &WorkerLabel::from("l"));
        let script = payload.as_str();

        assert!(script.contains("<<'FERRY_PRE_RUNNER'\necho \"$HOME\" && export A='b'\nFERRY_PRE_RUNNER"));
        let source = script.find("source pre-runner-script.sh").unwrap();
        let config = script.find("./config.sh").unwrap();
        assert!(source < config);
    }

    #[test]
    fn debug_does_not_leak_token() {
        let payload = BootstrapPayload::render(&mk_spec(None), &token(), &WorkerLabel::from("l"));
        assert!(!format!("{payload:?}").contains("AAATOKEN"));
    }

    #[test]
    fn shell_quote_escapes_single_quotes() {
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
    }
}
