//! Environment checks run before touching a cluster

use std::time::Duration;

use crate::error::{KubeError, Result};
use crate::exec;

/// Deadline for each individual check
pub const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

pub const DOCKER_INSTALL_URL: &str = "https://docs.docker.com/get-docker/";

/// Check that `binary` runs and reports a version
pub async fn check_tool(binary: &str, version_args: &[&str], install_url: &str) -> Result<()> {
    let unavailable = |source: Option<std::io::Error>| KubeError::ToolUnavailable {
        tool: binary.to_string(),
        help: format!("install {binary}: {install_url}"),
        source,
    };

    match exec::run(binary, version_args, CHECK_TIMEOUT).await {
        Ok(out) if out.success() => {
            tracing::debug!("{} version: {}", binary, out.output.trim());
            Ok(())
        }
        Ok(_) => Err(unavailable(None)),
        Err(KubeError::Spawn { source, .. }) => Err(unavailable(Some(source))),
        Err(e) => Err(e),
    }
}

/// Check that the container runtime daemon answers `<runtime> info`
///
/// With `verbose`, the raw output is appended to the error and logged on
/// success.
pub async fn check_runtime(runtime: &str, verbose: bool) -> Result<()> {
    let out = match exec::run(runtime, &["info"], CHECK_TIMEOUT).await {
        Ok(out) => out,
        Err(KubeError::Spawn { source, .. }) => {
            return Err(KubeError::ToolUnavailable {
                tool: runtime.to_string(),
                help: format!("install Docker: {DOCKER_INSTALL_URL}"),
                source: Some(source),
            });
        }
        Err(e) => return Err(e),
    };

    if !out.success() {
        let mut message = out.output.trim().to_string();
        if message.is_empty() {
            message = out.status.to_string();
        }
        let mut advice = runtime_advice(&out.output).to_string();
        if verbose {
            advice.push_str(&format!("\n--- {runtime} output ---\n{}", out.output));
        }
        return Err(KubeError::RuntimeUnavailable {
            runtime: runtime.to_string(),
            message,
            advice,
        });
    }

    if verbose {
        tracing::debug!("{} info output:\n{}", runtime, out.output);
    }
    Ok(())
}

/// Remediation hint derived from the runtime's own error text
pub fn runtime_advice(output: &str) -> &'static str {
    let lower = output.to_lowercase();
    if lower.contains("permission denied") {
        " (permission denied: add your user to the docker group or run as root)"
    } else if lower.contains("connect") {
        " (is the Docker daemon running? try 'systemctl start docker')"
    } else {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_advice() {
        assert!(runtime_advice("dial unix /var/run/docker.sock: connect: permission denied")
            .contains("docker group"));
        assert!(runtime_advice("Cannot connect to the Docker daemon").contains("daemon running"));
        assert_eq!(runtime_advice("something else"), "");
    }

    #[cfg(unix)]
    mod fake {
        use super::super::*;
        use crate::testutil::fake_command;
        use kstack_core::ErrorCategory;

        #[tokio::test]
        async fn test_check_tool() {
            let dir = tempfile::TempDir::new().unwrap();
            let ok = fake_command(dir.path(), "kind", "echo kind v0.20.0");
            let broken = fake_command(dir.path(), "broken", "exit 1");

            check_tool(ok.to_str().unwrap(), &["--version"], "https://kind.sigs.k8s.io/")
                .await
                .unwrap();

            let err = check_tool(
                broken.to_str().unwrap(),
                &["--version"],
                "https://kind.sigs.k8s.io/",
            )
            .await
            .unwrap_err();
            assert_eq!(err.category(), ErrorCategory::EnvironmentUnavailable);
            assert!(err.help().unwrap().contains("https://kind.sigs.k8s.io/"));

            let missing = dir.path().join("missing");
            let err = check_tool(missing.to_str().unwrap(), &["--version"], "u")
                .await
                .unwrap_err();
            assert!(matches!(err, KubeError::ToolUnavailable { source: Some(_), .. }));
        }

        #[tokio::test]
        async fn test_check_runtime_advice_and_verbose_output() {
            let dir = tempfile::TempDir::new().unwrap();
            let docker = fake_command(
                dir.path(),
                "docker",
                "echo 'Got permission denied while trying to connect' >&2; exit 1",
            );
            let docker = docker.to_str().unwrap();

            let err = check_runtime(docker, false).await.unwrap_err();
            let msg = err.to_string();
            assert!(msg.contains("not usable"));
            assert!(msg.contains("docker group"));
            assert!(!msg.contains("--- "));

            let err = check_runtime(docker, true).await.unwrap_err();
            assert!(err.to_string().contains("output ---"));
            assert_eq!(err.category(), ErrorCategory::EnvironmentUnavailable);
        }

        #[tokio::test]
        async fn test_check_runtime_ok() {
            let dir = tempfile::TempDir::new().unwrap();
            let docker = fake_command(dir.path(), "docker", "echo Server Version: 24");
            check_runtime(docker.to_str().unwrap(), true).await.unwrap();
        }
    }
}
