//! External command execution
//!
//! Every command runs under a deadline with `kill_on_drop`, so a child is
//! killed both when its own deadline expires and when the caller's future is
//! dropped by an enclosing timeout.

use std::ffi::OsStr;
use std::future::Future;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::Command;

use crate::error::{KubeError, Result};

/// Captured result of a finished command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub status: ExitStatus,
    /// stdout followed by stderr
    pub output: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

/// Render a command line for logs and error messages
pub fn format_command<S: AsRef<OsStr>>(program: &str, args: &[S]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(&arg.as_ref().to_string_lossy());
    }
    line
}

/// Run `program args...` and capture its combined output
///
/// A non-zero exit is not an error here; see [`run_checked`].
pub async fn run<S: AsRef<OsStr>>(
    program: &str,
    args: &[S],
    timeout: Duration,
) -> Result<CommandOutput> {
    let command_line = format_command(program, args);
    tracing::debug!("running: {}", command_line);

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output();

    let output = match tokio::time::timeout(timeout, child).await {
        Ok(Ok(output)) => output,
        Ok(Err(source)) => {
            return Err(KubeError::Spawn {
                command: command_line,
                source,
            });
        }
        Err(_) => {
            return Err(KubeError::Timeout {
                command: command_line,
                timeout,
            });
        }
    };

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));

    Ok(CommandOutput {
        status: output.status,
        output: combined,
    })
}

/// Like [`run`], failing with the captured output on non-zero exit
pub async fn run_checked<S: AsRef<OsStr>>(
    operation: &str,
    program: &str,
    args: &[S],
    timeout: Duration,
) -> Result<CommandOutput> {
    let out = run(program, args, timeout).await?;
    if !out.success() {
        return Err(KubeError::CommandFailed {
            operation: operation.to_string(),
            status: out.status.to_string(),
            output: out.output.trim().to_string(),
        });
    }
    Ok(out)
}

/// Bound a whole workflow by `timeout`
///
/// Expiry drops `fut`, which kills any child it is awaiting.
pub async fn with_deadline<T, F>(operation: &str, timeout: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(KubeError::Timeout {
            command: operation.to_string(),
            timeout,
        }),
    }
}
