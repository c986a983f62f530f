//! Error types for kstack-kube

use std::time::Duration;

use kstack_core::{CoreError, ErrorCategory};
use thiserror::Error;

/// Result type for kstack-kube operations
pub type Result<T> = std::result::Result<T, KubeError>;

/// Errors raised while driving the provider CLIs and helm
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KubeError {
    /// A required CLI is missing or does not run
    #[error("{tool} CLI not found or not executable")]
    ToolUnavailable {
        tool: String,
        help: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// The container runtime binary exists but the daemon is unusable
    #[error("{runtime} is installed but not usable: {message}{advice}")]
    RuntimeUnavailable {
        runtime: String,
        message: String,
        advice: String,
    },

    /// The process could not be started
    #[error("failed to run `{command}`")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The process did not finish before its deadline and was killed
    #[error("`{command}` did not finish within {}", format_duration(*.timeout))]
    Timeout { command: String, timeout: Duration },

    /// The process exited non-zero
    #[error("{operation} failed ({status}): {output}")]
    CommandFailed {
        operation: String,
        status: String,
        output: String,
    },

    /// `helm list -o json` returned something other than a release list
    #[error("parse helm list output: {source}: {output}")]
    ReleaseListParse {
        output: String,
        #[source]
        source: serde_json::Error,
    },

    /// Writing fetched credentials to disk failed
    #[error("failed to write kubeconfig to temp file")]
    Kubeconfig(#[source] std::io::Error),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl KubeError {
    /// Classify this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            KubeError::ToolUnavailable { .. } | KubeError::RuntimeUnavailable { .. } => {
                ErrorCategory::EnvironmentUnavailable
            }
            KubeError::Spawn { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                ErrorCategory::EnvironmentUnavailable
            }
            KubeError::Spawn { .. }
            | KubeError::Timeout { .. }
            | KubeError::CommandFailed { .. }
            | KubeError::ReleaseListParse { .. } => ErrorCategory::CommandFailed,
            KubeError::Core(e) => e.category(),
            KubeError::Kubeconfig(_) => ErrorCategory::Internal,
        }
    }

    /// Remediation hint, when there is one
    pub fn help(&self) -> Option<String> {
        match self {
            KubeError::ToolUnavailable { help, .. } => Some(help.clone()),
            KubeError::RuntimeUnavailable { runtime, .. } => {
                Some(format!("make sure the {runtime} daemon is running and reachable"))
            }
            KubeError::Spawn { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                Some("install the missing tool and make sure it is on PATH".to_string())
            }
            KubeError::Timeout { .. } => {
                Some("increase --timeout (or --helm-timeout for addon installs)".to_string())
            }
            _ => None,
        }
    }

    /// Whether this is a deadline expiry
    pub fn is_timeout(&self) -> bool {
        matches!(self, KubeError::Timeout { .. })
    }
}

/// Render a duration the way Go (and therefore helm) prints it: `15m0s`, `30s`, `1h0m0s`, `500ms`
pub fn format_duration(d: Duration) -> String {
    let total_ms = d.as_millis();
    if total_ms == 0 {
        return "0s".to_string();
    }
    if total_ms < 1000 {
        return format!("{total_ms}ms");
    }

    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let millis = total_ms % 60_000;
    let seconds = if millis % 1000 == 0 {
        format!("{}", millis / 1000)
    } else {
        let frac = format!("{:03}", millis % 1000);
        format!("{}.{}", millis / 1000, frac.trim_end_matches('0'))
    };

    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::ZERO), "0s");
        assert_eq!(format_duration(Duration::from_millis(500)), "500ms");
        assert_eq!(format_duration(Duration::from_secs(30)), "30s");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_secs(15 * 60)), "15m0s");
        assert_eq!(format_duration(Duration::from_secs(3600)), "1h0m0s");
        assert_eq!(format_duration(Duration::from_secs(3725)), "1h2m5s");
    }

    #[test]
    fn test_categories() {
        let missing = KubeError::Spawn {
            command: "kind get clusters".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(missing.category(), ErrorCategory::EnvironmentUnavailable);
        assert!(missing.help().is_some());

        let failed = KubeError::CommandFailed {
            operation: "helm upgrade --install".into(),
            status: "exit status: 1".into(),
            output: "Error: boom".into(),
        };
        assert_eq!(failed.category(), ErrorCategory::CommandFailed);
        assert!(failed.to_string().contains("Error: boom"));

        let input = KubeError::from(CoreError::AddonNotFound { name: "x".into() });
        assert_eq!(input.category(), ErrorCategory::InvalidInput);
    }

    #[test]
    fn test_kubeconfig_write_failure_is_internal() {
        let err = KubeError::Kubeconfig(std::io::Error::from(std::io::ErrorKind::PermissionDenied));
        assert_eq!(err.category(), ErrorCategory::Internal);
        assert!(std::error::Error::source(&err).is_some());
        assert!(!err.is_timeout());
    }
}
