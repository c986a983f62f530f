//! Helm CLI client
//!
//! A thin wrapper around the `helm` binary. Each call builds the argument
//! list first, so dry-run logs exactly the command that would have run.

use std::time::Duration;

use async_trait::async_trait;
use kstack_core::ReleaseInfo;

use crate::actions::{InstallOptions, UninstallOptions};
use crate::error::{KubeError, Result, format_duration};
use crate::exec::{self, format_command};

/// Preflight deadline when the caller passes zero
pub const DEFAULT_PREFLIGHT_TIMEOUT: Duration = Duration::from_secs(10);

const REPO_ADD_TIMEOUT: Duration = Duration::from_secs(30);
const REPO_UPDATE_TIMEOUT: Duration = Duration::from_secs(60);
const LIST_TIMEOUT: Duration = Duration::from_secs(20);

/// Floor for the deadline of mutating helm commands
const MIN_MUTATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Package manager operations used by the orchestrator
#[async_trait]
pub trait PackageManager: Send + Sync {
    /// Check the client runs; returns its short version
    async fn preflight(&self, timeout: Duration) -> Result<String>;

    /// Register a chart repository
    async fn repo_add(&self, name: &str, url: &str) -> Result<()>;

    /// Refresh all chart repositories
    async fn repo_update(&self) -> Result<()>;

    /// Install a release, or upgrade it if it exists
    async fn install_or_upgrade(&self, opts: &InstallOptions) -> Result<()>;

    /// Remove a release
    async fn uninstall(&self, opts: &UninstallOptions) -> Result<()>;

    /// Releases in `namespace`
    async fn list_releases(&self, namespace: &str) -> Result<Vec<ReleaseInfo>>;
}

/// [`PackageManager`] backed by the helm CLI
#[derive(Debug, Clone)]
pub struct HelmClient {
    pub path: String,
    pub dry_run: bool,
}

impl HelmClient {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            dry_run: false,
        }
    }

    pub fn with_dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Run `helm args...`, or only log it in dry-run
    ///
    /// Returns `None` in dry-run, the captured output otherwise.
    async fn execute(
        &self,
        operation: &str,
        args: &[String],
        timeout: Duration,
    ) -> Result<Option<String>> {
        if self.dry_run {
            tracing::info!("DRY-RUN: {}", format_command(&self.path, args));
            return Ok(None);
        }
        let out = exec::run_checked(operation, &self.path, args, timeout).await?;
        Ok(Some(out.output))
    }
}

/// Arguments for `helm upgrade --install`
pub fn install_args(opts: &InstallOptions) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "upgrade".into(),
        "--install".into(),
        opts.release.clone(),
        opts.chart.clone(),
        "-n".into(),
        opts.namespace.clone(),
    ];
    if let Some(path) = &opts.values_path {
        args.push("-f".into());
        args.push(path.display().to_string());
    }
    args.push("--create-namespace".into());
    if opts.atomic {
        args.push("--atomic".into());
    }
    for pair in opts.set_values.iter().filter(|p| !p.is_empty()) {
        args.push("--set".into());
        args.push(pair.clone());
    }
    if opts.wait {
        args.push("--wait".into());
        args.push("--timeout".into());
        args.push(format_duration(opts.timeout));
    }
    args
}

/// Arguments for `helm uninstall`
pub fn uninstall_args(opts: &UninstallOptions) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "uninstall".into(),
        opts.release.clone(),
        "-n".into(),
        opts.namespace.clone(),
    ];
    if opts.wait {
        args.push("--timeout".into());
        args.push(format_duration(opts.timeout));
    }
    args
}

/// Parse `helm list -o json` output
pub fn parse_release_list(output: &str) -> Result<Vec<ReleaseInfo>> {
    serde_json::from_str::<Option<Vec<ReleaseInfo>>>(output.trim())
        .map(Option::unwrap_or_default)
        .map_err(|source| KubeError::ReleaseListParse {
            output: output.to_string(),
            source,
        })
}

#[async_trait]
impl PackageManager for HelmClient {
    async fn preflight(&self, timeout: Duration) -> Result<String> {
        let args: Vec<String> = vec!["version".into(), "--short".into()];
        if self.dry_run {
            tracing::info!("DRY-RUN: {}", format_command(&self.path, &args));
            return Ok("dry-run".to_string());
        }
        let timeout = if timeout.is_zero() {
            DEFAULT_PREFLIGHT_TIMEOUT
        } else {
            timeout
        };
        match exec::run_checked("helm preflight", &self.path, &args, timeout).await {
            Ok(out) => Ok(out.output.trim().to_string()),
            Err(KubeError::Spawn { source, .. }) => Err(KubeError::ToolUnavailable {
                tool: self.path.clone(),
                help: "install helm: https://helm.sh/docs/intro/install/ or point --helm at it"
                    .to_string(),
                source: Some(source),
            }),
            Err(e) => Err(e),
        }
    }

    async fn repo_add(&self, name: &str, url: &str) -> Result<()> {
        let args: Vec<String> = vec!["repo".into(), "add".into(), name.into(), url.into()];
        self.execute("helm repo add", &args, REPO_ADD_TIMEOUT)
            .await
            .map(drop)
    }

    async fn repo_update(&self) -> Result<()> {
        let args: Vec<String> = vec!["repo".into(), "update".into()];
        self.execute("helm repo update", &args, REPO_UPDATE_TIMEOUT)
            .await
            .map(drop)
    }

    async fn install_or_upgrade(&self, opts: &InstallOptions) -> Result<()> {
        let args = install_args(opts);
        let timeout = opts.timeout.max(MIN_MUTATION_TIMEOUT);
        self.execute("helm upgrade --install", &args, timeout)
            .await
            .map(drop)
    }

    async fn uninstall(&self, opts: &UninstallOptions) -> Result<()> {
        let args = uninstall_args(opts);
        let timeout = opts.timeout.max(MIN_MUTATION_TIMEOUT);
        self.execute("helm uninstall", &args, timeout).await.map(drop)
    }

    async fn list_releases(&self, namespace: &str) -> Result<Vec<ReleaseInfo>> {
        let args: Vec<String> = vec![
            "list".into(),
            "-n".into(),
            namespace.into(),
            "-o".into(),
            "json".into(),
        ];
        match self.execute("helm list", &args, LIST_TIMEOUT).await? {
            Some(output) => parse_release_list(&output),
            None => Ok(Vec::new()),
        }
    }
}
