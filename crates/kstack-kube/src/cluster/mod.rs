//! Local cluster providers
//!
//! A provider drives one local-cluster CLI (`kind` or `k3d`). Both share the
//! same execution model in [`CliProvider`] and differ only in their command
//! lines, which live in [`ProviderCli`] implementations.
//!
//! ## Dry-run
//!
//! Providers that support it expose a [`DryRunToggle`] through
//! [`ClusterProvider::as_dry_run_toggle`]. In dry-run mode every
//! state-changing call logs `DRY-RUN: <command>` and succeeds, `exists()`
//! reports `false` and `kubeconfig_path()` reports nothing.

mod k3d;
mod kind;

pub use k3d::{K3d, K3dProvider};
pub use kind::{Kind, KindProvider};

use std::io::Write;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use kstack_core::ProviderKind;

use crate::error::{KubeError, Result};
use crate::exec::{self, format_command};
use crate::preflight;

/// Deadline for `get clusters` / `cluster list`
pub const EXISTS_TIMEOUT: Duration = Duration::from_secs(10);

/// Deadline for fetching credentials
pub const KUBECONFIG_TIMEOUT: Duration = Duration::from_secs(20);

/// Upper bound for create/delete; the workflow deadline is usually shorter
pub const LIFECYCLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Operations every cluster provider supports
#[async_trait]
pub trait ClusterProvider: Send + Sync {
    /// Verify the provider CLI and container runtime are usable
    async fn preflight(&self, _verbose: bool) -> Result<()> {
        Ok(())
    }

    /// Create the cluster
    async fn create(&self) -> Result<()>;

    /// Tear the cluster down
    async fn delete(&self) -> Result<()>;

    /// Whether a cluster with this name exists
    async fn exists(&self) -> Result<bool>;

    /// Write the cluster's kubeconfig to a temp file and return its path
    async fn kubeconfig_path(&self) -> Result<Option<PathBuf>>;

    /// Logical cluster name
    fn name(&self) -> &str;

    /// Short provider id (`kind`, `k3d`)
    fn provider(&self) -> &str;

    /// Dry-run control, for providers that support it
    fn as_dry_run_toggle(&mut self) -> Option<&mut dyn DryRunToggle> {
        None
    }
}

/// Secondary capability: suppress external effects
pub trait DryRunToggle {
    fn set_dry_run(&mut self, enabled: bool);
    fn is_dry_run(&self) -> bool;
}

/// Toggle dry-run on `provider` if it supports it
///
/// Returns `false` when the provider has no dry-run support.
pub fn set_dry_run(provider: &mut dyn ClusterProvider, enabled: bool) -> bool {
    match provider.as_dry_run_toggle() {
        Some(toggle) => {
            toggle.set_dry_run(enabled);
            true
        }
        None => false,
    }
}

/// Build the provider for `kind`
pub fn new_provider(kind: ProviderKind, name: &str) -> Box<dyn ClusterProvider> {
    match kind {
        ProviderKind::Kind => Box::new(KindProvider::new(name)),
        ProviderKind::K3d => Box::new(K3dProvider::new(name)),
    }
}

/// Whether a provider's cluster listing contains `name` as a whole token
pub fn output_lists_cluster(output: &str, name: &str) -> bool {
    output.split_whitespace().any(|token| token == name)
}

/// Command lines of one provider CLI
pub trait ProviderCli: Send + Sync + 'static {
    const KIND: ProviderKind;

    fn create_args(name: &str) -> Vec<String>;
    fn delete_args(name: &str) -> Vec<String>;
    fn list_args() -> Vec<String>;
    fn kubeconfig_args(name: &str) -> Vec<String>;
    fn version_args() -> &'static [&'static str];
}

/// Provider backed by an external CLI
pub struct CliProvider<C: ProviderCli> {
    name: String,
    binary: String,
    runtime: String,
    dry_run: bool,
    preflight_passed: AtomicBool,
    _cli: PhantomData<C>,
}

impl<C: ProviderCli> CliProvider<C> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            binary: C::KIND.as_str().to_string(),
            runtime: "docker".to_string(),
            dry_run: false,
            preflight_passed: AtomicBool::new(false),
            _cli: PhantomData,
        }
    }

    /// Use a specific provider binary instead of the one on PATH
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Use a specific container runtime binary
    pub fn with_runtime(mut self, runtime: impl Into<String>) -> Self {
        self.runtime = runtime.into();
        self
    }

    pub fn with_dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    fn describe(&self, args: &[String]) -> String {
        format_command(&self.binary, args)
    }

    async fn run_lifecycle(&self, args: Vec<String>) -> Result<()> {
        let line = self.describe(&args);
        if self.dry_run {
            tracing::info!("DRY-RUN: {}", line);
            return Ok(());
        }
        let operation = format!("{} {}", C::KIND, args[..2.min(args.len())].join(" "));
        exec::run_checked(&operation, &self.binary, &args, LIFECYCLE_TIMEOUT).await?;
        Ok(())
    }
}

#[async_trait]
impl<C: ProviderCli> ClusterProvider for CliProvider<C> {
    async fn preflight(&self, verbose: bool) -> Result<()> {
        if self.dry_run || self.preflight_passed.load(Ordering::Acquire) {
            return Ok(());
        }
        preflight::check_tool(&self.binary, C::version_args(), C::KIND.install_url()).await?;
        preflight::check_runtime(&self.runtime, verbose).await?;
        self.preflight_passed.store(true, Ordering::Release);
        Ok(())
    }

    async fn create(&self) -> Result<()> {
        self.preflight(false).await?;
        self.run_lifecycle(C::create_args(&self.name)).await
    }

    async fn delete(&self) -> Result<()> {
        self.run_lifecycle(C::delete_args(&self.name)).await
    }

    async fn exists(&self) -> Result<bool> {
        let args = C::list_args();
        if self.dry_run {
            tracing::info!("DRY-RUN: {} (assume not exists)", self.describe(&args));
            return Ok(false);
        }
        let operation = format!("{} {}", C::KIND, args.join(" "));
        let out = exec::run_checked(&operation, &self.binary, &args, EXISTS_TIMEOUT).await?;
        Ok(output_lists_cluster(&out.output, &self.name))
    }

    async fn kubeconfig_path(&self) -> Result<Option<PathBuf>> {
        let args = C::kubeconfig_args(&self.name);
        if self.dry_run {
            tracing::info!("DRY-RUN: {}", self.describe(&args));
            return Ok(None);
        }
        let operation = format!("{} {}", C::KIND, args[..2.min(args.len())].join(" "));
        let out = exec::run_checked(&operation, &self.binary, &args, KUBECONFIG_TIMEOUT).await?;
        if out.output.trim().is_empty() {
            return Ok(None);
        }

        let mut file = tempfile::Builder::new()
            .prefix(&format!("{}-kubeconfig-", C::KIND))
            .tempfile()
            .map_err(KubeError::Kubeconfig)?;
        file.write_all(out.output.as_bytes())
            .map_err(KubeError::Kubeconfig)?;
        let (_, path) = file.keep().map_err(|e| KubeError::Kubeconfig(e.into()))?;

        tracing::debug!("wrote {} kubeconfig to {}", C::KIND, path.display());
        Ok(Some(path))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn provider(&self) -> &str {
        C::KIND.as_str()
    }

    fn as_dry_run_toggle(&mut self) -> Option<&mut dyn DryRunToggle> {
        Some(self)
    }
}

impl<C: ProviderCli> DryRunToggle for CliProvider<C> {
    fn set_dry_run(&mut self, enabled: bool) {
        self.dry_run = enabled;
    }

    fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}
