//! Workflows: up, down, addon install/uninstall/list, status, preflight
//!
//! Every addon install walks the same sequence:
//!
//! ```text
//! resolve -> repo add/update (skipped for local charts) -> merge values -> helm upgrade --install
//! ```
//!
//! Input problems (unknown addon, bad `--set`, missing values file) are
//! rejected before any repository or merge side effect. Merge artifacts are
//! released on every exit path.

use std::path::{Path, PathBuf};
use std::time::Duration;

use kstack_core::{
    AddonDescriptor, AddonRegistry, OrchestrationConfig, ReleaseInfo, merge_values_in,
    validate_set_values, validate_values_files,
};

use crate::actions::{
    DEFAULT_INSTALL_TIMEOUT, DEFAULT_UNINSTALL_TIMEOUT, InstallOptions, UninstallOptions,
};
use crate::cluster::{ClusterProvider, new_provider, set_dry_run};
use crate::error::Result;
use crate::helm::{DEFAULT_PREFLIGHT_TIMEOUT, HelmClient, PackageManager};
use crate::progress::Spinner;

/// Helm deadline for uninstalls during `down --purge-addons`
pub const PURGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Helm preflight deadline for `status` and `preflight`
const QUICK_PREFLIGHT_TIMEOUT: Duration = Duration::from_secs(5);

/// User-supplied values for one or more installs
#[derive(Debug, Clone, Default)]
pub struct ValuesRequest {
    /// Extra values files, merged after the addon defaults
    pub values_files: Vec<PathBuf>,
    /// Raw `key=val` pairs forwarded to helm
    pub set_values: Vec<String>,
    /// Select the HA variant where one exists
    pub ha: bool,
}

impl ValuesRequest {
    fn validate(&self) -> Result<()> {
        validate_values_files(&self.values_files)?;
        validate_set_values(&self.set_values)?;
        Ok(())
    }
}

/// `addons install <name>`
#[derive(Debug, Clone)]
pub struct AddonInstallRequest {
    pub name: String,
    pub values: ValuesRequest,
    pub wait: bool,
    pub atomic: bool,
    pub timeout: Duration,
}

impl AddonInstallRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: ValuesRequest::default(),
            wait: false,
            atomic: false,
            timeout: DEFAULT_INSTALL_TIMEOUT,
        }
    }
}

/// `addons uninstall <name>`
#[derive(Debug, Clone)]
pub struct AddonUninstallRequest {
    pub name: String,
    pub wait: bool,
    pub timeout: Duration,
}

impl AddonUninstallRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            wait: false,
            timeout: DEFAULT_UNINSTALL_TIMEOUT,
        }
    }
}

/// Outcome of `up`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpReport {
    pub created: bool,
    pub kubeconfig: Option<PathBuf>,
    pub installed: Vec<String>,
}

/// Outcome of `down`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DownReport {
    pub uninstalled: Vec<String>,
    /// Addons whose uninstall failed, with the error text
    pub failed: Vec<(String, String)>,
}

/// Cluster half of `status`
#[derive(Debug, Clone, PartialEq)]
pub enum ClusterStatus {
    Exists { kubeconfig: Option<PathBuf> },
    NotFound,
    Unknown(String),
}

/// Helm half of `status`
#[derive(Debug, Clone, PartialEq)]
pub enum HelmStatus {
    Unavailable(String),
    Releases(Vec<ReleaseInfo>),
    ListFailed(String),
}

/// Outcome of `status`; every failure is folded into the report
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub provider: String,
    pub cluster_name: String,
    pub namespace: String,
    pub cluster: ClusterStatus,
    pub helm: HelmStatus,
}

/// Outcome of `preflight`
#[derive(Debug, Clone, PartialEq)]
pub struct PreflightReport {
    pub provider: String,
    pub helm_version: String,
}

/// Drives a cluster provider and a package manager for one request
pub struct Orchestrator<'a> {
    config: OrchestrationConfig,
    registry: &'a AddonRegistry,
    provider: Box<dyn ClusterProvider>,
    helm: Box<dyn PackageManager>,
    dry_run: bool,
    temp_dir: PathBuf,
}

impl<'a> Orchestrator<'a> {
    /// Wire up explicit collaborators
    ///
    /// The provider is switched to dry-run when `dry_run` is set; the package
    /// manager is expected to be configured already.
    pub fn new(
        config: OrchestrationConfig,
        registry: &'a AddonRegistry,
        mut provider: Box<dyn ClusterProvider>,
        helm: Box<dyn PackageManager>,
        dry_run: bool,
    ) -> Self {
        if !set_dry_run(provider.as_mut(), dry_run) && dry_run {
            tracing::warn!("provider {} does not support dry-run", provider.provider());
        }
        Self {
            config,
            registry,
            provider,
            helm,
            dry_run,
            temp_dir: std::env::temp_dir(),
        }
    }

    /// Build the provider and helm client named by `config`
    pub fn from_config(
        config: OrchestrationConfig,
        registry: &'a AddonRegistry,
        dry_run: bool,
    ) -> Result<Self> {
        let kind = config.provider_kind()?;
        let provider = new_provider(kind, &config.cluster_name);
        let helm = HelmClient::new(config.helm_path.clone()).with_dry_run(dry_run);
        Ok(Self::new(config, registry, provider, Box::new(helm), dry_run))
    }

    /// Directory for materialized defaults and merged values
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = dir.into();
        self
    }

    pub fn config(&self) -> &OrchestrationConfig {
        &self.config
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn verbose(&self) -> bool {
        self.config.verbose || self.config.debug
    }

    /// Create the cluster if needed, then install the configured addons
    pub async fn up(&self, values: &ValuesRequest) -> Result<UpReport> {
        let c = &self.config;
        tracing::debug!(
            "config: provider={} cluster={} ns={} addons={:?} kubeconfig={:?} helm={} timeout={:?} verbose={}",
            c.provider,
            c.cluster_name,
            c.namespace,
            c.addons,
            c.kubeconfig,
            c.helm_path,
            c.timeout,
            c.verbose
        );

        let addons = if c.addons.is_empty() {
            Vec::new()
        } else {
            values.validate()?;
            self.resolve_all(&c.addons)?
        };

        if self.dry_run {
            tracing::info!("DRY-RUN: check provider CLI for {}", self.provider.provider());
            tracing::info!("DRY-RUN: check docker info");
        } else {
            self.provider.preflight(self.verbose()).await?;
        }

        let mut report = UpReport::default();

        if self.provider.exists().await? {
            tracing::info!("cluster {} already exists", c.cluster_name);
        } else {
            tracing::info!(
                "creating cluster {} with provider {}",
                c.cluster_name,
                self.provider.provider()
            );
            let spinner = Spinner::start("Creating cluster", !self.dry_run);
            self.provider.create().await?;
            spinner.stop();
            report.created = true;
        }

        match self.provider.kubeconfig_path().await {
            Ok(Some(path)) => {
                tracing::info!("kubeconfig available at: {}", path.display());
                report.kubeconfig = Some(path);
            }
            Ok(None) => {}
            Err(e) => tracing::debug!("kubeconfig not available: {}", e),
        }

        if addons.is_empty() {
            tracing::info!("no addons requested");
            return Ok(report);
        }

        self.helm_preflight(DEFAULT_PREFLIGHT_TIMEOUT).await?;

        for addon in addons {
            tracing::info!("installing addon {}...", addon.name);
            self.install_one(addon, values, true, false, DEFAULT_INSTALL_TIMEOUT)
                .await?;
            tracing::info!("addon {} installed", addon.name);
            report.installed.push(addon.name.clone());
        }

        Ok(report)
    }

    /// Delete the cluster, optionally uninstalling every known addon first
    pub async fn down(&self, purge_addons: bool) -> Result<DownReport> {
        let mut report = DownReport::default();

        if purge_addons {
            tracing::info!("purging addons before cluster deletion");
            self.helm_preflight(DEFAULT_PREFLIGHT_TIMEOUT).await?;

            for name in self.list_addons() {
                let addon = match self.registry.get(&name) {
                    Ok(addon) => addon,
                    Err(e) => {
                        tracing::debug!("skipping uninstall for {}: {}", name, e);
                        continue;
                    }
                };
                let opts = UninstallOptions::new(&addon.name, &addon.namespace)
                    .with_wait(PURGE_TIMEOUT);
                match self.helm.uninstall(&opts).await {
                    Ok(()) => {
                        tracing::info!("uninstalled addon {}", name);
                        report.uninstalled.push(name);
                    }
                    Err(e) => {
                        tracing::warn!("failed to uninstall addon {}: {}", name, e);
                        report.failed.push((name, e.to_string()));
                    }
                }
            }
        }

        tracing::info!(
            "deleting cluster {} (purge_addons={})",
            self.config.cluster_name,
            purge_addons
        );
        let spinner = Spinner::start("Deleting cluster", !self.dry_run);
        self.provider.delete().await?;
        spinner.stop();
        tracing::info!("cluster {} deleted", self.config.cluster_name);

        Ok(report)
    }

    /// Install or upgrade one addon
    pub async fn install_addon(&self, request: &AddonInstallRequest) -> Result<()> {
        self.helm_preflight(DEFAULT_PREFLIGHT_TIMEOUT).await?;

        let addon = self.registry.get(&request.name)?;
        request.values.validate()?;

        self.install_one(
            addon,
            &request.values,
            request.wait,
            request.atomic,
            request.timeout,
        )
        .await?;

        tracing::info!(
            "installed addon {} (release={}) in ns={}",
            addon.name,
            addon.name,
            addon.namespace
        );
        Ok(())
    }

    /// Uninstall one addon
    pub async fn uninstall_addon(&self, request: &AddonUninstallRequest) -> Result<()> {
        self.helm_preflight(DEFAULT_PREFLIGHT_TIMEOUT).await?;

        let addon = self.registry.get(&request.name)?;
        let mut opts = UninstallOptions::new(&addon.name, &addon.namespace)
            .with_timeout(request.timeout);
        opts.wait = request.wait;

        self.helm.uninstall(&opts).await?;
        tracing::info!("uninstalled addon {} from ns={}", addon.name, addon.namespace);
        Ok(())
    }

    /// Registered addon names, sorted
    pub fn list_addons(&self) -> Vec<String> {
        sorted_addon_names(self.registry)
    }

    /// Cluster existence, helm availability and installed releases
    pub async fn status(&self) -> StatusReport {
        let cluster = match self.provider.exists().await {
            Ok(true) => ClusterStatus::Exists {
                kubeconfig: self.provider.kubeconfig_path().await.ok().flatten(),
            },
            Ok(false) => ClusterStatus::NotFound,
            Err(e) => ClusterStatus::Unknown(e.to_string()),
        };

        let helm = match self.helm.preflight(QUICK_PREFLIGHT_TIMEOUT).await {
            Err(e) => HelmStatus::Unavailable(e.to_string()),
            Ok(version) => {
                tracing::debug!("helm version: {}", version);
                match self.helm.list_releases(&self.config.namespace).await {
                    Ok(releases) => HelmStatus::Releases(releases),
                    Err(e) => HelmStatus::ListFailed(e.to_string()),
                }
            }
        };

        StatusReport {
            provider: self.provider.provider().to_string(),
            cluster_name: self.config.cluster_name.clone(),
            namespace: self.config.namespace.clone(),
            cluster,
            helm,
        }
    }

    /// Check the provider CLI, the container runtime and helm
    pub async fn preflight(&self) -> Result<PreflightReport> {
        if self.dry_run {
            tracing::info!(
                "DRY-RUN: preflight provider CLI check for {}",
                self.provider.provider()
            );
            tracing::info!("DRY-RUN: preflight docker check");
        } else {
            self.provider.preflight(self.verbose()).await?;
        }

        let helm_version = self.helm.preflight(QUICK_PREFLIGHT_TIMEOUT).await?;
        Ok(PreflightReport {
            provider: self.provider.provider().to_string(),
            helm_version,
        })
    }

    async fn helm_preflight(&self, timeout: Duration) -> Result<()> {
        let version = self.helm.preflight(timeout).await?;
        tracing::debug!("helm version: {}", version.trim());
        Ok(())
    }

    fn resolve_all(&self, names: &[String]) -> Result<Vec<&'a AddonDescriptor>> {
        let registry: &'a AddonRegistry = self.registry;
        names
            .iter()
            .map(|name| registry.get(name).map_err(Into::into))
            .collect()
    }

    async fn install_one(
        &self,
        addon: &AddonDescriptor,
        values: &ValuesRequest,
        wait: bool,
        atomic: bool,
        timeout: Duration,
    ) -> Result<()> {
        let resolved = addon.resolve(values.ha);
        let spinner = Spinner::start(format!("Installing {}", addon.name), !self.dry_run);

        if !resolved.is_local_chart() {
            self.helm
                .repo_add(resolved.repo_name, resolved.repo_url)
                .await?;
            self.helm.repo_update().await?;
        }

        let mut sources = resolved.materialize_values(&self.temp_dir)?;
        let materialized = sources.clone();
        sources.extend(values.values_files.iter().cloned());

        let merged = match merge_values_in(&sources, None, &self.temp_dir) {
            Ok(merged) => merged,
            Err(e) => {
                discard(&materialized, &self.temp_dir);
                return Err(e.into());
            }
        };

        let mut opts = InstallOptions::new(&addon.name, resolved.chart, &addon.namespace)
            .with_values_file(merged.path())
            .with_atomic(atomic)
            .with_set_values(values.set_values.iter().cloned())
            .with_timeout(timeout);
        opts.wait = wait;

        let result = self.helm.install_or_upgrade(&opts).await;

        if let Err(e) = merged.release() {
            tracing::debug!("cleanup error: {}", e);
        }
        spinner.stop();
        result
    }
}

/// Registered addon names in display order
pub fn sorted_addon_names(registry: &AddonRegistry) -> Vec<String> {
    let mut names: Vec<String> = registry.list().into_iter().map(String::from).collect();
    names.sort();
    names
}

/// Remove materialized defaults left behind by a failed merge
fn discard(paths: &[PathBuf], temp_dir: &Path) {
    for path in paths {
        if kstack_core::values::is_within(path, temp_dir) {
            if let Err(e) = std::fs::remove_file(path) {
                tracing::debug!("cleanup error: {}", e);
            }
        }
    }
}
