//! kstack kube - drives local cluster tooling and helm
//!
//! This crate provides:
//! - **Cluster Providers**: `kind` and `k3d` behind one trait, with dry-run support
//! - **Helm Client**: repo sync, `upgrade --install`, uninstall, release listing
//! - **Preflight**: provider CLI and container runtime checks with remediation hints
//! - **Orchestrator**: the `up` / `down` / addon / status workflows
//! - **Progress Reporting**: a terminal spinner for long-running steps

pub mod actions;
pub mod cluster;
pub mod error;
pub mod exec;
pub mod helm;
pub mod orchestrator;
pub mod preflight;
pub mod progress;

#[cfg(all(test, unix))]
pub(crate) mod testutil;

pub use actions::{InstallOptions, UninstallOptions};
pub use cluster::{
    ClusterProvider, DryRunToggle, K3dProvider, KindProvider, new_provider, output_lists_cluster,
    set_dry_run,
};
pub use error::{KubeError, Result, format_duration};
pub use exec::with_deadline;
pub use helm::{HelmClient, PackageManager};
pub use orchestrator::{
    AddonInstallRequest, AddonUninstallRequest, ClusterStatus, DownReport, HelmStatus,
    Orchestrator, PreflightReport, StatusReport, UpReport, ValuesRequest, sorted_addon_names,
};
pub use progress::{LogWriter, Spinner};
