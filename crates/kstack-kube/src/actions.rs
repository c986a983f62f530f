//! Action options for install and uninstall operations

use std::path::PathBuf;
use std::time::Duration;

/// Default helm timeout for addon installs
pub const DEFAULT_INSTALL_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// Default helm timeout for addon uninstalls
pub const DEFAULT_UNINSTALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Options for `helm upgrade --install`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOptions {
    /// Release name
    pub release: String,

    /// Chart reference (`repo/chart` or a local path)
    pub chart: String,

    /// Target namespace, created if missing
    pub namespace: String,

    /// Merged values file passed with `-f`
    pub values_path: Option<PathBuf>,

    /// Wait for resources to be ready
    pub wait: bool,

    /// Passed to helm with `--wait`; also bounds the command itself
    pub timeout: Duration,

    /// Roll back on failure
    pub atomic: bool,

    /// Raw `key=val` pairs forwarded as `--set`
    pub set_values: Vec<String>,
}

impl InstallOptions {
    /// Options for installing `chart` as `release` into `namespace`
    pub fn new(
        release: impl Into<String>,
        chart: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            release: release.into(),
            chart: chart.into(),
            namespace: namespace.into(),
            values_path: None,
            wait: false,
            timeout: DEFAULT_INSTALL_TIMEOUT,
            atomic: false,
            set_values: Vec::new(),
        }
    }

    pub fn with_values_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.values_path = Some(path.into());
        self
    }

    /// Wait for resources, up to `timeout`
    pub fn with_wait(mut self, timeout: Duration) -> Self {
        self.wait = true;
        self.timeout = timeout;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_atomic(mut self, atomic: bool) -> Self {
        self.atomic = atomic;
        self
    }

    pub fn with_set_values(mut self, pairs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.set_values = pairs.into_iter().map(Into::into).collect();
        self
    }
}

/// Options for `helm uninstall`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UninstallOptions {
    /// Release name
    pub release: String,

    /// Release namespace
    pub namespace: String,

    /// Pass `--timeout` to helm
    pub wait: bool,

    /// Timeout for the uninstall
    pub timeout: Duration,
}

impl UninstallOptions {
    pub fn new(release: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            release: release.into(),
            namespace: namespace.into(),
            wait: false,
            timeout: DEFAULT_UNINSTALL_TIMEOUT,
        }
    }

    /// Wait for deletion, up to `timeout`
    pub fn with_wait(mut self, timeout: Duration) -> Self {
        self.wait = true;
        self.timeout = timeout;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
