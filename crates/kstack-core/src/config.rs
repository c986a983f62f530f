//! Runtime configuration
//!
//! The effective configuration is built in layers: compiled-in defaults,
//! then explicit caller input (CLI flags), then the `KSTACK_*` environment.
//! Each layer only overrides the fields it actually sets; empty strings and
//! empty lists count as unset.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::CoreError;
use crate::registry::parse_addon_list;

pub const ENV_PROVIDER: &str = "KSTACK_PROVIDER";
pub const ENV_CLUSTER: &str = "KSTACK_CLUSTER";
pub const ENV_ADDONS: &str = "KSTACK_ADDONS";
pub const ENV_NAMESPACE: &str = "KSTACK_NAMESPACE";
pub const ENV_KUBECONFIG: &str = "KSTACK_KUBECONFIG";
pub const ENV_HELM: &str = "KSTACK_HELM";
pub const ENV_TIMEOUT: &str = "KSTACK_TIMEOUT";
pub const ENV_VERBOSE: &str = "KSTACK_VERBOSE";
pub const ENV_DEBUG: &str = "KSTACK_DEBUG";

/// Default overall operation timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Supported local cluster tools
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Kind,
    K3d,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Kind => "kind",
            ProviderKind::K3d => "k3d",
        }
    }

    /// Where to get the provider CLI
    pub fn install_url(&self) -> &'static str {
        match self {
            ProviderKind::Kind => "https://kind.sigs.k8s.io/",
            ProviderKind::K3d => "https://k3d.io/",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "kind" => Ok(ProviderKind::Kind),
            "k3d" => Ok(ProviderKind::K3d),
            other => Err(CoreError::UnknownProvider {
                name: other.to_string(),
            }),
        }
    }
}

/// Resolved runtime configuration
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestrationConfig {
    /// Provider selector, validated when the provider is built
    pub provider: String,
    pub cluster_name: String,
    pub namespace: String,
    pub addons: Vec<String>,
    /// Explicit kubeconfig path, if the caller supplied one
    pub kubeconfig: Option<PathBuf>,
    pub helm_path: String,
    pub timeout: Duration,
    pub verbose: bool,
    pub debug: bool,
}

impl Default for OrchestrationConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Kind.to_string(),
            cluster_name: "kstack".to_string(),
            namespace: "kstack".to_string(),
            addons: Vec::new(),
            kubeconfig: None,
            helm_path: "helm".to_string(),
            timeout: DEFAULT_TIMEOUT,
            verbose: false,
            debug: false,
        }
    }
}

impl OrchestrationConfig {
    /// Defaults, then `explicit`, then environment
    pub fn resolve(explicit: ConfigOverlay) -> Self {
        Self::resolve_with(explicit, ConfigOverlay::from_env())
    }

    /// Like [`resolve`](Self::resolve) with an explicit environment layer
    pub fn resolve_with(explicit: ConfigOverlay, env: ConfigOverlay) -> Self {
        Self::default().overlay(explicit).overlay(env)
    }

    /// Apply one layer on top of this configuration
    pub fn overlay(mut self, layer: ConfigOverlay) -> Self {
        fn set_string(target: &mut String, value: Option<String>) {
            if let Some(v) = value.filter(|v| !v.is_empty()) {
                *target = v;
            }
        }

        set_string(&mut self.provider, layer.provider);
        set_string(&mut self.cluster_name, layer.cluster_name);
        set_string(&mut self.namespace, layer.namespace);
        set_string(&mut self.helm_path, layer.helm_path);

        if let Some(addons) = layer.addons.filter(|a| !a.is_empty()) {
            self.addons = addons;
        }
        if let Some(path) = layer.kubeconfig.filter(|p| !p.as_os_str().is_empty()) {
            self.kubeconfig = Some(path);
        }
        if let Some(timeout) = layer.timeout {
            self.timeout = timeout;
        }
        if let Some(verbose) = layer.verbose {
            self.verbose = verbose;
        }
        if let Some(debug) = layer.debug {
            self.debug = debug;
        }
        self
    }

    /// Parsed provider selector
    pub fn provider_kind(&self) -> Result<ProviderKind, CoreError> {
        self.provider.parse()
    }
}

/// One configuration layer; `None` leaves the lower layer's value in place
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverlay {
    pub provider: Option<String>,
    pub cluster_name: Option<String>,
    pub namespace: Option<String>,
    pub addons: Option<Vec<String>>,
    pub kubeconfig: Option<PathBuf>,
    pub helm_path: Option<String>,
    pub timeout: Option<Duration>,
    pub verbose: Option<bool>,
    pub debug: Option<bool>,
}

impl ConfigOverlay {
    /// Layer read from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Layer read through an arbitrary variable lookup
    ///
    /// Unparsable timeouts are ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        Self {
            provider: get(ENV_PROVIDER),
            cluster_name: get(ENV_CLUSTER),
            namespace: get(ENV_NAMESPACE),
            addons: get(ENV_ADDONS).map(|v| parse_addon_list(&v)),
            kubeconfig: get(ENV_KUBECONFIG).map(PathBuf::from),
            helm_path: get(ENV_HELM),
            timeout: get(ENV_TIMEOUT).and_then(|v| humantime::parse_duration(&v).ok()),
            verbose: get(ENV_VERBOSE).map(|v| is_truthy(&v)),
            debug: get(ENV_DEBUG).map(|v| is_truthy(&v)),
        }
    }
}

/// `true` (any case) or `1`
pub fn is_truthy(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}
