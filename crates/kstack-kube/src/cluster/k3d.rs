//! k3d provider

use kstack_core::ProviderKind;

use super::{CliProvider, ProviderCli};

/// Command lines of the `k3d` CLI
pub struct K3d;

/// Cluster provider backed by `k3d`
pub type K3dProvider = CliProvider<K3d>;

impl ProviderCli for K3d {
    const KIND: ProviderKind = ProviderKind::K3d;

    fn create_args(name: &str) -> Vec<String> {
        vec!["cluster".into(), "create".into(), name.into()]
    }

    fn delete_args(name: &str) -> Vec<String> {
        vec!["cluster".into(), "delete".into(), name.into()]
    }

    fn list_args() -> Vec<String> {
        vec!["cluster".into(), "list".into()]
    }

    fn kubeconfig_args(name: &str) -> Vec<String> {
        vec!["kubeconfig".into(), "get".into(), name.into()]
    }

    fn version_args() -> &'static [&'static str] {
        &["version"]
    }
}
