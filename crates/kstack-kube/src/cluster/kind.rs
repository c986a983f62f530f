//! kind provider

use kstack_core::ProviderKind;

use super::{CliProvider, ProviderCli};

/// Command lines of the `kind` CLI
pub struct Kind;

/// Cluster provider backed by `kind`
pub type KindProvider = CliProvider<Kind>;

impl ProviderCli for Kind {
    const KIND: ProviderKind = ProviderKind::Kind;

    fn create_args(name: &str) -> Vec<String> {
        vec!["create".into(), "cluster".into(), "--name".into(), name.into()]
    }

    fn delete_args(name: &str) -> Vec<String> {
        vec!["delete".into(), "cluster".into(), "--name".into(), name.into()]
    }

    fn list_args() -> Vec<String> {
        vec!["get".into(), "clusters".into()]
    }

    fn kubeconfig_args(name: &str) -> Vec<String> {
        vec!["get".into(), "kubeconfig".into(), "--name".into(), name.into()]
    }

    fn version_args() -> &'static [&'static str] {
        &["--version"]
    }
}
