//! Status command - show cluster and addon status

use console::style;
use kstack_kube::{ClusterStatus, HelmStatus, Orchestrator, with_deadline};

use crate::error::Result;

/// Run the status command
pub async fn run(orchestrator: &Orchestrator<'_>) -> Result<()> {
    let report = with_deadline("status", orchestrator.config().timeout, async {
        Ok(orchestrator.status().await)
    })
    .await?;

    println!("{}", style("CLUSTER").bold().underlined());
    println!("  Provider:   {}", report.provider);
    println!("  Name:       {}", style(&report.cluster_name).cyan());
    match &report.cluster {
        ClusterStatus::Exists { kubeconfig } => {
            println!("  Status:     {}", style("exists").green());
            if let Some(path) = kubeconfig {
                println!("  Kubeconfig: {}", path.display());
            }
        }
        ClusterStatus::NotFound => println!("  Status:     {}", style("not found").yellow()),
        ClusterStatus::Unknown(reason) => {
            println!("  Status:     {} ({})", style("unknown").red(), reason)
        }
    }

    println!(
        "\n{} (namespace={})",
        style("ADDONS").bold().underlined(),
        report.namespace
    );
    match &report.helm {
        HelmStatus::Unavailable(reason) => {
            println!("  {} helm not available ({})", style("✗").red(), reason)
        }
        HelmStatus::ListFailed(reason) => {
            println!("  {} failed to list releases: {}", style("✗").red(), reason)
        }
        HelmStatus::Releases(releases) if releases.is_empty() => println!("  none"),
        HelmStatus::Releases(releases) => {
            for release in releases {
                let status = match release.status.as_str() {
                    "deployed" => style(release.status.as_str()).green(),
                    "failed" => style(release.status.as_str()).red(),
                    s if s.starts_with("pending") => style(release.status.as_str()).yellow(),
                    _ => style(release.status.as_str()).dim(),
                };
                println!(
                    "  - {}: {} (chart={}) updated={}",
                    style(&release.name).cyan(),
                    status,
                    release.chart,
                    release.updated
                );
            }
        }
    }

    Ok(())
}
