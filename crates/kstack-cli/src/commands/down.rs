//! Down command - delete the cluster

use console::style;
use kstack_kube::{Orchestrator, with_deadline};

use crate::error::Result;

/// Run the down command
pub async fn run(orchestrator: &Orchestrator<'_>, purge_addons: bool) -> Result<()> {
    let config = orchestrator.config();
    let report = with_deadline("down", config.timeout, orchestrator.down(purge_addons)).await?;

    for (name, reason) in &report.failed {
        println!(
            "{} Addon {} not uninstalled: {}",
            style("⚠").yellow(),
            style(name).cyan(),
            style(reason).dim()
        );
    }
    if purge_addons {
        println!(
            "{} Uninstalled {} addon(s)",
            style("✓").green().bold(),
            report.uninstalled.len()
        );
    }
    println!(
        "{} Cluster {} deleted",
        style("✓").green().bold(),
        style(&config.cluster_name).cyan()
    );

    Ok(())
}
