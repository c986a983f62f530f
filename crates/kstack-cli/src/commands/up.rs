//! Up command - create the cluster and install addons

use console::style;
use kstack_kube::{Orchestrator, ValuesRequest, with_deadline};

use crate::error::Result;

/// Run the up command
pub async fn run(orchestrator: &Orchestrator<'_>, values: ValuesRequest) -> Result<()> {
    let config = orchestrator.config();
    let report = with_deadline("up", config.timeout, orchestrator.up(&values)).await?;

    let note = if orchestrator.is_dry_run() {
        format!(" {}", style("(dry-run)").dim())
    } else {
        String::new()
    };

    let state = if report.created {
        "created"
    } else {
        "already running"
    };
    println!(
        "{} Cluster {} {}{}",
        style("✓").green().bold(),
        style(&config.cluster_name).cyan(),
        state,
        note
    );
    if let Some(path) = &report.kubeconfig {
        println!("  Kubeconfig: {}", path.display());
        println!(
            "  {} export KUBECONFIG={}",
            style("→").blue(),
            path.display()
        );
    }

    for name in &report.installed {
        println!(
            "{} Addon {} installed{}",
            style("✓").green().bold(),
            style(name).cyan(),
            note
        );
    }

    Ok(())
}
