//! Preflight command - check the local environment

use console::style;
use kstack_kube::{Orchestrator, with_deadline};

use crate::error::Result;

/// Run the preflight command
pub async fn run(orchestrator: &Orchestrator<'_>) -> Result<()> {
    let report = with_deadline(
        "preflight",
        orchestrator.config().timeout,
        orchestrator.preflight(),
    )
    .await?;

    println!("helm: {}", report.helm_version);
    println!(
        "{} preflight checks passed ({})",
        style("✓").green().bold(),
        report.provider
    );
    Ok(())
}
