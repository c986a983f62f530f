//! Addons commands - install, uninstall and list addons

use std::time::Duration;

use console::style;
use kstack_core::AddonRegistry;
use kstack_kube::{
    AddonInstallRequest, AddonUninstallRequest, Orchestrator, ValuesRequest, sorted_addon_names,
    with_deadline,
};

use crate::error::Result;

/// Install a single addon
pub async fn install(
    orchestrator: &Orchestrator<'_>,
    name: String,
    values: ValuesRequest,
    wait: bool,
    atomic: bool,
    helm_timeout: Duration,
) -> Result<()> {
    let request = AddonInstallRequest {
        name,
        values,
        wait,
        atomic,
        timeout: helm_timeout,
    };

    println!(
        "{} Installing addon {}",
        style("→").blue(),
        style(&request.name).cyan()
    );
    with_deadline(
        "addons install",
        orchestrator.config().timeout,
        orchestrator.install_addon(&request),
    )
    .await?;
    println!(
        "{} Addon {} installed",
        style("✓").green().bold(),
        style(&request.name).cyan()
    );
    Ok(())
}

/// Uninstall a single addon
pub async fn uninstall(
    orchestrator: &Orchestrator<'_>,
    name: String,
    wait: bool,
    helm_timeout: Duration,
) -> Result<()> {
    let request = AddonUninstallRequest {
        name,
        wait,
        timeout: helm_timeout,
    };

    with_deadline(
        "addons uninstall",
        orchestrator.config().timeout,
        orchestrator.uninstall_addon(&request),
    )
    .await?;
    println!(
        "{} Addon {} uninstalled",
        style("✓").green().bold(),
        style(&request.name).cyan()
    );
    Ok(())
}

/// List the built-in addons
pub fn list(registry: &AddonRegistry) {
    let names = sorted_addon_names(registry);
    tracing::info!("Available addons: {:?}", names);

    println!("{}", style("AVAILABLE ADDONS").bold().underlined());
    for name in &names {
        let Ok(addon) = registry.get(name) else {
            continue;
        };
        let ha = if addon.ha.is_some() {
            format!(" {}", style("[ha]").dim())
        } else {
            String::new()
        };
        println!(
            "  {:<14} {:<36} ns={}{}",
            style(name).cyan(),
            addon.chart,
            style(&addon.namespace).yellow(),
            ha
        );
    }
}
