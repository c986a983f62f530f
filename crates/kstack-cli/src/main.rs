//! kstack CLI - local Kubernetes clusters with helm-based addons

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use kstack_core::{AddonRegistry, ConfigOverlay, OrchestrationConfig, parse_addon_list};
use kstack_kube::{Orchestrator, ValuesRequest};

mod commands;
mod error;
mod exit_codes;
mod logging;

use error::Result;

#[derive(Parser)]
#[command(name = "kstack")]
#[command(version)]
#[command(about = "Create local K8s clusters and install Helm-based addons")]
#[command(
    long_about = "kstack spins up local kind/k3d clusters and installs addons like \
                  Prometheus, Grafana, Kafka and Postgres via Helm."
)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Flags shared by every subcommand
///
/// Unset flags leave the defaults in place; `KSTACK_*` variables that are
/// set override the flags.
#[derive(Args, Debug, Default)]
struct GlobalArgs {
    /// Cluster provider: kind|k3d [default: kind]
    #[arg(long, global = true)]
    provider: Option<String>,

    /// Cluster name [default: kstack]
    #[arg(long, global = true)]
    cluster: Option<String>,

    /// Comma-separated addons to install (e.g. prometheus,postgres)
    #[arg(long, global = true)]
    addons: Option<String>,

    /// Kubernetes namespace for addon status [default: kstack]
    #[arg(long, global = true)]
    namespace: Option<String>,

    /// Path to kubeconfig
    #[arg(long, global = true)]
    kubeconfig: Option<PathBuf>,

    /// Path to helm binary [default: helm]
    #[arg(long, global = true)]
    helm: Option<String>,

    /// Overall operation timeout (e.g. 10m, 90s) [default: 10m]
    #[arg(long, global = true, value_parser = parse_duration)]
    timeout: Option<Duration>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print resolved configuration and extra diagnostics
    #[arg(long, global = true)]
    debug: bool,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    /// Print planned actions without executing external commands
    #[arg(long, global = true)]
    dry_run: bool,
}

impl GlobalArgs {
    /// The explicit configuration layer
    fn overlay(&self) -> ConfigOverlay {
        ConfigOverlay {
            provider: self.provider.clone(),
            cluster_name: self.cluster.clone(),
            namespace: self.namespace.clone(),
            addons: self.addons.as_deref().map(parse_addon_list),
            kubeconfig: self.kubeconfig.clone(),
            helm_path: self.helm.clone(),
            timeout: self.timeout,
            verbose: self.verbose.then_some(true),
            debug: self.debug.then_some(true),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create cluster and install addons
    Up {
        #[command(flatten)]
        values: ValuesArgs,
    },

    /// Delete cluster (and optionally uninstall addons)
    Down {
        /// Uninstall every known addon before deleting the cluster
        #[arg(long)]
        purge_addons: bool,
    },

    /// Manage addons (install/uninstall/list)
    Addons {
        #[command(subcommand)]
        command: AddonsCommand,
    },

    /// Show cluster and addon status
    Status,

    /// Run environment preflight checks (provider CLI, Docker, Helm)
    Preflight,

    /// Print version information
    Version,
}

#[derive(Subcommand)]
enum AddonsCommand {
    /// Install an addon
    Install {
        /// Addon name
        name: String,

        /// Wait for resources to become ready (passes --wait to helm)
        #[arg(long)]
        wait: bool,

        /// Use --atomic with helm upgrade --install
        #[arg(long)]
        atomic: bool,

        /// Timeout passed to helm --timeout when --wait is set
        #[arg(long, default_value = "15m", value_parser = parse_duration)]
        helm_timeout: Duration,

        #[command(flatten)]
        values: ValuesArgs,
    },

    /// Uninstall an addon
    Uninstall {
        /// Addon name
        name: String,

        /// Wait for uninstall to complete (passes --timeout to helm)
        #[arg(long)]
        wait: bool,

        /// Timeout passed to helm for uninstall when --wait is set
        #[arg(long, default_value = "30s", value_parser = parse_duration)]
        helm_timeout: Duration,
    },

    /// List available addons
    List,
}

/// User values for installs
#[derive(Args, Debug, Default)]
struct ValuesArgs {
    /// Set values (key=val). Can be supplied multiple times
    #[arg(long = "set", value_name = "KEY=VAL")]
    set: Vec<String>,

    /// Additional values files passed to helm. Can be supplied multiple times
    #[arg(long = "values", value_name = "FILE")]
    values: Vec<PathBuf>,

    /// Install the HA variant for supported addons (e.g. postgres)
    #[arg(long)]
    ha: bool,
}

impl From<ValuesArgs> for ValuesRequest {
    fn from(args: ValuesArgs) -> Self {
        ValuesRequest {
            values_files: args.values,
            set_values: args.set,
            ha: args.ha,
        }
    }
}

fn parse_duration(s: &str) -> std::result::Result<Duration, humantime::DurationError> {
    humantime::parse_duration(s)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    miette::set_panic_hook();

    let cli = Cli::parse();
    let config = OrchestrationConfig::resolve(cli.global.overlay());
    let color = !cli.global.no_color;

    if !color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
        let _ = miette::set_hook(Box::new(|_| {
            Box::new(miette::MietteHandlerOpts::new().color(false).build())
        }));
    }
    logging::init(config.verbose || config.debug, color);

    match run(cli, config).await {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS),
        Err(err) => {
            let code = err.exit_code();
            eprintln!("{:?}", miette::Report::new(err));
            ExitCode::from(code)
        }
    }
}

async fn run(cli: Cli, config: OrchestrationConfig) -> Result<()> {
    let registry = AddonRegistry::builtin();
    let dry_run = cli.global.dry_run;

    let orchestrator = match cli.command {
        Commands::Version => {
            commands::version::run();
            return Ok(());
        }
        Commands::Addons {
            command: AddonsCommand::List,
        } => {
            commands::addons::list(&registry);
            return Ok(());
        }
        _ => {
            if dry_run {
                tracing::info!("DRY-RUN: no external commands will be executed");
            }
            Orchestrator::from_config(config, &registry, dry_run)?
        }
    };

    match cli.command {
        Commands::Up { values } => commands::up::run(&orchestrator, values.into()).await,
        Commands::Down { purge_addons } => commands::down::run(&orchestrator, purge_addons).await,
        Commands::Addons { command } => match command {
            AddonsCommand::Install {
                name,
                wait,
                atomic,
                helm_timeout,
                values,
            } => {
                commands::addons::install(
                    &orchestrator,
                    name,
                    values.into(),
                    wait,
                    atomic,
                    helm_timeout,
                )
                .await
            }
            AddonsCommand::Uninstall {
                name,
                wait,
                helm_timeout,
            } => commands::addons::uninstall(&orchestrator, name, wait, helm_timeout).await,
            AddonsCommand::List => {
                commands::addons::list(&registry);
                Ok(())
            }
        },
        Commands::Status => commands::status::run(&orchestrator).await,
        Commands::Preflight => commands::preflight::run(&orchestrator).await,
        Commands::Version => {
            commands::version::run();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_unset_flags_do_not_override() {
        let cli = Cli::try_parse_from(["kstack", "status"]).unwrap();
        assert_eq!(cli.global.overlay(), ConfigOverlay::default());
    }

    #[test]
    fn test_flags_build_overlay() {
        let cli = Cli::try_parse_from([
            "kstack",
            "--provider",
            "k3d",
            "--addons",
            "kafka, postgres",
            "--timeout",
            "2m",
            "up",
            "-v",
            "--set",
            "a=1,b=2",
        ])
        .unwrap();
        let overlay = cli.global.overlay();
        assert_eq!(overlay.provider.as_deref(), Some("k3d"));
        assert_eq!(
            overlay.addons,
            Some(vec!["kafka".to_string(), "postgres".to_string()])
        );
        assert_eq!(overlay.timeout, Some(Duration::from_secs(120)));
        assert_eq!(overlay.verbose, Some(true));

        let Commands::Up { values } = cli.command else {
            panic!("expected up");
        };
        // --set is never split on commas
        assert_eq!(values.set, vec!["a=1,b=2"]);
    }

    #[test]
    fn test_addon_install_defaults() {
        let cli = Cli::try_parse_from(["kstack", "addons", "install", "kafka"]).unwrap();
        let Commands::Addons {
            command: AddonsCommand::Install {
                helm_timeout, wait, ..
            },
        } = cli.command
        else {
            panic!("expected addons install");
        };
        assert_eq!(helm_timeout, Duration::from_secs(15 * 60));
        assert!(!wait);

        let cli = Cli::try_parse_from(["kstack", "addons", "uninstall", "kafka"]).unwrap();
        let Commands::Addons {
            command: AddonsCommand::Uninstall { helm_timeout, .. },
        } = cli.command
        else {
            panic!("expected addons uninstall");
        };
        assert_eq!(helm_timeout, Duration::from_secs(30));
    }
}
