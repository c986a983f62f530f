//! Log output setup

use kstack_kube::LogWriter;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber
///
/// Logs go to stderr at `info`, or `debug` when `verbose`. `RUST_LOG`
/// overrides both. Lines are written above any running spinner.
pub fn init(verbose: bool, color: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(|| LogWriter)
        .with_target(false)
        .with_ansi(color)
        .try_init();
}
