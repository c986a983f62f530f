//! Standard exit codes for CLI operations
//!
//! Usage errors detected by clap exit with clap's own code (2).

/// Success - operation completed without errors
pub const SUCCESS: u8 = 0;

/// General error - unspecified failure
pub const ERROR: u8 = 1;

/// Invalid input - unknown addon or provider, bad `--set`, missing values file
pub const INPUT_ERROR: u8 = 2;

/// Environment error - provider CLI, docker or helm missing or unusable
pub const ENVIRONMENT_ERROR: u8 = 3;

/// An external command (kind, k3d, helm) failed
pub const COMMAND_FAILED: u8 = 4;

/// The operation did not finish before `--timeout`
pub const TIMEOUT: u8 = 5;
