//! CLI error types with exit code handling
//!
//! Library errors are classified by category and rendered as miette
//! diagnostics, keeping the full cause chain in the message.

use std::error::Error as StdError;

use kstack_core::{CoreError, ErrorCategory};
use kstack_kube::KubeError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// A required tool or the container runtime is unusable
    #[error("{message}")]
    #[diagnostic(code(kstack::cli::environment))]
    Environment {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// The request was rejected before any side effect
    #[error("{message}")]
    #[diagnostic(code(kstack::cli::input))]
    Input {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// kind, k3d or helm exited non-zero
    #[error("{message}")]
    #[diagnostic(code(kstack::cli::command))]
    CommandFailed {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("{message}")]
    #[diagnostic(code(kstack::cli::timeout))]
    Timeout {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Internal error: {message}")]
    #[diagnostic(code(kstack::cli::internal))]
    Internal { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Environment { .. } => exit_codes::ENVIRONMENT_ERROR,
            CliError::Input { .. } => exit_codes::INPUT_ERROR,
            CliError::CommandFailed { .. } => exit_codes::COMMAND_FAILED,
            CliError::Timeout { .. } => exit_codes::TIMEOUT,
            CliError::Internal { .. } => exit_codes::ERROR,
        }
    }

    fn categorized(category: ErrorCategory, message: String, help: Option<String>) -> Self {
        match category {
            ErrorCategory::EnvironmentUnavailable => CliError::Environment { message, help },
            ErrorCategory::InvalidInput => CliError::Input { message, help },
            ErrorCategory::CommandFailed => CliError::CommandFailed { message, help },
            ErrorCategory::Internal => CliError::Internal { message },
        }
    }
}

impl From<KubeError> for CliError {
    fn from(err: KubeError) -> Self {
        let message = describe(&err);
        let help = err.help();
        if err.is_timeout() {
            return CliError::Timeout { message, help };
        }
        Self::categorized(err.category(), message, help)
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        Self::categorized(err.category(), describe(&err), None)
    }
}

/// Error message followed by each cause not already part of it
fn describe(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
