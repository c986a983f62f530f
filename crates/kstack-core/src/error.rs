//! Core error types

use std::path::PathBuf;

use thiserror::Error;

/// Broad classification of a failure, used by callers to decide how to report it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// A required CLI or the container runtime is missing or unreachable
    EnvironmentUnavailable,
    /// The request itself is malformed (bad `--set`, missing file, unknown name)
    InvalidInput,
    /// A delegated tool exited non-zero or did not finish in time
    CommandFailed,
    /// Local failure not attributable to the caller (temp files, serialization)
    Internal,
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("addon not found: {name}")]
    AddonNotFound { name: String },

    #[error("unknown provider '{name}' (expected kind or k3d)")]
    UnknownProvider { name: String },

    #[error("invalid --set entries: {entries:?}; expected key=val with non-empty key")]
    InvalidSetValues { entries: Vec<String> },

    #[error("values file {} not found or unreadable", path.display())]
    ValuesFileMissing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("values file {} is not a regular file", path.display())]
    ValuesFileNotRegular { path: PathBuf },

    #[error("read values file {}", path.display())]
    ValuesRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse values file {}", path.display())]
    ValuesParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("values file {} does not contain a mapping at the top level", path.display())]
    ValuesNotMapping { path: PathBuf },

    #[error("write merged values")]
    ValuesWrite(#[source] std::io::Error),

    #[error("failed to materialize default values '{name}'")]
    Materialize {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialize values: {0}")]
    Serialize(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Classify this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            CoreError::AddonNotFound { .. }
            | CoreError::UnknownProvider { .. }
            | CoreError::InvalidSetValues { .. }
            | CoreError::ValuesFileMissing { .. }
            | CoreError::ValuesFileNotRegular { .. }
            | CoreError::ValuesRead { .. }
            | CoreError::ValuesParse { .. }
            | CoreError::ValuesNotMapping { .. } => ErrorCategory::InvalidInput,
            CoreError::ValuesWrite(_)
            | CoreError::Materialize { .. }
            | CoreError::Serialize(_)
            | CoreError::Io(_) => ErrorCategory::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
