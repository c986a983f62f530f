//! kstack core - types shared by the cluster and CLI crates
//!
//! - `AddonDescriptor` / `AddonRegistry`: the addon catalog
//! - `Values` / `merge_values`: the values merge engine and its temp artifacts
//! - `OrchestrationConfig`: layered runtime configuration
//! - `ReleaseInfo`: release snapshots as reported by helm

pub mod addon;
pub mod builtin;
pub mod config;
pub mod error;
pub mod registry;
pub mod release;
pub mod values;

pub use addon::{AddonDescriptor, HaVariant, ResolvedAddon, ValuesSource, is_local_chart};
pub use config::{ConfigOverlay, OrchestrationConfig, ProviderKind};
pub use error::{CoreError, ErrorCategory, Result};
pub use registry::{AddonRegistry, parse_addon_list};
pub use release::ReleaseInfo;
pub use values::{
    MergedValues, Values, merge_values, merge_values_in, validate_set_values,
    validate_values_files,
};
