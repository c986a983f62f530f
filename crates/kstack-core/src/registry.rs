//! Addon registry
//!
//! An explicit registry object, built once at startup and handed to the
//! orchestrator by reference. Registering a descriptor under a name that is
//! already present replaces the previous descriptor.

use std::collections::HashMap;

use crate::addon::AddonDescriptor;
use crate::builtin;
use crate::error::{CoreError, Result};

#[derive(Debug, Clone, Default)]
pub struct AddonRegistry {
    addons: HashMap<String, AddonDescriptor>,
}

impl AddonRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry populated with the built-in addon catalog
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for addon in builtin::addons() {
            registry.register(addon);
        }
        registry
    }

    /// Insert or replace a descriptor, returning the replaced one
    pub fn register(&mut self, addon: AddonDescriptor) -> Option<AddonDescriptor> {
        self.addons.insert(addon.name.clone(), addon)
    }

    /// Exact-name lookup
    pub fn get(&self, name: &str) -> Result<&AddonDescriptor> {
        self.addons.get(name).ok_or_else(|| CoreError::AddonNotFound {
            name: name.to_string(),
        })
    }

    /// Registered names, in no particular order
    pub fn list(&self) -> Vec<&str> {
        self.addons.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.addons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addons.is_empty()
    }
}

/// Parse a comma-separated addon list
///
/// Entries are trimmed and blanks dropped. Duplicates are kept.
pub fn parse_addon_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}
