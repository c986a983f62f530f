//! Installed release snapshots

use serde::{Deserialize, Serialize};

/// One entry of `helm list -o json`
///
/// Always read fresh from helm; never cached or modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseInfo {
    pub name: String,
    pub namespace: String,
    /// Helm reports the revision as a string
    pub revision: String,
    pub updated: String,
    pub status: String,
    pub chart: String,
    #[serde(default)]
    pub app_version: String,
}

impl ReleaseInfo {
    /// Whether helm considers the release healthy
    pub fn is_deployed(&self) -> bool {
        self.status == "deployed"
    }
}
