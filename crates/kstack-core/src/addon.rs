//! Addon descriptors
//!
//! An addon is a helm chart plus everything needed to install it: where the
//! chart comes from, which namespace it lands in, and which default values
//! files go first in the merge.

use std::borrow::Cow;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};

/// A default values source attached to an addon
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValuesSource {
    /// Values compiled into the binary, written to a fresh temp file on use
    Embedded {
        name: Cow<'static, str>,
        content: Cow<'static, str>,
    },
    /// A values file on disk, used only if it exists when the addon is resolved
    File(PathBuf),
}

impl ValuesSource {
    pub fn embedded(
        name: impl Into<Cow<'static, str>>,
        content: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::Embedded {
            name: name.into(),
            content: content.into(),
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    /// Produce a path helm can read
    ///
    /// Embedded payloads are persisted as `kstack-<name>-values-*` under
    /// `temp_dir`, which makes them eligible for removal when the merge that
    /// consumed them is released. Missing files yield `None`.
    pub fn materialize(&self, temp_dir: &Path) -> Result<Option<PathBuf>> {
        match self {
            ValuesSource::Embedded { name, content } => {
                let to_err = |source: std::io::Error| CoreError::Materialize {
                    name: name.to_string(),
                    source,
                };
                let mut file = tempfile::Builder::new()
                    .prefix(&format!("kstack-{name}-values-"))
                    .tempfile_in(temp_dir)
                    .map_err(to_err)?;
                file.write_all(content.as_bytes()).map_err(to_err)?;
                let (_, path) = file.keep().map_err(|e| to_err(e.into()))?;
                Ok(Some(path))
            }
            ValuesSource::File(path) => Ok(path.is_file().then(|| path.clone())),
        }
    }
}

/// Alternate chart selected with `--ha`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HaVariant {
    pub chart: String,
    pub repo_name: String,
    pub repo_url: String,
    /// Merged after the addon's base defaults
    pub values: Vec<ValuesSource>,
}

/// Immutable description of an installable addon
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddonDescriptor {
    /// Logical name, also used as the release name
    pub name: String,
    /// Chart reference (`repo/chart` or a local path)
    pub chart: String,
    /// Repository name, empty for local charts
    pub repo_name: String,
    /// Repository URL, empty for local charts
    pub repo_url: String,
    /// Target namespace
    pub namespace: String,
    /// Default values, merged in order before user values
    pub values: Vec<ValuesSource>,
    pub ha: Option<HaVariant>,
}

impl AddonDescriptor {
    pub fn new(
        name: impl Into<String>,
        chart: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            chart: chart.into(),
            repo_name: String::new(),
            repo_url: String::new(),
            namespace: namespace.into(),
            values: Vec::new(),
            ha: None,
        }
    }

    pub fn with_repo(mut self, name: impl Into<String>, url: impl Into<String>) -> Self {
        self.repo_name = name.into();
        self.repo_url = url.into();
        self
    }

    pub fn with_values(mut self, source: ValuesSource) -> Self {
        self.values.push(source);
        self
    }

    pub fn with_ha(mut self, variant: HaVariant) -> Self {
        self.ha = Some(variant);
        self
    }

    /// Chart coordinates and default values for one install
    ///
    /// `ha` is ignored for addons without an HA variant.
    pub fn resolve(&self, ha: bool) -> ResolvedAddon<'_> {
        match (&self.ha, ha) {
            (Some(variant), true) => ResolvedAddon {
                name: &self.name,
                namespace: &self.namespace,
                chart: &variant.chart,
                repo_name: &variant.repo_name,
                repo_url: &variant.repo_url,
                values: self.values.iter().chain(variant.values.iter()).collect(),
            },
            _ => ResolvedAddon {
                name: &self.name,
                namespace: &self.namespace,
                chart: &self.chart,
                repo_name: &self.repo_name,
                repo_url: &self.repo_url,
                values: self.values.iter().collect(),
            },
        }
    }
}

/// An addon with its chart variant chosen
#[derive(Debug, Clone)]
pub struct ResolvedAddon<'a> {
    pub name: &'a str,
    pub namespace: &'a str,
    pub chart: &'a str,
    pub repo_name: &'a str,
    pub repo_url: &'a str,
    pub values: Vec<&'a ValuesSource>,
}

impl ResolvedAddon<'_> {
    /// Local charts need no repository sync
    pub fn is_local_chart(&self) -> bool {
        is_local_chart(self.chart)
    }

    /// Materialize all default values sources in order
    ///
    /// On failure, files already written for this call are removed.
    pub fn materialize_values(&self, temp_dir: &Path) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::with_capacity(self.values.len());
        let mut written = Vec::new();
        for source in &self.values {
            match source.materialize(temp_dir) {
                Ok(Some(path)) => {
                    if matches!(source, ValuesSource::Embedded { .. }) {
                        written.push(path.clone());
                    }
                    paths.push(path);
                }
                Ok(None) => {}
                Err(e) => {
                    for path in &written {
                        let _ = std::fs::remove_file(path);
                    }
                    return Err(e);
                }
            }
        }
        Ok(paths)
    }
}

/// A chart reference is local when it is a relative (`./`) or absolute path
pub fn is_local_chart(chart: &str) -> bool {
    chart.starts_with("./") || chart.starts_with('/')
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn postgres() -> AddonDescriptor {
        AddonDescriptor::new("postgres", "bitnami/postgresql", "postgres")
            .with_repo("bitnami", "https://charts.bitnami.com/bitnami")
            .with_values(ValuesSource::embedded("postgres", "auth:\n  database: app\n"))
            .with_ha(HaVariant {
                chart: "bitnami/postgresql-ha".into(),
                repo_name: "bitnami".into(),
                repo_url: "https://charts.bitnami.com/bitnami".into(),
                values: vec![ValuesSource::embedded("postgres-ha", "pgpool:\n  replicaCount: 2\n")],
            })
    }

    #[test]
    fn test_resolve_default_variant() {
        let addon = postgres();
        let resolved = addon.resolve(false);

        assert_eq!(resolved.chart, "bitnami/postgresql");
        assert_eq!(resolved.values.len(), 1);
        assert!(!resolved.is_local_chart());
    }

    #[test]
    fn test_resolve_ha_variant_appends_values() {
        let addon = postgres();
        let resolved = addon.resolve(true);

        assert_eq!(resolved.chart, "bitnami/postgresql-ha");
        assert_eq!(resolved.values.len(), 2);
        assert_eq!(
            resolved.values[1],
            &ValuesSource::embedded("postgres-ha", "pgpool:\n  replicaCount: 2\n")
        );
    }

    #[test]
    fn test_ha_ignored_without_variant() {
        let addon = AddonDescriptor::new("kafka", "bitnami/kafka", "kafka");
        assert_eq!(addon.resolve(true).chart, "bitnami/kafka");
    }

    #[test]
    fn test_is_local_chart() {
        assert!(is_local_chart("./charts/example-app"));
        assert!(is_local_chart("/opt/charts/app"));
        assert!(!is_local_chart("bitnami/kafka"));
        assert!(!is_local_chart("charts/app"));
    }

    #[test]
    fn test_materialize_embedded_and_files() {
        let temp = TempDir::new().unwrap();
        let existing = temp.path().join("values.yaml");
        std::fs::write(&existing, "a: 1\n").unwrap();

        let addon = AddonDescriptor::new("app", "./chart", "app")
            .with_values(ValuesSource::embedded("app", "b: 2\n"))
            .with_values(ValuesSource::file(&existing))
            .with_values(ValuesSource::file(temp.path().join("missing.yaml")));

        let paths = addon.resolve(false).materialize_values(temp.path()).unwrap();

        assert_eq!(paths.len(), 2);
        assert!(paths[0]
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("kstack-app-values-"));
        assert_eq!(std::fs::read_to_string(&paths[0]).unwrap(), "b: 2\n");
        assert_eq!(paths[1], existing);
    }
}
