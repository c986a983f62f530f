//! Values merging for addon installs
//!
//! Every install hands helm exactly one values file. That file is produced
//! here by folding an ordered list of YAML documents (addon defaults first,
//! user files after) plus an optional override document into a single
//! mapping, then writing it to a fresh file in the temp area.
//!
//! Merge rules:
//! - Mappings merge recursively, keys accumulate across all sources
//! - Scalars and lists from a later source replace earlier ones wholesale
//! - Overrides are applied last with the same rules

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};

const MERGED_VALUES_PREFIX: &str = "kstack-merged-values-";

/// A values document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Values(pub JsonValue);

impl Values {
    /// Create empty values
    pub fn new() -> Self {
        Self(JsonValue::Object(serde_json::Map::new()))
    }

    /// Load values from a YAML file
    ///
    /// An empty file is an empty mapping. Any other non-mapping document is
    /// rejected, since helm expects a mapping at the root.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| CoreError::ValuesRead {
            path: path.to_path_buf(),
            source,
        })?;
        let value: JsonValue =
            serde_yaml::from_str(&content).map_err(|source| CoreError::ValuesParse {
                path: path.to_path_buf(),
                source,
            })?;
        match value {
            JsonValue::Null => Ok(Self::new()),
            JsonValue::Object(_) => Ok(Self(value)),
            _ => Err(CoreError::ValuesNotMapping {
                path: path.to_path_buf(),
            }),
        }
    }

    /// Parse values from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let value: JsonValue = serde_yaml::from_str(yaml)?;
        match value {
            JsonValue::Null => Ok(Self::new()),
            other => Ok(Self(other)),
        }
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.0)?)
    }

    /// Deep merge another Values into this one
    pub fn merge(&mut self, overlay: &Values) {
        deep_merge(&mut self.0, &overlay.0);
    }

    /// Fold values left to right
    pub fn merge_all<'a>(values: impl IntoIterator<Item = &'a Values>) -> Self {
        let mut result = Values::new();
        for v in values {
            result.merge(v);
        }
        result
    }

    /// Set a value by dotted path (e.g., "auth.password")
    pub fn set(&mut self, path: &str, value: JsonValue) {
        let parts: Vec<&str> = path.split('.').collect();
        set_nested(&mut self.0, &parts, value);
    }

    /// Get a value by dotted path
    pub fn get(&self, path: &str) -> Option<&JsonValue> {
        path.split('.')
            .try_fold(&self.0, |value, key| value.as_object()?.get(key))
    }

    /// Get the inner JSON value
    pub fn inner(&self) -> &JsonValue {
        &self.0
    }

    /// Check if values are empty
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            JsonValue::Object(map) => map.is_empty(),
            JsonValue::Null => true,
            _ => false,
        }
    }
}

/// Deep merge two JSON values
///
/// Overlay values are cloned into the base, so the result never shares
/// structure with any source document.
fn deep_merge(base: &mut JsonValue, overlay: &JsonValue) {
    match (base, overlay) {
        (JsonValue::Object(base_map), JsonValue::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => {
                        base_map.insert(key.clone(), overlay_value.clone());
                    }
                }
            }
        }
        (base, overlay) => {
            *base = overlay.clone();
        }
    }
}

fn set_nested(value: &mut JsonValue, path: &[&str], new_value: JsonValue) {
    let Some((key, remaining)) = path.split_first() else {
        *value = new_value;
        return;
    };

    if !value.is_object() {
        *value = JsonValue::Object(serde_json::Map::new());
    }

    if let JsonValue::Object(map) = value {
        let entry = map
            .entry(key.to_string())
            .or_insert_with(|| JsonValue::Object(serde_json::Map::new()));
        set_nested(entry, remaining, new_value);
    }
}

/// Result of a merge, materialized as a file in the temp area
///
/// The artifact belongs to the caller until [`MergedValues::release`] is
/// called. Releasing removes the merged file and every input source that
/// lives inside the temp area (materialized addon defaults); inputs anywhere
/// else are left alone. Dropping without releasing performs the same removal
/// and discards errors.
#[derive(Debug)]
pub struct MergedValues {
    path: PathBuf,
    temp_dir: PathBuf,
    sources: Vec<PathBuf>,
    released: bool,
}

impl MergedValues {
    /// Path of the merged values file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the merged file and any temp-area inputs
    ///
    /// Every removal is attempted; the last failure is returned.
    pub fn release(mut self) -> std::io::Result<()> {
        self.released = true;
        self.remove_all()
    }

    fn remove_all(&self) -> std::io::Result<()> {
        let mut last_err = None;

        if let Err(e) = fs::remove_file(&self.path) {
            last_err = Some(e);
        }

        for source in &self.sources {
            if is_within(source, &self.temp_dir) {
                if let Err(e) = fs::remove_file(source) {
                    last_err = Some(e);
                }
            }
        }

        match last_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Drop for MergedValues {
    fn drop(&mut self) {
        if !self.released {
            let _ = self.remove_all();
        }
    }
}

/// Merge `sources` in order, then `overrides`, into a fresh file under the
/// system temp directory
pub fn merge_values(sources: &[PathBuf], overrides: Option<&Values>) -> Result<MergedValues> {
    merge_values_in(sources, overrides, &std::env::temp_dir())
}

/// Like [`merge_values`] with an explicit temp area
pub fn merge_values_in(
    sources: &[PathBuf],
    overrides: Option<&Values>,
    temp_dir: &Path,
) -> Result<MergedValues> {
    let mut merged = Values::new();

    for source in sources {
        if source.as_os_str().is_empty() {
            continue;
        }
        merged.merge(&Values::from_file(source)?);
    }

    if let Some(overrides) = overrides {
        merged.merge(overrides);
    }

    let yaml = merged.to_yaml()?;

    let mut file = tempfile::Builder::new()
        .prefix(MERGED_VALUES_PREFIX)
        .tempfile_in(temp_dir)
        .map_err(CoreError::ValuesWrite)?;
    file.write_all(yaml.as_bytes())
        .map_err(CoreError::ValuesWrite)?;
    let (_, path) = file
        .keep()
        .map_err(|e| CoreError::ValuesWrite(e.into()))?;

    Ok(MergedValues {
        path,
        temp_dir: temp_dir.to_path_buf(),
        sources: sources
            .iter()
            .filter(|s| !s.as_os_str().is_empty())
            .cloned()
            .collect(),
        released: false,
    })
}

/// Whether `path` lies strictly inside `dir`
///
/// Only directories are resolved, so symlinked temp roots (e.g. `/tmp` ->
/// `/private/tmp`) compare equal while a link that merely points into `dir`
/// is judged by where the link itself lives.
pub fn is_within(path: &Path, dir: &Path) -> bool {
    let absolute = |p: &Path| std::path::absolute(p).unwrap_or_else(|_| p.to_path_buf());
    let resolve_dir = |p: &Path| p.canonicalize().unwrap_or_else(|_| absolute(p));

    let path = absolute(path);
    let path = match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => resolve_dir(parent).join(name),
        _ => path,
    };
    let dir = resolve_dir(dir);
    path != dir && path.starts_with(&dir)
}

/// Validate `--set` pairs
///
/// Each entry must contain `=` with a non-blank key. All bad entries are
/// reported together and reject the whole request.
pub fn validate_set_values(pairs: &[String]) -> Result<()> {
    let bad: Vec<String> = pairs
        .iter()
        .filter(|pair| match pair.split_once('=') {
            Some((key, _)) => key.trim().is_empty(),
            None => true,
        })
        .cloned()
        .collect();

    if bad.is_empty() {
        Ok(())
    } else {
        Err(CoreError::InvalidSetValues { entries: bad })
    }
}

/// Validate user-supplied values files: each must exist and be a regular file
pub fn validate_values_files(files: &[PathBuf]) -> Result<()> {
    for path in files {
        if path.as_os_str().is_empty() {
            continue;
        }
        let meta = fs::metadata(path).map_err(|source| CoreError::ValuesFileMissing {
            path: path.clone(),
            source,
        })?;
        if !meta.is_file() {
            return Err(CoreError::ValuesFileNotRegular { path: path.clone() });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn read_merged(merged: &MergedValues) -> JsonValue {
        let content = fs::read_to_string(merged.path()).unwrap();
        serde_yaml::from_str(&content).unwrap()
    }

    #[test]
    fn test_deep_merge() {
        let mut base = Values::from_yaml(
            r#"
image:
  repository: nginx
  tag: "1.0"
replicas: 1
"#,
        )
        .unwrap();

        let overlay = Values::from_yaml(
            r#"
image:
  tag: "2.0"
  pullPolicy: Always
replicas: 3
"#,
        )
        .unwrap();

        base.merge(&overlay);

        assert_eq!(base.get("image.repository").unwrap(), "nginx");
        assert_eq!(base.get("image.tag").unwrap(), "2.0");
        assert_eq!(base.get("image.pullPolicy").unwrap(), "Always");
        assert_eq!(base.get("replicas").unwrap(), 3);
    }

    #[test]
    fn test_scalar_and_list_last_wins() {
        let temp = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let a = write(outside.path(), "a.yaml", "a: 1\nlist:\n  - 1\n");
        let b = write(outside.path(), "b.yaml", "a: 2\nlist:\n  - 2\n");

        let merged = merge_values_in(&[a, b], None, temp.path()).unwrap();
        assert_eq!(read_merged(&merged), json!({"a": 2, "list": [2]}));
        merged.release().unwrap();
    }

    #[test]
    fn test_nested_maps_accumulate_with_override() {
        let temp = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let a = write(outside.path(), "a.yaml", "b:\n  x: foo\n");
        let b = write(outside.path(), "b.yaml", "b:\n  y: baz\n");
        let overrides = Values(json!({"b": {"z": "o"}}));

        let merged = merge_values_in(&[a, b], Some(&overrides), temp.path()).unwrap();
        assert_eq!(
            read_merged(&merged),
            json!({"b": {"x": "foo", "y": "baz", "z": "o"}})
        );
        merged.release().unwrap();
    }

    #[test]
    fn test_merge_files_and_overrides() {
        let temp = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let f1 = write(
            outside.path(),
            "v1.yaml",
            "a: 1\nb:\n  x: foo\n  y: bar\nc:\n  - 1\nd: old\n",
        );
        let f2 = write(
            outside.path(),
            "v2.yaml",
            "b:\n  y: baz\n  z: qux\nc:\n  - 2\ne:\n  f: 3\n",
        );
        let overrides = Values(json!({"a": 42, "b": {"z": "override"}, "new": "yes"}));

        let merged = merge_values_in(&[f1, f2], Some(&overrides), temp.path()).unwrap();

        assert_eq!(
            read_merged(&merged),
            json!({
                "a": 42,
                "b": {"x": "foo", "y": "baz", "z": "override"},
                "c": [2],
                "d": "old",
                "e": {"f": 3},
                "new": "yes"
            })
        );
        merged.release().unwrap();
    }

    #[test]
    fn test_merge_matches_left_fold_and_is_repeatable() {
        let temp = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let docs = [
            "a: 1\nm:\n  k1: v1\n",
            "m:\n  k2: v2\nl: [1, 2]\n",
            "a: 3\nm:\n  k1: changed\nl: [9]\n",
        ];
        let paths: Vec<PathBuf> = docs
            .iter()
            .enumerate()
            .map(|(i, d)| write(outside.path(), &format!("d{i}.yaml"), d))
            .collect();
        let overrides = Values(json!({"m": {"k3": "v3"}}));

        let parsed: Vec<Values> = docs.iter().map(|d| Values::from_yaml(d).unwrap()).collect();
        let mut folded = Values::merge_all(&parsed);
        folded.merge(&overrides);

        let first = merge_values_in(&paths, Some(&overrides), temp.path()).unwrap();
        let second = merge_values_in(&paths, Some(&overrides), temp.path()).unwrap();

        assert_eq!(read_merged(&first), folded.0);
        assert_eq!(read_merged(&first), read_merged(&second));
        assert_ne!(first.path(), second.path());

        first.release().unwrap();
        second.release().unwrap();
    }

    #[test]
    fn test_merge_empty_inputs() {
        let temp = TempDir::new().unwrap();
        let merged = merge_values_in(&[], None, temp.path()).unwrap();
        let path = merged.path().to_path_buf();

        assert_eq!(read_merged(&merged), json!({}));
        merged.release().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_merge_skips_empty_entries_and_empty_documents() {
        let temp = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let empty = write(outside.path(), "empty.yaml", "");
        let a = write(outside.path(), "a.yaml", "a: 1\n");

        let merged = merge_values_in(&[PathBuf::new(), empty, a], None, temp.path()).unwrap();
        assert_eq!(read_merged(&merged), json!({"a": 1}));
        merged.release().unwrap();
    }

    #[test]
    fn test_release_removes_temp_inputs_only() {
        let temp = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let inside = write(temp.path(), "kstack-kafka-values-x", "a: 1\n");
        let user = write(outside.path(), "user.yaml", "b: 2\n");

        let merged =
            merge_values_in(&[inside.clone(), user.clone()], None, temp.path()).unwrap();
        let merged_path = merged.path().to_path_buf();
        assert!(merged_path.exists());

        merged.release().unwrap();

        assert!(!merged_path.exists());
        assert!(!inside.exists());
        assert!(user.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_release_keeps_user_symlink_into_temp_area() {
        let temp = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let shared = write(temp.path(), "shared.yaml", "a: 1\n");
        let user = outside.path().join("user.yaml");
        std::os::unix::fs::symlink(&shared, &user).unwrap();

        let merged = merge_values_in(&[user.clone()], None, temp.path()).unwrap();
        merged.release().unwrap();

        assert!(fs::symlink_metadata(&user).is_ok());
        assert!(shared.exists());
    }

    #[test]
    fn test_release_attempts_every_removal() {
        let temp = TempDir::new().unwrap();
        let first = write(temp.path(), "first.yaml", "a: 1\n");
        let second = write(temp.path(), "second.yaml", "b: 2\n");

        let merged =
            merge_values_in(&[first.clone(), second.clone()], None, temp.path()).unwrap();
        fs::remove_file(&first).unwrap();

        assert!(merged.release().is_err());
        assert!(!second.exists());
    }

    #[test]
    fn test_drop_without_release_cleans_up() {
        let temp = TempDir::new().unwrap();
        let path = {
            let merged = merge_values_in(&[], None, temp.path()).unwrap();
            merged.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_unreadable_source_is_named() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.yaml");

        let err = merge_values_in(&[missing.clone()], None, temp.path()).unwrap_err();
        assert!(matches!(err, CoreError::ValuesRead { ref path, .. } if *path == missing));
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_unparsable_source_is_named() {
        let temp = TempDir::new().unwrap();
        let bad = write(temp.path(), "bad.yaml", "a: [1, 2\n");

        let err = merge_values_in(&[bad.clone()], None, temp.path()).unwrap_err();
        assert!(matches!(err, CoreError::ValuesParse { ref path, .. } if *path == bad));
        assert!(err.to_string().contains("bad.yaml"));
    }

    #[test]
    fn test_non_mapping_source_rejected() {
        let temp = TempDir::new().unwrap();
        let list = write(temp.path(), "list.yaml", "- 1\n- 2\n");

        let err = merge_values_in(&[list], None, temp.path()).unwrap_err();
        assert!(matches!(err, CoreError::ValuesNotMapping { .. }));
    }

    #[test]
    fn test_merge_does_not_alias_sources() {
        let mut acc = Values::new();
        let first = Values(json!({"m": {"a": 1}}));
        acc.merge(&first);
        acc.merge(&Values(json!({"m": {"b": 2}})));

        assert_eq!(first.0, json!({"m": {"a": 1}}));
        assert_eq!(acc.0, json!({"m": {"a": 1, "b": 2}}));
    }

    #[test]
    fn test_set_nested() {
        let mut values = Values::new();
        values.set("auth.password", json!("secret"));
        values.set("replicas", json!(3));

        assert_eq!(values.get("auth.password").unwrap(), "secret");
        assert_eq!(values.get("replicas").unwrap(), 3);
        assert!(values.get("auth.user").is_none());
    }

    #[test]
    fn test_validate_set_values() {
        let ok = vec!["a=1".to_string(), "b.c=x=y".to_string(), "d=".to_string()];
        assert!(validate_set_values(&ok).is_ok());

        let bad = vec![
            "a=1".to_string(),
            "novalue".to_string(),
            "=x".to_string(),
            "  =y".to_string(),
            String::new(),
        ];
        match validate_set_values(&bad).unwrap_err() {
            CoreError::InvalidSetValues { entries } => {
                assert_eq!(entries, vec!["novalue", "=x", "  =y", ""]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validate_values_files() {
        let dir = TempDir::new().unwrap();
        let file = write(dir.path(), "v.yaml", "a: 1\n");

        assert!(validate_values_files(&[file.clone(), PathBuf::new()]).is_ok());
        assert!(matches!(
            validate_values_files(&[dir.path().join("missing.yaml")]),
            Err(CoreError::ValuesFileMissing { .. })
        ));
        assert!(matches!(
            validate_values_files(&[file, dir.path().to_path_buf()]),
            Err(CoreError::ValuesFileNotRegular { .. })
        ));
    }

    #[test]
    fn test_is_within() {
        let dir = TempDir::new().unwrap();
        let inner = write(dir.path(), "x.yaml", "");

        assert!(is_within(&inner, dir.path()));
        assert!(!is_within(dir.path(), dir.path()));
        assert!(!is_within(Path::new("/definitely/elsewhere.yaml"), dir.path()));
    }

    #[cfg(unix)]
    #[test]
    fn test_is_within_symlinked_paths() {
        let root = TempDir::new().unwrap();
        let real = root.path().join("real");
        fs::create_dir(&real).unwrap();
        let linked_root = root.path().join("linked");
        std::os::unix::fs::symlink(&real, &linked_root).unwrap();

        // A temp root reached through a symlink still contains its files
        let artifact = write(&real, "kstack-merged-values-x", "");
        assert!(is_within(&artifact, &linked_root));
        assert!(is_within(&linked_root.join("kstack-merged-values-x"), &real));

        // A link pointing into the temp root lives outside it
        let elsewhere = TempDir::new().unwrap();
        let link = elsewhere.path().join("user.yaml");
        std::os::unix::fs::symlink(&artifact, &link).unwrap();
        assert!(!is_within(&link, &real));
    }
}
