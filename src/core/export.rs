//! # Export
//!
//! Writes the selected value, or the selected subtree as JSON, to a file.
//! Subtrees are read straight from the store since the mirror may only hold
//! the levels the user has opened.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::info;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::BrowseError;
use crate::store::{EntryKind, KeyPath, ReadTx, Store};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Store(#[from] BrowseError),
    #[error("export I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("export encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

/// File name for an exported key: anything outside `[A-Za-z0-9._-]` becomes `_`.
pub fn file_stem(key: &[u8]) -> String {
    let stem: String = String::from_utf8_lossy(key)
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let stem = stem.trim_start_matches('.');
    if stem.is_empty() {
        "export".to_string()
    } else {
        stem.to_string()
    }
}

/// Buckets become objects, pairs become (lossy UTF-8) strings.
pub fn subtree_json(tx: &dyn ReadTx, path: &KeyPath) -> Result<Value, BrowseError> {
    let mut object = Map::new();
    for child in tx.list_children(path)? {
        let child_path = path.child(&child.key);
        let value = match child.kind {
            EntryKind::Bucket => subtree_json(tx, &child_path)?,
            EntryKind::Pair => {
                Value::String(String::from_utf8_lossy(&tx.get_value(&child_path)?).into_owned())
            }
        };
        object.insert(String::from_utf8_lossy(&child.key).into_owned(), value);
    }
    Ok(Value::Object(object))
}

/// Writes the raw bytes of the pair at `path` to `<dir>/<key>.bin`.
pub fn export_value(store: &dyn Store, path: &KeyPath, dir: &Path) -> Result<PathBuf, ExportError> {
    let tx = store.begin_read()?;
    let value = tx.get_value(path)?;
    let target = dir.join(format!("{}.bin", file_stem(path.last().unwrap_or_default())));
    fs::write(&target, value)?;
    info!("Exported value of {} to {}", path, target.display());
    Ok(target)
}

/// Writes `{ "<key>": <subtree> }` as pretty JSON to `<dir>/<key>.json`.
/// The root exports the whole database to `<dir>/export.json`.
pub fn export_json(store: &dyn Store, path: &KeyPath, dir: &Path) -> Result<PathBuf, ExportError> {
    let tx = store.begin_read()?;
    let document = match path.last() {
        None => subtree_json(tx.as_ref(), path)?,
        Some(key) => {
            let children = tx.list_children(&path.parent())?;
            let is_bucket = children
                .iter()
                .any(|c| c.key == key && c.kind == EntryKind::Bucket);
            let body = if is_bucket {
                subtree_json(tx.as_ref(), path)?
            } else {
                Value::String(String::from_utf8_lossy(&tx.get_value(path)?).into_owned())
            };
            let mut object = Map::new();
            object.insert(String::from_utf8_lossy(key).into_owned(), body);
            Value::Object(object)
        }
    };
    let target = dir.join(format!("{}.json", file_stem(path.last().unwrap_or_default())));
    fs::write(&target, serde_json::to_string_pretty(&document)?)?;
    info!("Exported {} as JSON to {}", path, target.display());
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{p, seeded_store};
    use tempfile::TempDir;

    #[test]
    fn test_file_stem_sanitizes() {
        assert_eq!(file_stem(b"users"), "users");
        assert_eq!(file_stem(b"a/b c"), "a_b_c");
        assert_eq!(file_stem(b"../etc"), "_etc");
        assert_eq!(file_stem(b""), "export");
    }

    #[test]
    fn test_subtree_json_nests_buckets() {
        let store = seeded_store();
        let tx = store.begin_read().unwrap();
        let json = subtree_json(tx.as_ref(), &p(&["users"])).unwrap();
        assert_eq!(json["alice"], "alice@example.com");
        assert_eq!(json["admins"]["root"], "0");
    }

    #[test]
    fn test_export_json_wraps_in_key() {
        let store = seeded_store();
        let dir = TempDir::new().unwrap();
        let target = export_json(&store, &p(&["config"]), dir.path()).unwrap();
        assert_eq!(target, dir.path().join("config.json"));
        let written: Value = serde_json::from_str(&fs::read_to_string(&target).unwrap()).unwrap();
        assert_eq!(written["config"]["theme"], "dark");
    }

    #[test]
    fn test_export_value_writes_raw_bytes() {
        let store = seeded_store();
        let dir = TempDir::new().unwrap();
        let target = export_value(&store, &p(&["users", "bob"]), dir.path()).unwrap();
        assert_eq!(fs::read(target).unwrap(), b"bob@example.com");
    }

    #[test]
    fn test_export_value_of_bucket_fails() {
        let store = seeded_store();
        let dir = TempDir::new().unwrap();
        let result = export_value(&store, &p(&["users"]), dir.path());
        assert!(matches!(
            result,
            Err(ExportError::Store(BrowseError::NotAPair(_)))
        ));
    }
}
