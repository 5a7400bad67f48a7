//! Saving and restoring configurations.
//!
//! Two formats are supported:
//!
//! - **YAML** of the nested-mapping form ([`to_dict`]): human-readable, keys
//!   sorted at every depth, multi-line strings written as block literals.
//!   Loading yields a [`Value`] that can be merged back into a node.
//! - **Snapshots** of a whole typed tree through `serde`, written as
//!   `serde_json` bytes. `.snap` files are compact, `.json` files pretty-printed.

use std::fs;
use std::path::{Path, PathBuf};

use pliant_core::lifecycle::merge_into_node;
use pliant_core::{CoerceError, ConfigNode, Value, to_dict};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

/// Errors raised while saving or loading configurations.
#[derive(Debug, Error)]
pub enum PersistError {
    /// Reading or writing the file failed.
    #[error("failed to access '{}': {source}", path.display())]
    Io {
        /// The file involved.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML encoding or decoding failed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Snapshot encoding or decoding failed.
    #[error("snapshot error: {0}")]
    Json(#[from] serde_json::Error),

    /// The file extension names no known snapshot format.
    #[error("unknown snapshot extension for '{}'", path.display())]
    UnsupportedFormat {
        /// The rejected file.
        path: PathBuf,
    },

    /// Loaded values did not fit the configuration.
    #[error("cannot merge loaded values: {0}")]
    Coerce(#[from] CoerceError),
}

/// Result type for persistence operations.
pub type PersistResult<T> = Result<T, PersistError>;

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> PersistError + '_ {
    move |source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    }
}

// =============================================================================
// YAML
// =============================================================================

/// Renders a value as YAML with sorted keys; tuples and sets become lists.
pub fn to_yaml_string(value: &Value) -> PersistResult<String> {
    Ok(serde_yaml::to_string(&value.to_plain().into_sorted())?)
}

/// Writes `value` as sorted YAML to `path`.
pub fn save_yaml(value: &Value, path: impl AsRef<Path>) -> PersistResult<()> {
    let path = path.as_ref();
    let text = to_yaml_string(value)?;
    fs::write(path, text).map_err(io_error(path))?;
    debug!(path = %path.display(), "Saved YAML");
    Ok(())
}

/// Reads a YAML document into a [`Value`].
pub fn load_yaml(path: impl AsRef<Path>) -> PersistResult<Value> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(io_error(path))?;
    debug!(path = %path.display(), "Loaded YAML");
    Ok(serde_yaml::from_str(&text)?)
}

// =============================================================================
// Snapshots
// =============================================================================

/// Writes a whole tree; pretty JSON for `.json`, compact bytes otherwise.
pub fn save_snapshot<T: Serialize>(data: &T, path: impl AsRef<Path>) -> PersistResult<()> {
    let path = path.as_ref();
    let bytes = if has_extension(path, "json") {
        serde_json::to_vec_pretty(data)?
    } else {
        serde_json::to_vec(data)?
    };
    fs::write(path, bytes).map_err(io_error(path))?;
    debug!(path = %path.display(), "Saved snapshot");
    Ok(())
}

/// Reads a tree written by [`save_snapshot`].
pub fn load_snapshot<T: DeserializeOwned>(path: impl AsRef<Path>) -> PersistResult<T> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(io_error(path))?;
    debug!(path = %path.display(), "Loaded snapshot");
    Ok(serde_json::from_slice(&bytes)?)
}

/// Loads a snapshot, accepting only the `.snap` and `.json` extensions.
pub fn load_binary<T: DeserializeOwned>(path: impl AsRef<Path>) -> PersistResult<T> {
    let path = path.as_ref();
    if has_extension(path, "snap") || has_extension(path, "json") {
        load_snapshot(path)
    } else {
        Err(PersistError::UnsupportedFormat {
            path: path.to_path_buf(),
        })
    }
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().is_some_and(|e| e == ext)
}

// =============================================================================
// Node Extension
// =============================================================================

/// Persistence helpers available on every configuration node.
pub trait ConfigExt: ConfigNode {
    /// Nested-mapping form of the node.
    fn to_dict(&self) -> Value;

    /// Sorted YAML of [`ConfigExt::to_dict`].
    fn to_yaml(&self) -> PersistResult<String>;

    fn save_yaml(&self, path: impl AsRef<Path>) -> PersistResult<()>;

    /// Loads a YAML mapping and assigns it field by field.
    fn merge_yaml(&mut self, path: impl AsRef<Path>) -> PersistResult<()>;
}

impl<C: ConfigNode> ConfigExt for C {
    fn to_dict(&self) -> Value {
        to_dict(self)
    }

    fn to_yaml(&self) -> PersistResult<String> {
        to_yaml_string(&to_dict(self))
    }

    fn save_yaml(&self, path: impl AsRef<Path>) -> PersistResult<()> {
        save_yaml(&to_dict(self), path)
    }

    fn merge_yaml(&mut self, path: impl AsRef<Path>) -> PersistResult<()> {
        let value = load_yaml(path)?;
        merge_into_node(self, value)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pliant_core::Dict;

    use super::*;

    fn sample() -> Value {
        let mut inner = Dict::new();
        inner.insert("z".into(), Value::Int(1));
        inner.insert("a".into(), Value::Tuple(vec![Value::Int(1), Value::Int(2)]));
        let mut root = Dict::new();
        root.insert("notes".into(), Value::Str("line one\nline two\n".into()));
        root.insert("inner".into(), Value::Dict(inner));
        root.insert("lr".into(), Value::Float(0.5));
        Value::Dict(root)
    }

    #[test]
    fn test_yaml_keys_are_sorted() {
        let text = to_yaml_string(&sample()).unwrap();
        let inner = text.find("inner:").unwrap();
        let lr = text.find("lr:").unwrap();
        let notes = text.find("notes:").unwrap();
        assert!(inner < lr && lr < notes);
        assert!(text.find("a:").unwrap() < text.find("z:").unwrap());
    }

    #[test]
    fn test_yaml_file_keeps_multiline_strings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        save_yaml(&sample(), &path).unwrap();

        let loaded = load_yaml(&path).unwrap();
        let dict = loaded.as_dict().unwrap();
        assert_eq!(dict["notes"], Value::Str("line one\nline two\n".into()));
        assert_eq!(
            dict["inner"].as_dict().unwrap()["a"],
            Value::List(vec![Value::Int(1), Value::Int(2)])
        );
    }

    #[test]
    fn test_load_binary_dispatches_on_extension() {
        let dir = tempfile::tempdir().unwrap();
        let snap = dir.path().join("config.snap");
        save_snapshot(&sample(), &snap).unwrap();
        let restored: Value = load_binary(&snap).unwrap();
        assert_eq!(restored.as_dict().unwrap()["lr"], Value::Float(0.5));

        let pickle = dir.path().join("config.pkl");
        std::fs::write(&pickle, b"{}").unwrap();
        assert!(matches!(
            load_binary::<Value>(&pickle),
            Err(PersistError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = load_yaml("/no/such/dir/config.yaml").unwrap_err();
        assert!(err.to_string().contains("/no/such/dir/config.yaml"));
    }
}
