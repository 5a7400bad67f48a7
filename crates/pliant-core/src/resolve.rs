//! Dotted key-path resolution.
//!
//! Paths are walked one segment at a time. At each level alias fields are
//! followed to the field they name, then the segment must exist. In
//! [`Mode::Create`] missing segments of open mappings are created instead.

use tracing::{debug, trace};

use crate::call::CallArgs;
use crate::container::{Container, ContainerKind, empty_dict};
use crate::error::{OverrideError, PathResolutionError};
use crate::slot::Slot;
use crate::value::Value;

/// How missing keys are treated during resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// Every segment must already exist.
    #[default]
    Strict,
    /// Missing keys of open mappings are created; typed nodes stay strict.
    Create,
}

/// Joins a parent path and a key; the root path is empty.
pub fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_owned()
    } else {
        format!("{prefix}.{key}")
    }
}

/// The container holding the final segment, and the segment's real name.
pub struct Resolved<'a> {
    pub container: &'a mut dyn Container,
    pub name: String,
}

fn split_path(path: &str) -> Result<Vec<&str>, PathResolutionError> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(PathResolutionError::InvalidPath {
            path: path.to_owned(),
        });
    }
    Ok(segments)
}

/// Follows alias fields of `container` starting from `segment`.
fn follow_aliases<C: Container + ?Sized>(
    container: &C,
    segment: &str,
    path: &str,
    failed_at: &str,
) -> Result<String, PathResolutionError> {
    let mut name = segment.to_owned();
    let mut chain: Vec<String> = Vec::new();
    while let Some(target) = container.slot(&name).and_then(|slot| slot.alias_target()) {
        chain.push(name);
        if chain.iter().any(|seen| seen == target) {
            chain.push(target.to_owned());
            return Err(PathResolutionError::AliasCycle {
                path: path.to_owned(),
                failed_at: failed_at.to_owned(),
                chain,
            });
        }
        trace!(alias = %chain[chain.len() - 1], to = target, "Following alias");
        name = target.to_owned();
    }
    Ok(name)
}

/// Real field name behind `name` in `container`, after alias hops.
pub(crate) fn resolve_alias<C: Container + ?Sized>(
    container: &C,
    name: &str,
) -> Result<String, PathResolutionError> {
    follow_aliases(container, name, name, name)
}

fn prefix(segments: &[&str], resolved: &[String], index: usize) -> String {
    resolved
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(segments[index]))
        .collect::<Vec<_>>()
        .join(".")
}

/// Walks `path` from `root` down to the container of its final segment.
///
/// Intermediate segments must name containers. The final segment must exist
/// as a field or, when `allow_method` is set, as a registered method; in
/// create mode a missing final key of a mapping is left for the caller to
/// insert.
pub fn resolve<'a>(
    root: &'a mut dyn Container,
    path: &str,
    mode: Mode,
    allow_method: bool,
) -> Result<Resolved<'a>, PathResolutionError> {
    let segments = split_path(path)?;
    let last = segments.len() - 1;
    let mut resolved: Vec<String> = Vec::with_capacity(segments.len());
    let mut current: &'a mut dyn Container = root;

    for (index, segment) in segments.iter().enumerate() {
        let failed_at = prefix(&segments, &resolved, index);
        let name = follow_aliases(&*current, segment, path, &failed_at)?;
        let is_last = index == last;

        let exists = current.contains(&name) || (is_last && allow_method && current.has_method(&name));
        if !exists {
            let creatable = mode == Mode::Create && current.kind() == ContainerKind::Mapping;
            if !creatable {
                return Err(match (mode, current.kind()) {
                    (Mode::Create, ContainerKind::Node | ContainerKind::Wrapper) => {
                        PathResolutionError::FixedFields {
                            path: path.to_owned(),
                            failed_at,
                            type_label: container_label(&*current),
                        }
                    }
                    _ => PathResolutionError::NotFound {
                        path: path.to_owned(),
                        failed_at,
                    },
                });
            }
            if !is_last {
                debug!(key = %failed_at, "Creating intermediate mapping");
                current
                    .insert(&name, empty_dict())
                    .map_err(|_| PathResolutionError::NotFound {
                        path: path.to_owned(),
                        failed_at: failed_at.clone(),
                    })?;
            }
        }

        if is_last {
            return Ok(Resolved {
                container: current,
                name,
            });
        }

        let type_label = current
            .slot(&name)
            .map(|slot| slot.type_label().into_owned())
            .unwrap_or_default();
        resolved.push(name.clone());
        current = current
            .slot_mut(&name)
            .and_then(|slot| slot.as_container_mut())
            .ok_or_else(|| PathResolutionError::NotAContainer {
                path: path.to_owned(),
                failed_at: resolved.join("."),
                type_label,
            })?;
    }

    Err(PathResolutionError::InvalidPath {
        path: path.to_owned(),
    })
}

fn container_label(container: &dyn Container) -> String {
    match container.kind() {
        ContainerKind::Mapping => "mapping".to_owned(),
        ContainerKind::Node => "config node".to_owned(),
        ContainerKind::Wrapper => "record wrapper".to_owned(),
    }
}

/// Read-only lookup of the slot at `path`, following aliases.
pub fn lookup<'a>(root: &'a dyn Container, path: &str) -> Result<&'a dyn Slot, PathResolutionError> {
    let segments = split_path(path)?;
    let mut resolved: Vec<String> = Vec::with_capacity(segments.len());
    let mut current: &'a dyn Container = root;
    let mut found: Option<&'a dyn Slot> = None;

    for (index, segment) in segments.iter().enumerate() {
        if let Some(slot) = found {
            let type_label = slot.type_label().into_owned();
            current = slot
                .as_container()
                .ok_or_else(|| PathResolutionError::NotAContainer {
                    path: path.to_owned(),
                    failed_at: resolved.join("."),
                    type_label,
                })?;
        }
        let failed_at = prefix(&segments, &resolved, index);
        let name = follow_aliases(current, segment, path, &failed_at)?;
        found = Some(current.slot(&name).ok_or(PathResolutionError::NotFound {
            path: path.to_owned(),
            failed_at,
        })?);
        resolved.push(name);
    }

    found.ok_or_else(|| PathResolutionError::InvalidPath {
        path: path.to_owned(),
    })
}

/// Reads the nested-mapping form of the value at `path`.
pub fn get_value(root: &dyn Container, path: &str) -> Result<Value, PathResolutionError> {
    lookup(root, path).map(|slot| slot.to_value())
}

/// Resolves `path` and writes `value` into the slot it names.
pub fn assign(
    root: &mut dyn Container,
    path: &str,
    value: Value,
    mode: Mode,
) -> Result<(), OverrideError> {
    let Resolved { container, name } = resolve(root, path, mode, false)?;
    let result = if container.contains(&name) {
        container.set(&name, value)
    } else {
        container.insert(&name, value)
    };
    result.map_err(|source| OverrideError::Coercion {
        path: path.to_owned(),
        source,
    })
}

/// Resolves `path` to a node method and invokes it.
pub fn call(root: &mut dyn Container, path: &str, args: CallArgs) -> Result<(), OverrideError> {
    let Resolved { container, name } = resolve(root, path, Mode::Strict, true)?;
    if !container.has_method(&name) {
        return Err(PathResolutionError::NotCallable {
            path: path.to_owned(),
        }
        .into());
    }
    let node = container
        .as_node_mut()
        .ok_or_else(|| PathResolutionError::NotCallable {
            path: path.to_owned(),
        })?;
    node.call(&name, args).map_err(|source| OverrideError::Method {
        path: path.to_owned(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias::Alias;
    use crate::value::Dict;

    fn tree() -> Value {
        let mut inner = Dict::new();
        inner.insert("x".into(), Value::Int(1));
        let mut root = Dict::new();
        root.insert("inner".into(), Value::Dict(inner));
        root.insert("leaf".into(), Value::Int(2));
        Value::Dict(root)
    }

    #[test]
    fn test_assign_nested_mapping_key() {
        let mut root = tree();
        assign(&mut root, "inner.x", Value::Int(5), Mode::Strict).unwrap();
        assert_eq!(get_value(&root, "inner.x").unwrap(), Value::Int(5));
    }

    #[test]
    fn test_strict_mode_names_failed_prefix() {
        let mut root = tree();
        let err = assign(&mut root, "inner.y.z", Value::Int(5), Mode::Strict).unwrap_err();
        match err {
            OverrideError::Path(PathResolutionError::NotFound { path, failed_at }) => {
                assert_eq!(path, "inner.y.z");
                assert_eq!(failed_at, "inner.y");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_create_mode_builds_intermediate_mappings() {
        let mut root = tree();
        assign(&mut root, "new.deep.key", Value::Int(7), Mode::Create).unwrap();
        assert_eq!(get_value(&root, "new.deep.key").unwrap(), Value::Int(7));
    }

    #[test]
    fn test_descending_into_leaf_fails() {
        let mut root = tree();
        let err = assign(&mut root, "leaf.x", Value::Int(1), Mode::Create).unwrap_err();
        assert!(matches!(
            err,
            OverrideError::Path(PathResolutionError::NotAContainer { .. })
        ));
    }

    #[test]
    fn test_empty_segment_is_invalid() {
        let mut root = tree();
        assert!(matches!(
            assign(&mut root, "inner..x", Value::Null, Mode::Strict),
            Err(OverrideError::Path(PathResolutionError::InvalidPath { .. }))
        ));
    }

    #[test]
    fn test_alias_cycle_detected() {
        let mut map: indexmap::IndexMap<String, Alias> = indexmap::IndexMap::new();
        map.insert("a".into(), Alias::to("b"));
        map.insert("b".into(), Alias::to("a"));
        let err = lookup(&map, "a").err().unwrap();
        assert!(matches!(err, PathResolutionError::AliasCycle { .. }));
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("", "a"), "a");
        assert_eq!(join_path("a.b", "c"), "a.b.c");
    }
}
