//! Post-override lifecycle: required-field enforcement and finalization.
//!
//! Both passes walk the whole tree. Enforcement stops at the first unset
//! required field and reports its full dotted path. Finalization is
//! post-order: every child node finishes before its parent's hook runs.
//! Record wrappers are opaque to both passes; their fields are checked when
//! the record is built.

use tracing::{debug, trace};

use crate::container::ConfigNode;
use crate::error::{CoerceError, CoerceResult, LifecycleError, RequiredFieldError};
use crate::required::REQUIRED_MARKER;
use crate::resolve::{join_path, resolve_alias};
use crate::slot::Slot;
use crate::value::{Dict, Value};

/// Fails if any required field below `root` is unset.
pub fn enforce_required(root: &dyn Slot) -> Result<(), RequiredFieldError> {
    root.enforce_required("")
}

/// Runs every finalize hook below `root`, children before parents.
pub fn finalize(root: &mut dyn Slot) -> Result<(), LifecycleError> {
    root.finalize_tree("")
}

/// Enforcement over the declared fields of a node.
pub fn enforce_node(node: &dyn ConfigNode, path: &str) -> Result<(), RequiredFieldError> {
    for name in node.field_names() {
        if let Some(slot) = node.slot(name) {
            slot.enforce_required(&join_path(path, name))?;
        }
    }
    Ok(())
}

/// Finalizes the children of a node, then the node itself.
pub fn finalize_node(node: &mut dyn ConfigNode, path: &str) -> Result<(), LifecycleError> {
    for name in node.field_names() {
        if let Some(slot) = node.slot_mut(name) {
            slot.finalize_tree(&join_path(path, name))?;
        }
    }

    let type_name = node.type_name();
    trace!(node = type_name, path = %display_path(path), "Finalizing node");
    node.finalize().map_err(|source| {
        debug!(node = type_name, path = %display_path(path), error = %source, "Finalize hook failed");
        LifecycleError::Finalize {
            path: display_path(path).to_owned(),
            type_name,
            source,
        }
    })
}

/// Assigns a dict to a node field by field.
///
/// Keys naming aliases write through to their targets. Entries that only
/// restate an alias or an unset required field, as [`to_dict`] renders
/// them, are skipped.
pub fn merge_into_node(node: &mut dyn ConfigNode, value: Value) -> CoerceResult<()> {
    let entries = match value {
        Value::Dict(entries) => entries,
        other => return Err(CoerceError::mismatch(node.type_name(), &other)),
    };

    for (name, value) in entries {
        let Some(target) = merge_target(&*node, &name, &value)? else {
            trace!(node = node.type_name(), field = %name, "Skipping rendered placeholder");
            continue;
        };
        node.set(&target, value)
            .map_err(|e| e.within(format!("field '{name}'")))?;
    }
    Ok(())
}

fn merge_target(node: &dyn ConfigNode, name: &str, value: &Value) -> CoerceResult<Option<String>> {
    if matches!(value, Value::Str(s) if s == REQUIRED_MARKER) {
        return Ok(None);
    }
    if let Some(slot) = node.slot(name)
        && slot.alias_target().is_some()
        && slot.to_value() == *value
    {
        return Ok(None);
    }
    resolve_alias(node, name)
        .map(Some)
        .map_err(|e| CoerceError::new("Alias", e.to_string()))
}

/// Nested-mapping form of a node: one entry per declared field.
pub fn to_dict(node: &dyn ConfigNode) -> Value {
    let mut dict = Dict::new();
    for name in node.field_names() {
        if let Some(slot) = node.slot(name) {
            dict.insert((*name).to_owned(), slot.to_value());
        }
    }
    Value::Dict(dict)
}

fn display_path(path: &str) -> &str {
    if path.is_empty() { "<root>" } else { path }
}

#[cfg(test)]
mod tests {
    use pliant_macros::Config;

    use super::*;
    use crate::alias::Alias;
    use crate::container::Container;
    use crate::error::HookResult;
    use crate::required::{REQUIRED_MARKER, Required};

    #[derive(Debug, Default, Config)]
    #[config(finalize = finish)]
    struct Inner {
        value: i64,
        #[config(skip)]
        doubled: i64,
    }

    impl Inner {
        fn finish(&mut self) -> HookResult {
            self.doubled = self.value * 2;
            Ok(())
        }
    }

    #[derive(Debug, Default, Config)]
    #[config(finalize = finish)]
    struct Outer {
        inner: Inner,
        items: Vec<Inner>,
        name: Required<String>,
        #[config(skip)]
        total: i64,
    }

    impl Outer {
        fn finish(&mut self) -> HookResult {
            self.total = self.inner.doubled + self.items.iter().map(|i| i.doubled).sum::<i64>();
            Ok(())
        }
    }

    #[derive(Debug, Default, Config)]
    #[config(finalize = explode)]
    struct Failing {
        child: Inner,
    }

    impl Failing {
        fn explode(&mut self) -> HookResult {
            anyhow::bail!("refusing to finalize")
        }
    }

    #[derive(Debug, Default, Config)]
    struct Holder {
        failing: Failing,
    }

    #[test]
    fn test_children_finalize_before_parent() {
        let mut outer = Outer {
            inner: Inner { value: 1, doubled: 0 },
            items: vec![Inner { value: 10, doubled: 0 }, Inner { value: 100, doubled: 0 }],
            name: Required::Set("run".into()),
            total: 0,
        };
        finalize(&mut outer).unwrap();
        assert_eq!(outer.inner.doubled, 2);
        assert_eq!(outer.total, 2 + 20 + 200);
    }

    #[test]
    fn test_enforcement_reports_full_path() {
        let outer = Outer::default();
        let err = enforce_required(&outer).unwrap_err();
        assert_eq!(err.path, "name");
    }

    #[test]
    fn test_finalize_error_names_node() {
        let mut holder = Holder::default();
        match finalize(&mut holder).unwrap_err() {
            LifecycleError::Finalize { path, type_name, source } => {
                assert_eq!(path, "failing");
                assert_eq!(type_name, "Failing");
                assert_eq!(source.to_string(), "refusing to finalize");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_dict_assignment_merges_into_node() {
        let mut outer = Outer::default();
        let mut patch = Dict::new();
        patch.insert("value".into(), Value::Float(3.7));
        outer.slot_mut("inner").unwrap().assign(Value::Dict(patch)).unwrap();
        assert_eq!(outer.inner.value, 3);

        let mut bad = Dict::new();
        bad.insert("nope".into(), Value::Int(1));
        assert!(outer.slot_mut("inner").unwrap().assign(Value::Dict(bad)).is_err());
    }

    #[test]
    fn test_to_dict_skips_hidden_fields_and_marks_required() {
        let outer = Outer::default();
        let Value::Dict(dict) = to_dict(&outer) else {
            panic!("expected dict");
        };
        assert_eq!(dict.keys().collect::<Vec<_>>(), ["inner", "items", "name"]);
        assert_eq!(dict["name"], Value::Str(REQUIRED_MARKER.into()));
        assert_eq!(dict["items"], Value::List(vec![]));
        assert!(!outer.contains("total"));
    }

    #[derive(Debug, Config)]
    struct Rates {
        learning_rate: f64,
        lr: Alias,
        warmup: Required<i64>,
    }

    impl Default for Rates {
        fn default() -> Self {
            Self {
                learning_rate: 0.1,
                lr: Alias::to("learning_rate"),
                warmup: Required::Unset,
            }
        }
    }

    #[test]
    fn test_merge_writes_through_aliases() {
        let mut rates = Rates::default();
        let mut patch = Dict::new();
        patch.insert("lr".into(), Value::Float(0.7));
        merge_into_node(&mut rates, Value::Dict(patch)).unwrap();
        assert_eq!(rates.learning_rate, 0.7);
        assert_eq!(rates.lr, Alias::to("learning_rate"));
    }

    #[test]
    fn test_rendered_dict_merges_back() {
        let mut rates = Rates::default();
        rates.learning_rate = 0.3;
        let rendered = to_dict(&rates);

        let mut restored = Rates::default();
        merge_into_node(&mut restored, rendered).unwrap();
        assert_eq!(restored.learning_rate, 0.3);
        assert_eq!(restored.lr, Alias::to("learning_rate"));
        assert_eq!(restored.warmup, Required::Unset);
    }
}
