//! Keyed containers and configuration nodes.

use crate::call::CallArgs;
use crate::error::{CoerceError, CoerceResult, HookResult};
use crate::slot::Slot;
use crate::value::{Dict, Value};

/// How a container treats its keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// Open key set; writes insert or replace entries directly.
    Mapping,
    /// Fixed field set with typed slots.
    Node,
    /// Staged fields of a record, coerced through the record descriptor.
    Wrapper,
}

/// Something the resolver can descend into by key.
pub trait Container {
    fn kind(&self) -> ContainerKind;

    fn contains(&self, key: &str) -> bool;

    fn slot(&self, key: &str) -> Option<&dyn Slot>;

    fn slot_mut(&mut self, key: &str) -> Option<&mut dyn Slot>;

    /// Writes an existing key.
    fn set(&mut self, key: &str, value: Value) -> CoerceResult<()> {
        match self.slot_mut(key) {
            Some(slot) => slot.assign(value),
            None => Err(CoerceError::new("field", format!("no field named '{key}'"))),
        }
    }

    /// Adds a key that does not exist yet. Only mappings accept this.
    fn insert(&mut self, key: &str, _value: Value) -> CoerceResult<()> {
        Err(CoerceError::new(
            "field",
            format!("cannot add '{key}' to a container with a fixed set of fields"),
        ))
    }

    /// Whether `name` is a method callable through the override grammar.
    fn has_method(&self, _name: &str) -> bool {
        false
    }

    fn as_node_mut(&mut self) -> Option<&mut dyn ConfigNode> {
        None
    }

    /// Keys in iteration order.
    fn key_names(&self) -> Vec<String>;
}

/// A user-declared configuration type, usually produced by `#[derive(Config)]`.
///
/// Nodes have a fixed set of named fields, an optional finalize hook that runs
/// after overrides are applied, and optional methods invocable as
/// `.method(args)` commands.
pub trait ConfigNode: Container + Slot {
    fn type_name(&self) -> &'static str;

    /// Declared field names, in declaration order.
    fn field_names(&self) -> &'static [&'static str];

    /// Methods callable from the command line.
    fn method_names(&self) -> &'static [&'static str] {
        &[]
    }

    /// Runs once per node after all overrides and required-field checks,
    /// after every child node has been finalized.
    fn finalize(&mut self) -> HookResult {
        Ok(())
    }

    fn call(&mut self, method: &str, args: CallArgs) -> HookResult;
}

/// A `Value` is a container only while it holds a dict.
impl Container for Value {
    fn kind(&self) -> ContainerKind {
        ContainerKind::Mapping
    }

    fn contains(&self, key: &str) -> bool {
        self.as_dict().is_some_and(|map| map.contains_key(key))
    }

    fn slot(&self, key: &str) -> Option<&dyn Slot> {
        self.as_dict()
            .and_then(|map| map.get(key))
            .map(|value| value as &dyn Slot)
    }

    fn slot_mut(&mut self, key: &str) -> Option<&mut dyn Slot> {
        self.as_dict_mut()
            .and_then(|map| map.get_mut(key))
            .map(|value| value as &mut dyn Slot)
    }

    fn set(&mut self, key: &str, value: Value) -> CoerceResult<()> {
        match self {
            Value::Dict(map) => {
                map.insert(key.to_owned(), value);
                Ok(())
            }
            other => Err(CoerceError::mismatch("dict", other)),
        }
    }

    fn insert(&mut self, key: &str, value: Value) -> CoerceResult<()> {
        Container::set(self, key, value)
    }

    fn key_names(&self) -> Vec<String> {
        self.as_dict()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default()
    }
}

/// Creates an empty dict value, used for intermediate keys in create mode.
pub fn empty_dict() -> Value {
    Value::Dict(Dict::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dict_value_writes_directly() {
        let mut value = empty_dict();
        Container::set(&mut value, "a", Value::Int(1)).unwrap();
        Container::insert(&mut value, "b", Value::Str("x".into())).unwrap();
        assert!(value.contains("a"));
        assert_eq!(value.key_names(), ["a", "b"]);
        assert_eq!(
            value.slot("b").unwrap().downcast_ref::<Value>(),
            Some(&Value::Str("x".into()))
        );
    }

    #[test]
    fn test_scalar_value_is_not_a_container() {
        let mut value = Value::Int(3);
        assert!(!value.contains("a"));
        assert!(Container::set(&mut value, "a", Value::Null).is_err());
        assert!(value.slot_mut("a").is_none());
    }
}
