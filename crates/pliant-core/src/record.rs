//! Records and their deferred-construction wrappers.
//!
//! A [`Record`] is a plain struct with typed fields and optional defaults,
//! usually produced by `#[derive(Record)]`. Placing [`Wrapper<T>`] in a
//! configuration exposes the record's fields to overrides; the record itself
//! is only built when [`Wrapper::build`] is called, at which point every
//! field must have a value.

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;

use indexmap::IndexMap;
use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};

use crate::container::{Container, ContainerKind};
use crate::error::{CoerceError, CoerceResult, WrapperBuildError};
use crate::required::Required;
use crate::slot::{FromValue, Slot};
use crate::value::{Dict, Value};

/// Coerces a raw value into the canonical value of one record field.
pub type CoerceFn = fn(Value) -> CoerceResult<Value>;

/// Declaration of one record field.
pub struct FieldSpec {
    pub name: &'static str,
    pub type_label: Cow<'static, str>,
    pub coerce: CoerceFn,
    /// Produces the field's default, if it has one.
    pub default: Option<fn() -> Value>,
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("type_label", &self.type_label)
            .field("has_default", &self.default.is_some())
            .finish()
    }
}

/// Field declarations of a record type.
#[derive(Debug)]
pub struct RecordDescriptor {
    pub type_name: &'static str,
    pub fields: Vec<FieldSpec>,
}

impl RecordDescriptor {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// A struct whose fields can be staged as values and built later.
pub trait Record: Sized + 'static {
    fn descriptor() -> &'static RecordDescriptor;

    /// Builds the record from canonical field values.
    fn from_fields(fields: Dict) -> CoerceResult<Self>;
}

/// Coerces through `T` and renders back, so staged values are canonical.
pub fn coerce_field<T: Slot + FromValue>(value: Value) -> CoerceResult<Value> {
    T::from_value(value).map(|typed| typed.to_value())
}

/// Removes `name` from `fields` and converts it to `T`.
pub fn take_field<T: FromValue>(fields: &mut Dict, record: &'static str, name: &str) -> CoerceResult<T> {
    let value = fields
        .shift_remove(name)
        .ok_or_else(|| CoerceError::new(record, format!("missing field '{name}'")))?;
    T::from_value(value).map_err(|e| e.within(format!("field '{name}'")))
}

/// Deferred construction of a record `T`.
pub struct Wrapper<T: Record> {
    staged: IndexMap<String, Required<Value>>,
    marker: PhantomData<fn() -> T>,
}

impl<T: Record> Wrapper<T> {
    /// Stages every field's default; fields without one start unset.
    pub fn new() -> Self {
        let staged = T::descriptor()
            .fields
            .iter()
            .map(|field| {
                let value = match field.default {
                    Some(make) => Required::Set(make()),
                    None => Required::Unset,
                };
                (field.name.to_owned(), value)
            })
            .collect();
        Self {
            staged,
            marker: PhantomData,
        }
    }

    pub fn descriptor(&self) -> &'static RecordDescriptor {
        T::descriptor()
    }

    /// Staged value of `name`, if it is set.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.staged.get(name).and_then(Required::get)
    }

    /// Coerces and stages `value` for the field `name`.
    pub fn stage(&mut self, name: &str, value: Value) -> CoerceResult<()> {
        let descriptor = T::descriptor();
        let field = descriptor.field(name).ok_or_else(|| {
            CoerceError::new(descriptor.type_name, format!("no field named '{name}'"))
        })?;
        let coerced = (field.coerce)(value).map_err(|e| e.within(format!("field '{name}'")))?;
        self.staged.insert(name.to_owned(), Required::Set(coerced));
        Ok(())
    }

    /// Names of fields that still have no value.
    pub fn missing(&self) -> Vec<&str> {
        self.staged
            .iter()
            .filter(|(_, value)| !value.is_set())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Constructs the record from the staged values.
    pub fn build(&self) -> Result<T, WrapperBuildError> {
        let type_name = T::descriptor().type_name;
        if let Some(field) = self.missing().first() {
            return Err(WrapperBuildError::MissingField {
                type_name,
                field: (*field).to_owned(),
            });
        }
        let fields: Dict = self
            .staged
            .iter()
            .filter_map(|(name, value)| value.get().map(|v| (name.clone(), v.clone())))
            .collect();
        T::from_fields(fields).map_err(|source| WrapperBuildError::Construct { type_name, source })
    }

    fn staged_value(&self) -> Value {
        Value::Dict(
            self.staged
                .iter()
                .map(|(name, value)| (name.clone(), value.to_value()))
                .collect(),
        )
    }
}

impl<T: Record> Default for Wrapper<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> Clone for Wrapper<T> {
    fn clone(&self) -> Self {
        Self {
            staged: self.staged.clone(),
            marker: PhantomData,
        }
    }
}

impl<T: Record> PartialEq for Wrapper<T> {
    fn eq(&self, other: &Self) -> bool {
        self.staged == other.staged
    }
}

impl<T: Record> fmt::Debug for Wrapper<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wrapper")
            .field("record", &T::descriptor().type_name)
            .field("staged", &self.staged)
            .finish()
    }
}

impl<T: Record> FromValue for Wrapper<T> {
    fn type_label() -> Cow<'static, str> {
        Cow::Owned(format!("Wrapper<{}>", T::descriptor().type_name))
    }

    fn from_value(value: Value) -> CoerceResult<Self> {
        let mut wrapper = Self::new();
        Slot::assign(&mut wrapper, value)?;
        Ok(wrapper)
    }
}

impl<T: Record> Slot for Wrapper<T> {
    fn type_label(&self) -> Cow<'static, str> {
        <Self as FromValue>::type_label()
    }

    /// A dict stages each of its entries.
    fn assign(&mut self, value: Value) -> CoerceResult<()> {
        match value {
            Value::Dict(entries) => {
                for (name, value) in entries {
                    self.stage(&name, value)?;
                }
                Ok(())
            }
            other => Err(CoerceError::mismatch(<Self as FromValue>::type_label(), &other)),
        }
    }

    fn to_value(&self) -> Value {
        self.staged_value()
    }

    fn as_container(&self) -> Option<&dyn Container> {
        Some(self)
    }

    fn as_container_mut(&mut self) -> Option<&mut dyn Container> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl<T: Record> Container for Wrapper<T> {
    fn kind(&self) -> ContainerKind {
        ContainerKind::Wrapper
    }

    fn contains(&self, key: &str) -> bool {
        self.staged.contains_key(key)
    }

    fn slot(&self, key: &str) -> Option<&dyn Slot> {
        self.staged.get(key).map(|value| value as &dyn Slot)
    }

    fn slot_mut(&mut self, key: &str) -> Option<&mut dyn Slot> {
        self.staged.get_mut(key).map(|value| value as &mut dyn Slot)
    }

    fn set(&mut self, key: &str, value: Value) -> CoerceResult<()> {
        self.stage(key, value)
    }

    fn key_names(&self) -> Vec<String> {
        self.staged.keys().cloned().collect()
    }
}

impl<T: Record> Serialize for Wrapper<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.staged.serialize(serializer)
    }
}

impl<'de, T: Record> Deserialize<'de> for Wrapper<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let staged = IndexMap::<String, Required<Value>>::deserialize(deserializer)?;
        let mut wrapper = Self::new();
        for (name, value) in staged {
            if T::descriptor().field(&name).is_none() {
                return Err(de::Error::custom(format!(
                    "{} has no field named '{name}'",
                    T::descriptor().type_name
                )));
            }
            wrapper.staged.insert(name, value);
        }
        Ok(wrapper)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::OnceLock;

    use super::*;

    #[derive(Debug, PartialEq)]
    struct Optimizer {
        lr: f64,
        momentum: f64,
        name: String,
    }

    impl Record for Optimizer {
        fn descriptor() -> &'static RecordDescriptor {
            static DESCRIPTOR: OnceLock<RecordDescriptor> = OnceLock::new();
            DESCRIPTOR.get_or_init(|| RecordDescriptor {
                type_name: "Optimizer",
                fields: vec![
                    FieldSpec {
                        name: "lr",
                        type_label: <f64 as FromValue>::type_label(),
                        coerce: coerce_field::<f64>,
                        default: None,
                    },
                    FieldSpec {
                        name: "momentum",
                        type_label: <f64 as FromValue>::type_label(),
                        coerce: coerce_field::<f64>,
                        default: Some(|| Value::Float(0.9)),
                    },
                    FieldSpec {
                        name: "name",
                        type_label: <String as FromValue>::type_label(),
                        coerce: coerce_field::<String>,
                        default: Some(|| Value::Str("sgd".into())),
                    },
                ],
            })
        }

        fn from_fields(mut fields: Dict) -> CoerceResult<Self> {
            Ok(Self {
                lr: take_field(&mut fields, "Optimizer", "lr")?,
                momentum: take_field(&mut fields, "Optimizer", "momentum")?,
                name: take_field(&mut fields, "Optimizer", "name")?,
            })
        }
    }

    #[test]
    fn test_build_requires_fields_without_defaults() {
        let wrapper = Wrapper::<Optimizer>::new();
        assert_eq!(wrapper.missing(), ["lr"]);
        assert_eq!(
            wrapper.build(),
            Err(WrapperBuildError::MissingField {
                type_name: "Optimizer",
                field: "lr".into(),
            })
        );
    }

    #[test]
    fn test_staged_values_are_coerced() {
        let mut wrapper = Wrapper::<Optimizer>::new();
        Container::set(&mut wrapper, "lr", Value::Int(1)).unwrap();
        assert_eq!(wrapper.get("lr"), Some(&Value::Float(1.0)));
        assert!(Container::set(&mut wrapper, "lr", Value::Str("fast".into())).is_err());

        let built = wrapper.build().unwrap();
        assert_eq!(
            built,
            Optimizer {
                lr: 1.0,
                momentum: 0.9,
                name: "sgd".into(),
            }
        );
    }

    #[test]
    fn test_unknown_fields_are_not_present() {
        let wrapper = Wrapper::<Optimizer>::new();
        assert!(!wrapper.contains("w"));
        assert_eq!(wrapper.kind(), ContainerKind::Wrapper);
    }

    #[test]
    fn test_serde_keeps_unset_fields_unset() {
        let mut wrapper = Wrapper::<Optimizer>::new();
        wrapper.stage("momentum", Value::Float(0.5)).unwrap();
        let json = serde_json::to_string(&wrapper).unwrap();
        let back: Wrapper<Optimizer> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, wrapper);
        assert_eq!(back.missing(), ["lr"]);
    }
}
