//! Typed slots: the fields of a configuration tree.
//!
//! A [`Slot`] is anything that can sit in a configuration field. It knows its
//! type label, accepts a [`Value`] through coercion, and renders itself back
//! for display. Containers expose their children as `dyn Slot`, which is what
//! the resolver walks.
//!
//! Leaf types implement [`FromValue`] plus [`Leaf`] and get their `Slot`
//! impl from [`leaf_slot!`](crate::leaf_slot):
//!
//! ```rust,ignore
//! use pliant_core::{CoerceError, CoerceResult, FromValue, Leaf, Value, leaf_slot};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct DoubleInt(i64);
//!
//! impl FromValue for DoubleInt {
//!     fn type_label() -> std::borrow::Cow<'static, str> {
//!         "DoubleInt".into()
//!     }
//!
//!     fn from_value(value: Value) -> CoerceResult<Self> {
//!         i64::from_value(value).map(|i| DoubleInt(i * 2))
//!     }
//! }
//!
//! impl Leaf for DoubleInt {
//!     fn render(&self) -> Value {
//!         Value::Int(self.0)
//!     }
//! }
//!
//! leaf_slot!(DoubleInt);
//! ```

use std::any::Any;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use indexmap::IndexMap;

use crate::container::{Container, ContainerKind};
use crate::error::{CoerceError, CoerceResult, LifecycleError, RequiredFieldError};
use crate::resolve::join_path;
use crate::value::{Value, format_float};

/// Construction of a typed value from a dynamic one.
pub trait FromValue: Sized {
    /// Label used in diagnostics, e.g. `i64` or `Vec<String>`.
    fn type_label() -> Cow<'static, str>;

    /// Converts `value`, or explains why it cannot.
    fn from_value(value: Value) -> CoerceResult<Self>;
}

/// Rendering half of a leaf type; pairs with [`FromValue`].
pub trait Leaf: FromValue + 'static {
    fn render(&self) -> Value;
}

/// A field of a configuration tree.
pub trait Slot: Any {
    /// Declared type of the slot.
    fn type_label(&self) -> Cow<'static, str>;

    /// Replaces the slot's content with `value` after coercion.
    fn assign(&mut self, value: Value) -> CoerceResult<()>;

    /// Nested-mapping representation of the slot.
    fn to_value(&self) -> Value;

    /// For alias fields, the sibling name they redirect to.
    fn alias_target(&self) -> Option<&str> {
        None
    }

    /// Whether the slot holds the required-but-unset marker.
    fn is_unset(&self) -> bool {
        false
    }

    fn as_container(&self) -> Option<&dyn Container> {
        None
    }

    fn as_container_mut(&mut self) -> Option<&mut dyn Container> {
        None
    }

    /// Fails with the full path of the first unset required field below.
    fn enforce_required(&self, _path: &str) -> Result<(), RequiredFieldError> {
        Ok(())
    }

    /// Runs finalize hooks below this slot, children first.
    fn finalize_tree(&mut self, _path: &str) -> Result<(), LifecycleError> {
        Ok(())
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl dyn Slot {
    pub fn downcast_ref<T: Slot>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Slot>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

/// Implements [`Slot`] for types that implement [`Leaf`].
#[macro_export]
macro_rules! leaf_slot {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Slot for $ty {
                fn type_label(&self) -> ::std::borrow::Cow<'static, str> {
                    <$ty as $crate::FromValue>::type_label()
                }

                fn assign(&mut self, value: $crate::Value) -> $crate::CoerceResult<()> {
                    *self = <$ty as $crate::FromValue>::from_value(value)?;
                    Ok(())
                }

                fn to_value(&self) -> $crate::Value {
                    <$ty as $crate::Leaf>::render(self)
                }

                fn as_any(&self) -> &dyn ::std::any::Any {
                    self
                }

                fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                    self
                }
            }
        )+
    };
}

// =============================================================================
// Scalars
// =============================================================================

fn coerce_int(value: Value, label: &'static str) -> CoerceResult<i64> {
    match value {
        Value::Int(i) => Ok(i),
        Value::Bool(b) => Ok(i64::from(b)),
        Value::Float(x) if x.is_finite() => {
            let truncated = x.trunc();
            // 2^63 is exactly representable; anything at or above it overflows.
            if (-9_223_372_036_854_775_808.0..9_223_372_036_854_775_808.0).contains(&truncated) {
                Ok(truncated as i64)
            } else {
                Err(CoerceError::new(label, format!("{} is out of range", format_float(x))))
            }
        }
        Value::Str(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| CoerceError::new(label, format!("invalid integer literal '{s}'"))),
        other => Err(CoerceError::mismatch(label, &other)),
    }
}

fn coerce_float(value: Value, label: &'static str) -> CoerceResult<f64> {
    match value {
        Value::Int(i) => Ok(i as f64),
        Value::Float(x) => Ok(x),
        Value::Bool(b) => Ok(if b { 1.0 } else { 0.0 }),
        Value::Str(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| CoerceError::new(label, format!("invalid float literal '{s}'"))),
        other => Err(CoerceError::mismatch(label, &other)),
    }
}

macro_rules! int_leaf {
    ($($ty:ty => $label:literal),+ $(,)?) => {
        $(
            impl FromValue for $ty {
                fn type_label() -> Cow<'static, str> {
                    Cow::Borrowed($label)
                }

                fn from_value(value: Value) -> CoerceResult<Self> {
                    let wide = coerce_int(value, $label)?;
                    <$ty>::try_from(wide)
                        .map_err(|_| CoerceError::new($label, format!("{wide} is out of range")))
                }
            }

            impl Leaf for $ty {
                fn render(&self) -> Value {
                    i64::try_from(*self).map_or_else(|_| Value::Float(*self as f64), Value::Int)
                }
            }
        )+

        crate::leaf_slot!($($ty),+);
    };
}

int_leaf! {
    i8 => "i8",
    i16 => "i16",
    i32 => "i32",
    i64 => "i64",
    isize => "isize",
    u8 => "u8",
    u16 => "u16",
    u32 => "u32",
    u64 => "u64",
    usize => "usize",
}

impl FromValue for f64 {
    fn type_label() -> Cow<'static, str> {
        Cow::Borrowed("f64")
    }

    fn from_value(value: Value) -> CoerceResult<Self> {
        coerce_float(value, "f64")
    }
}

impl Leaf for f64 {
    fn render(&self) -> Value {
        Value::Float(*self)
    }
}

impl FromValue for f32 {
    fn type_label() -> Cow<'static, str> {
        Cow::Borrowed("f32")
    }

    fn from_value(value: Value) -> CoerceResult<Self> {
        coerce_float(value, "f32").map(|x| x as f32)
    }
}

impl Leaf for f32 {
    fn render(&self) -> Value {
        Value::Float(f64::from(*self))
    }
}

impl FromValue for bool {
    fn type_label() -> Cow<'static, str> {
        Cow::Borrowed("bool")
    }

    fn from_value(value: Value) -> CoerceResult<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            Value::Int(i) => Ok(i != 0),
            Value::Float(x) => Ok(x != 0.0),
            Value::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "t" | "yes" | "y" | "on" | "1" => Ok(true),
                "false" | "f" | "no" | "n" | "off" | "0" => Ok(false),
                _ => Err(CoerceError::new("bool", format!("invalid boolean literal '{s}'"))),
            },
            other => Err(CoerceError::mismatch("bool", &other)),
        }
    }
}

impl Leaf for bool {
    fn render(&self) -> Value {
        Value::Bool(*self)
    }
}

/// Any value converts to its display form.
impl FromValue for String {
    fn type_label() -> Cow<'static, str> {
        Cow::Borrowed("String")
    }

    fn from_value(value: Value) -> CoerceResult<Self> {
        Ok(match value {
            Value::Str(s) => s,
            other => other.to_string(),
        })
    }
}

impl Leaf for String {
    fn render(&self) -> Value {
        Value::Str(self.clone())
    }
}

impl FromValue for PathBuf {
    fn type_label() -> Cow<'static, str> {
        Cow::Borrowed("PathBuf")
    }

    fn from_value(value: Value) -> CoerceResult<Self> {
        match value {
            Value::Str(s) => Ok(PathBuf::from(s)),
            other => Err(CoerceError::mismatch("PathBuf", &other)),
        }
    }
}

impl Leaf for PathBuf {
    fn render(&self) -> Value {
        Value::Str(self.to_string_lossy().into_owned())
    }
}

crate::leaf_slot!(f64, f32, bool, String, PathBuf);

// =============================================================================
// Untyped values
// =============================================================================

/// Untyped fields accept anything verbatim.
impl FromValue for Value {
    fn type_label() -> Cow<'static, str> {
        Cow::Borrowed("any")
    }

    fn from_value(value: Value) -> CoerceResult<Self> {
        Ok(value)
    }
}

impl Slot for Value {
    fn type_label(&self) -> Cow<'static, str> {
        <Self as FromValue>::type_label()
    }

    fn assign(&mut self, value: Value) -> CoerceResult<()> {
        *self = value;
        Ok(())
    }

    fn to_value(&self) -> Value {
        self.to_plain()
    }

    fn as_container(&self) -> Option<&dyn Container> {
        match self {
            Value::Dict(_) => Some(self),
            _ => None,
        }
    }

    fn as_container_mut(&mut self) -> Option<&mut dyn Container> {
        match self {
            Value::Dict(_) => Some(self),
            _ => None,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// =============================================================================
// Option and sequences
// =============================================================================

/// `None` literals clear the slot; anything else coerces to `T`.
impl<T: FromValue> FromValue for Option<T> {
    fn type_label() -> Cow<'static, str> {
        Cow::Owned(format!("Option<{}>", T::type_label()))
    }

    fn from_value(value: Value) -> CoerceResult<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: Slot + FromValue> Slot for Option<T> {
    fn type_label(&self) -> Cow<'static, str> {
        <Self as FromValue>::type_label()
    }

    fn assign(&mut self, value: Value) -> CoerceResult<()> {
        *self = <Self as FromValue>::from_value(value)?;
        Ok(())
    }

    fn to_value(&self) -> Value {
        match self {
            Some(inner) => inner.to_value(),
            None => Value::Null,
        }
    }

    fn as_container(&self) -> Option<&dyn Container> {
        self.as_ref().and_then(|inner| inner.as_container())
    }

    fn as_container_mut(&mut self) -> Option<&mut dyn Container> {
        self.as_mut().and_then(|inner| inner.as_container_mut())
    }

    fn enforce_required(&self, path: &str) -> Result<(), RequiredFieldError> {
        match self {
            Some(inner) => inner.enforce_required(path),
            None => Ok(()),
        }
    }

    fn finalize_tree(&mut self, path: &str) -> Result<(), LifecycleError> {
        match self {
            Some(inner) => inner.finalize_tree(path),
            None => Ok(()),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Lists, tuples and sets all coerce element-wise.
impl<T: FromValue> FromValue for Vec<T> {
    fn type_label() -> Cow<'static, str> {
        Cow::Owned(format!("Vec<{}>", T::type_label()))
    }

    fn from_value(value: Value) -> CoerceResult<Self> {
        match value {
            Value::List(items) | Value::Tuple(items) | Value::Set(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| T::from_value(item).map_err(|e| e.within(format!("element {i}"))))
                .collect(),
            other => Err(CoerceError::mismatch(<Self as FromValue>::type_label(), &other)),
        }
    }
}

impl<T: Slot + FromValue> Slot for Vec<T> {
    fn type_label(&self) -> Cow<'static, str> {
        <Self as FromValue>::type_label()
    }

    fn assign(&mut self, value: Value) -> CoerceResult<()> {
        *self = <Self as FromValue>::from_value(value)?;
        Ok(())
    }

    fn to_value(&self) -> Value {
        Value::List(self.iter().map(Slot::to_value).collect())
    }

    fn enforce_required(&self, path: &str) -> Result<(), RequiredFieldError> {
        for (i, item) in self.iter().enumerate() {
            item.enforce_required(&join_path(path, &i.to_string()))?;
        }
        Ok(())
    }

    fn finalize_tree(&mut self, path: &str) -> Result<(), LifecycleError> {
        for (i, item) in self.iter_mut().enumerate() {
            item.finalize_tree(&join_path(path, &i.to_string()))?;
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// =============================================================================
// Typed mappings
// =============================================================================

macro_rules! map_slot {
    ($($map:ident),+ $(,)?) => {
        $(
            impl<T: FromValue> FromValue for $map<String, T> {
                fn type_label() -> Cow<'static, str> {
                    Cow::Owned(format!("{}<String, {}>", stringify!($map), T::type_label()))
                }

                fn from_value(value: Value) -> CoerceResult<Self> {
                    match value {
                        Value::Dict(entries) => entries
                            .into_iter()
                            .map(|(key, item)| {
                                let item = T::from_value(item)
                                    .map_err(|e| e.within(format!("key '{key}'")))?;
                                Ok((key, item))
                            })
                            .collect(),
                        other => Err(CoerceError::mismatch(<Self as FromValue>::type_label(), &other)),
                    }
                }
            }

            impl<T: Slot + FromValue> Slot for $map<String, T> {
                fn type_label(&self) -> Cow<'static, str> {
                    <Self as FromValue>::type_label()
                }

                fn assign(&mut self, value: Value) -> CoerceResult<()> {
                    *self = <Self as FromValue>::from_value(value)?;
                    Ok(())
                }

                fn to_value(&self) -> Value {
                    Value::Dict(
                        self.iter()
                            .map(|(key, item)| (key.clone(), item.to_value()))
                            .collect(),
                    )
                }

                fn as_container(&self) -> Option<&dyn Container> {
                    Some(self)
                }

                fn as_container_mut(&mut self) -> Option<&mut dyn Container> {
                    Some(self)
                }

                fn enforce_required(&self, path: &str) -> Result<(), RequiredFieldError> {
                    for (key, item) in self.iter() {
                        item.enforce_required(&join_path(path, key))?;
                    }
                    Ok(())
                }

                fn finalize_tree(&mut self, path: &str) -> Result<(), LifecycleError> {
                    for (key, item) in self.iter_mut() {
                        item.finalize_tree(&join_path(path, key))?;
                    }
                    Ok(())
                }

                fn as_any(&self) -> &dyn Any {
                    self
                }

                fn as_any_mut(&mut self) -> &mut dyn Any {
                    self
                }
            }

            impl<T: Slot + FromValue> Container for $map<String, T> {
                fn kind(&self) -> ContainerKind {
                    ContainerKind::Mapping
                }

                fn contains(&self, key: &str) -> bool {
                    self.contains_key(key)
                }

                fn slot(&self, key: &str) -> Option<&dyn Slot> {
                    self.get(key).map(|item| item as &dyn Slot)
                }

                fn slot_mut(&mut self, key: &str) -> Option<&mut dyn Slot> {
                    self.get_mut(key).map(|item| item as &mut dyn Slot)
                }

                fn set(&mut self, key: &str, value: Value) -> CoerceResult<()> {
                    let item = T::from_value(value).map_err(|e| e.within(format!("key '{key}'")))?;
                    <$map<String, T>>::insert(self, key.to_owned(), item);
                    Ok(())
                }

                fn insert(&mut self, key: &str, value: Value) -> CoerceResult<()> {
                    Container::set(self, key, value)
                }

                fn key_names(&self) -> Vec<String> {
                    <$map<String, T>>::keys(self).cloned().collect()
                }
            }
        )+
    };
}

map_slot!(HashMap, BTreeMap, IndexMap);
