//! The required-but-unset field marker.

use std::any::Any;
use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::container::Container;
use crate::error::{CoerceResult, LifecycleError, RequiredFieldError};
use crate::slot::{FromValue, Slot};
use crate::value::Value;

/// Rendering of an unset required field in the nested-mapping form.
pub const REQUIRED_MARKER: &str = "<required>";

/// A field that must be assigned before the configuration is used.
///
/// Starts [`Unset`](Required::Unset). Any successful assignment makes it
/// [`Set`](Required::Set); required-field enforcement fails on trees that
/// still contain an unset one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum Required<T> {
    #[default]
    Unset,
    Set(T),
}

impl<T> Required<T> {
    pub fn is_set(&self) -> bool {
        matches!(self, Required::Set(_))
    }

    pub fn get(&self) -> Option<&T> {
        match self {
            Required::Set(value) => Some(value),
            Required::Unset => None,
        }
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        match self {
            Required::Set(value) => Some(value),
            Required::Unset => None,
        }
    }

    /// Returns the value, or a [`RequiredFieldError`] naming `field`.
    pub fn require(&self, field: &str) -> Result<&T, RequiredFieldError> {
        self.get().ok_or_else(|| RequiredFieldError::new(field))
    }

    pub fn set(&mut self, value: T) {
        *self = Required::Set(value);
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Required::Set(value) => Some(value),
            Required::Unset => None,
        }
    }
}

impl<T> From<T> for Required<T> {
    fn from(value: T) -> Self {
        Required::Set(value)
    }
}

impl<T: FromValue> FromValue for Required<T> {
    fn type_label() -> Cow<'static, str> {
        T::type_label()
    }

    fn from_value(value: Value) -> CoerceResult<Self> {
        T::from_value(value).map(Required::Set)
    }
}

impl<T: Slot + FromValue> Slot for Required<T> {
    fn type_label(&self) -> Cow<'static, str> {
        <Self as FromValue>::type_label()
    }

    fn assign(&mut self, value: Value) -> CoerceResult<()> {
        *self = <Self as FromValue>::from_value(value)?;
        Ok(())
    }

    fn to_value(&self) -> Value {
        match self {
            Required::Set(inner) => inner.to_value(),
            Required::Unset => Value::Str(REQUIRED_MARKER.to_owned()),
        }
    }

    fn is_unset(&self) -> bool {
        !self.is_set()
    }

    fn as_container(&self) -> Option<&dyn Container> {
        self.get().and_then(|inner| inner.as_container())
    }

    fn as_container_mut(&mut self) -> Option<&mut dyn Container> {
        self.get_mut().and_then(|inner| inner.as_container_mut())
    }

    fn enforce_required(&self, path: &str) -> Result<(), RequiredFieldError> {
        match self {
            Required::Set(inner) => inner.enforce_required(path),
            Required::Unset => Err(RequiredFieldError::new(path)),
        }
    }

    fn finalize_tree(&mut self, path: &str) -> Result<(), LifecycleError> {
        match self {
            Required::Set(inner) => inner.finalize_tree(path),
            Required::Unset => Ok(()),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assignment_sets_and_coerces() {
        let mut field: Required<i64> = Required::default();
        assert!(field.is_unset());
        field.assign(Value::Float(5.2)).unwrap();
        assert_eq!(field, Required::Set(5));
        assert_eq!(field.to_value(), Value::Int(5));
    }

    #[test]
    fn test_unset_renders_marker_and_fails_enforcement() {
        let field: Required<String> = Required::Unset;
        assert_eq!(field.to_value(), Value::Str(REQUIRED_MARKER.into()));
        let err = field.enforce_required("model.name").unwrap_err();
        assert_eq!(err.path, "model.name");
        assert_eq!(err.to_string(), "missing required key 'model.name'");
    }

    #[test]
    fn test_failed_assignment_leaves_field_unset() {
        let mut field: Required<i64> = Required::Unset;
        assert!(field.assign(Value::Str("abc".into())).is_err());
        assert!(!field.is_set());
        assert!(field.require("x").is_err());
    }
}
