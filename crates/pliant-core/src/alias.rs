//! Alias fields: alternate names for sibling fields.

use std::any::Any;
use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoerceError, CoerceResult};
use crate::slot::{FromValue, Slot};
use crate::value::Value;

/// A field that redirects reads and writes to a sibling field.
///
/// ```rust,ignore
/// #[derive(Config)]
/// struct Train {
///     learning_rate: f64,
///     lr: Alias,
/// }
///
/// impl Default for Train {
///     fn default() -> Self {
///         Self { learning_rate: 1e-3, lr: Alias::to("learning_rate") }
///     }
/// }
/// ```
///
/// The target names a field of the same container. It may itself be an
/// alias; chains are followed until a non-alias field is reached.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Alias {
    target: String,
}

impl Alias {
    pub fn to(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

impl fmt::Display for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Alias({})", self.target)
    }
}

impl FromValue for Alias {
    fn type_label() -> Cow<'static, str> {
        Cow::Borrowed("Alias")
    }

    fn from_value(value: Value) -> CoerceResult<Self> {
        match value {
            Value::Str(target) => Ok(Alias::to(target)),
            other => Err(CoerceError::mismatch("Alias", &other)),
        }
    }
}

/// Aliases are resolved before assignment, so a direct write is a bug.
impl Slot for Alias {
    fn type_label(&self) -> Cow<'static, str> {
        <Self as FromValue>::type_label()
    }

    fn assign(&mut self, _value: Value) -> CoerceResult<()> {
        Err(CoerceError::new(
            "Alias",
            format!("alias of '{}' cannot hold a value", self.target),
        ))
    }

    fn to_value(&self) -> Value {
        Value::Str(self.to_string())
    }

    fn alias_target(&self) -> Option<&str> {
        Some(&self.target)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
