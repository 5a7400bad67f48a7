//! Arguments for node methods invoked from the command line.
//!
//! A `.method(1, scale=2)` command arrives as [`CallArgs`]. The method binds
//! them against its parameter list and pulls typed values out:
//!
//! ```rust,ignore
//! fn inc_epochs(&mut self, args: CallArgs) -> HookResult {
//!     let mut args = args.bind(&["by", "cap"])?;
//!     let by: i64 = args.required("by")?;
//!     let cap: Option<i64> = args.optional("cap")?;
//!     self.epochs = cap.map_or(self.epochs + by, |c| (self.epochs + by).min(c));
//!     Ok(())
//! }
//! ```

use indexmap::IndexMap;

use crate::error::CallError;
use crate::slot::FromValue;
use crate::value::Value;

/// Positional and keyword arguments of a method-call command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    pub positional: Vec<Value>,
    pub keyword: IndexMap<String, Value>,
}

impl CallArgs {
    pub fn new(positional: Vec<Value>, keyword: IndexMap<String, Value>) -> Self {
        Self {
            positional,
            keyword,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }

    /// Fails unless no arguments were passed.
    pub fn expect_none(&self) -> Result<(), CallError> {
        self.clone().bind(&[]).map(|_| ())
    }

    /// Matches arguments to `params`: positionals fill parameters in order,
    /// keywords fill them by name.
    pub fn bind(self, params: &[&str]) -> Result<BoundArgs, CallError> {
        if self.positional.len() > params.len() {
            return Err(CallError::TooManyPositional {
                expected: params.len(),
                got: self.positional.len(),
            });
        }

        let mut values: IndexMap<String, Value> = params
            .iter()
            .zip(self.positional)
            .map(|(name, value)| ((*name).to_owned(), value))
            .collect();

        for (name, value) in self.keyword {
            if !params.contains(&name.as_str()) {
                return Err(CallError::UnexpectedKeyword(name));
            }
            if values.contains_key(&name) {
                return Err(CallError::DuplicateArgument(name));
            }
            values.insert(name, value);
        }

        Ok(BoundArgs { values })
    }
}

/// Arguments matched to parameter names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundArgs {
    values: IndexMap<String, Value>,
}

impl BoundArgs {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Takes and converts a parameter that must be present.
    pub fn required<T: FromValue>(&mut self, name: &str) -> Result<T, CallError> {
        self.optional(name)?
            .ok_or_else(|| CallError::MissingArgument(name.to_owned()))
    }

    /// Takes and converts a parameter that may be absent.
    pub fn optional<T: FromValue>(&mut self, name: &str) -> Result<Option<T>, CallError> {
        self.values
            .shift_remove(name)
            .map(|value| {
                T::from_value(value).map_err(|source| CallError::Argument {
                    name: name.to_owned(),
                    source,
                })
            })
            .transpose()
    }
}
