//! # Pliant Core
//!
//! The value model and tree machinery behind Pliant configurations.
//!
//! A configuration is a tree of typed [`Slot`]s. Interior nodes are
//! [`Container`]s: user-declared [`ConfigNode`]s with a fixed field set,
//! open mappings such as [`Value::Dict`] or `HashMap<String, T>`, and
//! [`Wrapper`]s that stage the fields of a [`Record`] for deferred
//! construction. Override commands are applied through [`resolve`], then
//! [`lifecycle`] enforces required fields and runs finalize hooks.
//!
//! ## Building blocks
//!
//! - [`Value`]: dynamic values produced by the override grammar
//! - [`FromValue`] / [`Leaf`]: coercion into and rendering of leaf types
//! - [`Required<T>`]: a field that must be assigned before use
//! - [`Alias`]: an alternate name for a sibling field
//! - [`Wrapper<T>`]: deferred construction of a [`Record`]
//! - [`CallArgs`] / [`BoundArgs`]: arguments of command-line method calls
//!
//! Configuration nodes are normally declared with `#[derive(Config)]` from
//! `pliant-macros`; the generated code refers to this crate by its absolute
//! path `::pliant_core`.

extern crate self as pliant_core;

pub mod alias;
pub mod call;
pub mod container;
pub mod error;
pub mod lifecycle;
pub mod record;
pub mod required;
pub mod resolve;
pub mod slot;
pub mod value;

pub use alias::Alias;
pub use call::{BoundArgs, CallArgs};
pub use container::{ConfigNode, Container, ContainerKind};
pub use error::{
    CallError, CoerceError, CoerceResult, HookResult, LifecycleError, OverrideError,
    PathResolutionError, RequiredFieldError, WrapperBuildError,
};
pub use lifecycle::{enforce_required, finalize, to_dict};
pub use record::{FieldSpec, Record, RecordDescriptor, Wrapper};
pub use required::{REQUIRED_MARKER, Required};
pub use resolve::{Mode, get_value, lookup};
pub use slot::{FromValue, Leaf, Slot};
pub use value::{Dict, Value};

/// Prelude for common imports.
pub mod prelude {
    pub use super::{
        Alias, BoundArgs, CallArgs, ConfigNode, Container, FromValue, HookResult, Leaf, Record,
        Required, Slot, Value, Wrapper,
    };
}
