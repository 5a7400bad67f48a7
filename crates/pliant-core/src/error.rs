//! Error types for the configuration tree.
//!
//! Each concern gets its own enum so callers can match on the failure they
//! care about; [`OverrideError`] ties the per-command failures together.

use std::borrow::Cow;

use thiserror::Error;

use crate::value::Value;

// =============================================================================
// Coercion Errors
// =============================================================================

/// A value could not be converted to the type a slot declares.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("cannot convert to {expected}: {reason}")]
pub struct CoerceError {
    /// Label of the target type.
    pub expected: Cow<'static, str>,
    /// Why the conversion failed.
    pub reason: String,
}

impl CoerceError {
    /// Creates a coercion error with a free-form reason.
    pub fn new(expected: impl Into<Cow<'static, str>>, reason: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
            reason: reason.into(),
        }
    }

    /// Creates an error for a value whose kind the target cannot accept.
    pub fn mismatch(expected: impl Into<Cow<'static, str>>, got: &Value) -> Self {
        Self::new(expected, format!("got {} {}", got.kind_name(), got.repr()))
    }

    /// Prefixes the reason with the element or field the failure came from.
    pub fn within(mut self, location: impl std::fmt::Display) -> Self {
        self.reason = format!("{location}: {}", self.reason);
        self
    }
}

// =============================================================================
// Path Resolution Errors
// =============================================================================

/// A dotted key path could not be followed through the tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathResolutionError {
    /// The key path was empty or contained an empty segment.
    #[error("invalid key path '{path}'")]
    InvalidPath {
        /// The offending path.
        path: String,
    },

    /// A segment does not exist on the container it was looked up in.
    #[error("config does not have attribute '{path}' (failed at '{failed_at}')")]
    NotFound {
        /// The full path that was being resolved.
        path: String,
        /// The prefix up to and including the missing segment.
        failed_at: String,
    },

    /// An intermediate segment names a value that cannot hold keys.
    #[error("'{failed_at}' in '{path}' is a {type_label}, not a container")]
    NotAContainer {
        /// The full path that was being resolved.
        path: String,
        /// The prefix naming the leaf.
        failed_at: String,
        /// Type label of the leaf.
        type_label: String,
    },

    /// Create mode tried to add a key to a container with a fixed field set.
    #[error("cannot add '{failed_at}' in '{path}': {type_label} has a fixed set of fields")]
    FixedFields {
        /// The full path that was being resolved.
        path: String,
        /// The prefix naming the new key.
        failed_at: String,
        /// Type label of the container.
        type_label: String,
    },

    /// Alias fields redirect back onto themselves.
    #[error("alias cycle at '{failed_at}' in '{path}': {}", chain.join(" -> "))]
    AliasCycle {
        /// The full path that was being resolved.
        path: String,
        /// The prefix where the cycle was detected.
        failed_at: String,
        /// The names visited, in order.
        chain: Vec<String>,
    },

    /// A method-call target does not name a registered method.
    #[error("'{path}' is not a callable method")]
    NotCallable {
        /// The call target path.
        path: String,
    },
}

// =============================================================================
// Method Call Errors
// =============================================================================

/// Argument binding and dispatch failures for node methods.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CallError {
    /// The node has no method by that name.
    #[error("{type_name} has no method '{method}'")]
    UnknownMethod {
        /// Node type name.
        type_name: &'static str,
        /// Requested method.
        method: String,
    },

    /// More positional arguments than declared parameters.
    #[error("takes {expected} positional argument(s) but {got} were given")]
    TooManyPositional {
        /// Declared parameter count.
        expected: usize,
        /// Supplied positional count.
        got: usize,
    },

    /// A keyword names no declared parameter.
    #[error("got an unexpected keyword argument '{0}'")]
    UnexpectedKeyword(String),

    /// A parameter was bound both positionally and by keyword.
    #[error("got multiple values for argument '{0}'")]
    DuplicateArgument(String),

    /// A required parameter was not supplied.
    #[error("missing required argument '{0}'")]
    MissingArgument(String),

    /// A supplied argument could not be converted.
    #[error("argument '{name}': {source}")]
    Argument {
        /// Parameter name.
        name: String,
        /// Conversion failure.
        #[source]
        source: CoerceError,
    },
}

impl CallError {
    /// Creates an unknown-method error.
    pub fn unknown_method(type_name: &'static str, method: impl Into<String>) -> Self {
        Self::UnknownMethod {
            type_name,
            method: method.into(),
        }
    }
}

// =============================================================================
// Lifecycle Errors
// =============================================================================

/// A required field was still unset when enforcement ran.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing required key '{path}'")]
pub struct RequiredFieldError {
    /// Full dotted path of the unset field.
    pub path: String,
}

impl RequiredFieldError {
    /// Creates the error for the field at `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// Failures during required-field enforcement or finalization.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// A required field was unset.
    #[error(transparent)]
    Required(#[from] RequiredFieldError),

    /// A node's finalize hook returned an error.
    #[error("finalize failed for {type_name} at '{path}': {source}")]
    Finalize {
        /// Dotted path of the node, `<root>` for the top level.
        path: String,
        /// Node type name.
        type_name: &'static str,
        /// Error returned by the hook.
        #[source]
        source: anyhow::Error,
    },
}

/// Building a record from its wrapper failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WrapperBuildError {
    /// A field without a default was never assigned.
    #[error("missing required key '{field}' for {type_name}")]
    MissingField {
        /// Record type name.
        type_name: &'static str,
        /// The unset field.
        field: String,
    },

    /// The staged values did not convert into the record.
    #[error("cannot build {type_name}: {source}")]
    Construct {
        /// Record type name.
        type_name: &'static str,
        /// Conversion failure.
        #[source]
        source: CoerceError,
    },
}

// =============================================================================
// Override Errors
// =============================================================================

/// Failure of a single override command against the tree.
#[derive(Debug, Error)]
pub enum OverrideError {
    /// The key path could not be resolved.
    #[error(transparent)]
    Path(#[from] PathResolutionError),

    /// The value was rejected by the target slot.
    #[error("cannot assign '{path}': {source}")]
    Coercion {
        /// The assignment key.
        path: String,
        /// Conversion failure.
        #[source]
        source: CoerceError,
    },

    /// A method returned an error.
    #[error("method '{path}' failed: {source}")]
    Method {
        /// The call target.
        path: String,
        /// Error returned by the method.
        #[source]
        source: anyhow::Error,
    },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for coercions.
pub type CoerceResult<T> = Result<T, CoerceError>;

/// Result type returned by finalize hooks and node methods.
pub type HookResult = anyhow::Result<()>;
