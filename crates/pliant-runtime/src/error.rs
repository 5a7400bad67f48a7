//! Runtime error types.

use pliant_core::{LifecycleError, OverrideError, RequiredFieldError};
use pliant_grammar::ParseError;
use thiserror::Error;

use crate::persist::PersistError;
use crate::settings::SettingsError;

/// Errors that can occur while turning arguments into a finished configuration.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The argument list did not follow the override grammar.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// An override command failed against the tree.
    #[error(transparent)]
    Override(#[from] OverrideError),

    /// A required field was still unset after all overrides.
    #[error(transparent)]
    Required(#[from] RequiredFieldError),

    /// A finalize hook failed.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// Engine settings could not be loaded.
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    /// Saving or loading a configuration failed.
    #[error(transparent)]
    Persist(#[from] PersistError),

    /// Writing the `--show` dump failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
