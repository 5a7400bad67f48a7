//! Settings error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading or validating engine settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// File not found at the specified path.
    #[error("Settings file not found: {0}")]
    FileNotFound(PathBuf),

    /// The file extension is unknown or its format feature is disabled.
    #[error("Unsupported or disabled settings file format: .{0}")]
    UnsupportedFormat(String),

    /// Sources could not be merged into the settings schema.
    #[error("Failed to extract settings: {0}")]
    Extract(#[from] Box<figment::Error>),

    /// Invalid settings value.
    #[error("Invalid settings: {message}")]
    ValidationError { message: String },
}

impl SettingsError {
    /// Creates a validation error with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }
}

impl From<figment::Error> for SettingsError {
    fn from(error: figment::Error) -> Self {
        Self::Extract(Box::new(error))
    }
}

/// Result type for settings operations.
pub type SettingsResult<T> = Result<T, SettingsError>;
