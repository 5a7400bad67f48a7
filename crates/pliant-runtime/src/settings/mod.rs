//! Settings of the override engine itself.
//!
//! Layered from defaults, an optional settings file and `PLIANT_*`
//! environment variables. These settings tune how overrides are applied;
//! they are separate from the user's configuration tree.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{SettingsError, SettingsResult};
pub use loader::{SettingsLoader, load_settings, load_settings_from_file};
pub use schema::{LogFormat, LogLevel, LogOutput, LoggingSettings, Settings};
pub use validation::validate_settings;
