//! Pliant Runtime - applying command-line overrides to configuration trees.
//!
//! This crate provides:
//! - The override pipeline (`Overrides`): parse, apply, enforce, finalize
//! - Command-line entry points (`App`, `run`, `run_with`)
//! - Engine settings (`SettingsLoader`) and logging configuration
//! - YAML and snapshot persistence (`persist`, `ConfigExt`)
//!
//! # Feature Flags
//!
//! - `toml-config`: read engine settings from `pliant.toml`
//! - `yaml-config`: read engine settings from `pliant.yaml`
//! - `json-log`: JSON log lines
//!
//! ```ignore
//! use pliant_runtime::App;
//!
//! fn main() -> anyhow::Result<()> {
//!     App::<TrainConfig>::load()?.run(|config| train(config))?;
//!     Ok(())
//! }
//! ```

pub mod app;
pub mod error;
pub mod logging;
pub mod overrides;
pub mod persist;
pub mod settings;

// Re-exports
pub use app::{App, run, run_with};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::LoggingBuilder;
pub use overrides::{Overrides, apply_commands, apply_overrides};
pub use persist::{ConfigExt, PersistError, PersistResult};
pub use settings::{Settings, SettingsError, SettingsLoader, SettingsResult};
