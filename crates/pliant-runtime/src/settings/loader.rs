//! Settings loader using figment.
//!
//! # Feature Flags
//!
//! - `toml-config`: enables `pliant.toml`
//! - `yaml-config`: enables `pliant.yaml` / `pliant.yml`
//!
//! Both features can be enabled simultaneously; if so, both file formats are
//! searched and loaded.
//!
//! # Priority (lowest to highest)
//!
//! 1. Built-in defaults
//! 2. Programmatic merges
//! 3. Settings file (`pliant.toml` / `pliant.yaml`)
//! 4. Environment variables (`PLIANT_*`)
//!
//! # Environment Variable Mapping
//!
//! Variables use the `PLIANT_` prefix with `__` as separator:
//!
//! - `PLIANT_EVALUATOR=literal` → `evaluator = "literal"`
//! - `PLIANT_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//!
//! # Example
//!
//! ```rust,ignore
//! use pliant_runtime::settings::SettingsLoader;
//!
//! let settings = SettingsLoader::new()
//!     .file("./pliant.toml")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "yaml-config", feature = "toml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use tracing::{debug, info, trace};

use super::error::{SettingsError, SettingsResult};
use super::schema::Settings;

/// Prefix of environment variables read by the loader.
pub const ENV_PREFIX: &str = "PLIANT_";

/// Settings loader with figment-based multi-source support.
pub struct SettingsLoader {
    /// Base figment instance.
    figment: Figment,
    /// Search paths for settings files.
    search_paths: Vec<PathBuf>,
    /// Whether to load environment variables.
    load_env: bool,
    /// Specific file to load (overrides search).
    settings_file: Option<PathBuf>,
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsLoader {
    pub fn new() -> Self {
        Self {
            figment: Figment::new(),
            search_paths: Vec::new(),
            load_env: true,
            settings_file: None,
        }
    }

    /// Adds a search path for settings files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Adds the current directory to the search paths.
    pub fn with_current_dir(self) -> Self {
        if let Ok(cwd) = std::env::current_dir() {
            self.search_path(cwd)
        } else {
            self
        }
    }

    /// Adds the user config directory to the search paths.
    pub fn with_user_config_dir(self) -> Self {
        if let Some(config_dir) = dirs::config_dir() {
            self.search_path(config_dir.join("pliant"))
        } else {
            self
        }
    }

    /// Sets a specific settings file to load.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.settings_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enables loading environment variables (default: true).
    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges settings programmatically, below files and environment.
    pub fn merge(mut self, settings: Settings) -> Self {
        self.figment = self.figment.merge(Serialized::defaults(settings));
        self
    }

    /// Loads and returns the settings.
    pub fn load(self) -> SettingsResult<Settings> {
        let figment = self.build_figment()?;
        let settings: Settings = figment.extract()?;

        debug!(
            evaluator = %settings.evaluator,
            enforce_required = settings.enforce_required,
            finalize = settings.finalize,
            logging_level = %settings.logging.level,
            "Settings loaded"
        );

        Ok(settings)
    }

    fn build_figment(mut self) -> SettingsResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()));

        let user_figment = std::mem::take(&mut self.figment);
        figment = figment.merge(user_figment);

        if let Some(path) = self.settings_file.take() {
            if !path.exists() {
                return Err(SettingsError::FileNotFound(path));
            }
            info!(path = %path.display(), "Loading settings file");
            figment = Self::merge_settings_file(figment, &path)?;
        } else {
            figment = self.load_settings_files(figment);
        }

        if self.load_env {
            trace!(prefix = ENV_PREFIX, "Loading environment variables");
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        }

        Ok(figment)
    }

    /// Merges a single file, dispatching on its extension.
    fn merge_settings_file(figment: Figment, path: &Path) -> SettingsResult<Figment> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            #[cfg(feature = "toml-config")]
            "toml" => Ok(figment.merge(Toml::file(path))),
            #[cfg(feature = "yaml-config")]
            "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
            _ => {
                let _ = figment;
                Err(SettingsError::UnsupportedFormat(ext.to_owned()))
            }
        }
    }

    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if self.search_paths.is_empty() {
            let mut paths = Vec::new();
            if let Ok(cwd) = std::env::current_dir() {
                paths.push(cwd);
            }
            if let Some(config_dir) = dirs::config_dir() {
                paths.push(config_dir.join("pliant"));
            }
            paths
        } else {
            self.search_paths.clone()
        }
    }

    /// First existing `search_path/base_name`, in search order.
    #[cfg(any(feature = "toml-config", feature = "yaml-config"))]
    fn find_file(search_paths: &[PathBuf], base_names: &[&str]) -> Option<PathBuf> {
        search_paths
            .iter()
            .flat_map(|dir| base_names.iter().map(move |name| dir.join(name)))
            .find(|path| path.exists())
    }

    /// Searches for and loads settings files; each enabled format is searched independently.
    fn load_settings_files(&self, mut figment: Figment) -> Figment {
        let search_paths = self.resolve_search_paths();
        let mut found = false;

        #[cfg(feature = "toml-config")]
        if let Some(path) = Self::find_file(&search_paths, &["pliant.toml"]) {
            info!(path = %path.display(), "Loading settings file");
            figment = figment.merge(Toml::file(path));
            found = true;
        }

        #[cfg(feature = "yaml-config")]
        if let Some(path) = Self::find_file(&search_paths, &["pliant.yaml", "pliant.yml"]) {
            info!(path = %path.display(), "Loading settings file");
            figment = figment.merge(Yaml::file(path));
            found = true;
        }

        if !found {
            trace!(paths = ?search_paths, "No settings file found, using defaults");
        }
        figment
    }
}

/// Loads settings from the default locations.
pub fn load_settings() -> SettingsResult<Settings> {
    SettingsLoader::new().load()
}

/// Loads settings from one file plus the environment.
pub fn load_settings_from_file(path: impl AsRef<Path>) -> SettingsResult<Settings> {
    SettingsLoader::new().file(path).load()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use pliant_grammar::EvaluatorMode;

    use super::*;
    use crate::settings::schema::LogLevel;

    #[test]
    fn test_default_settings() {
        let dir = tempfile::tempdir().unwrap();
        let settings = SettingsLoader::new()
            .search_path(dir.path())
            .without_env()
            .load()
            .unwrap();

        assert_eq!(settings.evaluator, EvaluatorMode::Expression);
        assert!(settings.enforce_required);
        assert!(settings.finalize);
        assert_eq!(settings.logging.level, LogLevel::Warn);
    }

    #[test]
    fn test_programmatic_merge() {
        let dir = tempfile::tempdir().unwrap();
        let settings = SettingsLoader::new()
            .search_path(dir.path())
            .without_env()
            .merge(Settings {
                evaluator: EvaluatorMode::Literal,
                finalize: false,
                ..Default::default()
            })
            .load()
            .unwrap();

        assert_eq!(settings.evaluator, EvaluatorMode::Literal);
        assert!(!settings.finalize);
    }

    #[test]
    fn test_missing_file_is_reported() {
        let result = SettingsLoader::new()
            .file("/definitely/not/here/pliant.toml")
            .without_env()
            .load();
        assert!(matches!(result, Err(SettingsError::FileNotFound(_))));
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        let result = SettingsLoader::new().file(file.path()).without_env().load();
        assert!(matches!(result, Err(SettingsError::UnsupportedFormat(ext)) if ext == "ini"));
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_toml_file_is_found_on_search_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("pliant.toml"),
            "evaluator = \"literal\"\n\n[logging]\nlevel = \"debug\"\n",
        )
        .unwrap();

        let settings = SettingsLoader::new()
            .search_path(dir.path())
            .without_env()
            .load()
            .unwrap();
        assert_eq!(settings.evaluator, EvaluatorMode::Literal);
        assert_eq!(settings.logging.level, LogLevel::Debug);
    }
}
