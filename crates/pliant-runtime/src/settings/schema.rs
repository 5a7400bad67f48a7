//! Settings schema definitions.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use pliant_grammar::EvaluatorMode;
use serde::{Deserialize, Serialize};

/// Engine settings: how overrides are evaluated and applied, and logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Evaluator for `(...)` values and the `{...}` fallback.
    #[serde(default)]
    pub evaluator: EvaluatorMode,

    /// Fail when a required field is still unset after overrides.
    #[serde(default = "default_true")]
    pub enforce_required: bool,

    /// Run finalize hooks after overrides.
    #[serde(default = "default_true")]
    pub finalize: bool,

    /// Logging setup used by the CLI bootstrap.
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            evaluator: EvaluatorMode::default(),
            enforce_required: true,
            finalize: true,
            logging: LoggingSettings::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    #[cfg(feature = "json-log")]
    Json,
}

/// Log destination. Stderr keeps `--show` output on stdout clean.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    Stdout,
    #[default]
    Stderr,
    File,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    /// Target file when `output` is `file`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Include thread IDs in log lines.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include source file and line in log lines.
    #[serde(default)]
    pub file_location: bool,

    /// Per-target levels, e.g. `pliant_core = "trace"`.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,
}
