//! Command-line entry points.
//!
//! An [`App`] owns the override pipeline for one root configuration type.
//! Running it builds `C::default()`, applies the process arguments, checks
//! required fields and finalizes. With `--show` the finished tree is printed
//! as sorted YAML and the callback is skipped; otherwise the callback
//! receives the configuration and its result is returned.
//!
//! ```rust,ignore
//! use pliant::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     pliant::run(|config: TrainConfig| train(&config))?;
//!     Ok(())
//! }
//! ```

use std::io::{self, Write};
use std::marker::PhantomData;

use pliant_core::{ConfigNode, to_dict};
use pliant_grammar::EvaluatorMode;
use tracing::{debug, info};

use crate::error::RuntimeResult;
use crate::logging;
use crate::overrides::Overrides;
use crate::persist::to_yaml_string;
use crate::settings::{LoggingSettings, Settings, SettingsLoader, validate_settings};

/// Entry point for programs configured by a `C` tree.
#[derive(Debug)]
pub struct App<C> {
    overrides: Overrides,
    logging: Option<LoggingSettings>,
    _config: PhantomData<fn() -> C>,
}

impl<C: ConfigNode + Default> Default for App<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ConfigNode + Default> App<C> {
    /// Default pipeline; logging is left to the caller.
    pub fn new() -> Self {
        Self {
            overrides: Overrides::new(),
            logging: None,
            _config: PhantomData,
        }
    }

    /// Pipeline and logging taken from `settings`.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            overrides: Overrides::from_settings(settings),
            logging: Some(settings.logging.clone()),
            _config: PhantomData,
        }
    }

    /// Loads engine settings from the default locations and the environment.
    pub fn load() -> RuntimeResult<Self> {
        let settings = SettingsLoader::new().load()?;
        validate_settings(&settings)?;
        Ok(Self::from_settings(&settings))
    }

    pub fn overrides(mut self, overrides: Overrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn evaluator(mut self, mode: EvaluatorMode) -> Self {
        self.overrides = self.overrides.evaluator(mode);
        self
    }

    /// Installs a subscriber from `logging` when the app runs.
    pub fn with_logging(mut self, logging: LoggingSettings) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Runs with the process arguments, minus the program name.
    pub fn run<F, R>(self, f: F) -> RuntimeResult<Option<R>>
    where
        F: FnOnce(C) -> R,
    {
        self.run_with(std::env::args().skip(1), f)
    }

    /// Runs with an explicit argument list; `--show` output goes to stdout.
    pub fn run_with<I, S, F, R>(self, args: I, f: F) -> RuntimeResult<Option<R>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: FnOnce(C) -> R,
    {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.run_to(args, &mut out, f)
    }

    /// Runs with an explicit argument list, writing `--show` output to `out`.
    pub fn run_to<I, S, W, F, R>(self, args: I, out: &mut W, f: F) -> RuntimeResult<Option<R>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        W: Write,
        F: FnOnce(C) -> R,
    {
        if let Some(settings) = &self.logging {
            logging::init_from_settings(settings);
        }

        let mut config = C::default();
        let show = self.overrides.apply(&mut config, args)?;

        if show {
            info!(config = config.type_name(), "Showing configuration");
            let text = to_yaml_string(&to_dict(&config))?;
            out.write_all(text.as_bytes())?;
            out.flush()?;
            return Ok(None);
        }

        debug!(config = config.type_name(), "Invoking entry point");
        Ok(Some(f(config)))
    }
}

/// Runs `f` on a `C` configured from the process arguments.
pub fn run<C, F, R>(f: F) -> RuntimeResult<Option<R>>
where
    C: ConfigNode + Default,
    F: FnOnce(C) -> R,
{
    App::<C>::new().run(f)
}

/// Runs `f` on a `C` configured from `args`.
pub fn run_with<C, I, S, F, R>(args: I, f: F) -> RuntimeResult<Option<R>>
where
    C: ConfigNode + Default,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    F: FnOnce(C) -> R,
{
    App::<C>::new().run_with(args, f)
}
