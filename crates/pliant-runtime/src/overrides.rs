//! Applying parsed override commands to a configuration tree.
//!
//! [`Overrides`] bundles a grammar [`Parser`] with the two post-override
//! passes. [`Overrides::apply`] runs the whole pipeline on a root node:
//!
//! 1. parse the argument list into commands
//! 2. apply each command in order (assignments and method calls)
//! 3. fail on any required field that is still unset
//! 4. run finalize hooks, children before parents
//!
//! and reports whether `--show` was requested.

use std::sync::Arc;

use pliant_core::resolve::{self, Mode};
use pliant_core::{ConfigNode, Container, OverrideError, lifecycle};
use pliant_grammar::{Command, Evaluator, EvaluatorMode, ParsedArgs, Parser};
use tracing::{debug, trace};

use crate::error::RuntimeResult;
use crate::settings::Settings;

/// The override pipeline with its knobs.
#[derive(Debug, Clone)]
pub struct Overrides {
    parser: Parser,
    enforce_required: bool,
    finalize: bool,
}

impl Default for Overrides {
    fn default() -> Self {
        Self::new()
    }
}

impl Overrides {
    /// Expression evaluator, required-field enforcement and finalization enabled.
    pub fn new() -> Self {
        Self {
            parser: Parser::default(),
            enforce_required: true,
            finalize: true,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new()
            .evaluator(settings.evaluator)
            .enforce_required(settings.enforce_required)
            .finalize(settings.finalize)
    }

    /// Selects one of the built-in evaluators for `(...)` and `{...}` values.
    pub fn evaluator(mut self, mode: EvaluatorMode) -> Self {
        self.parser = Parser::with_mode(mode);
        self
    }

    /// Installs a custom evaluator.
    pub fn with_evaluator(mut self, evaluator: Arc<dyn Evaluator>) -> Self {
        self.parser = Parser::with_evaluator(evaluator);
        self
    }

    pub fn enforce_required(mut self, enabled: bool) -> Self {
        self.enforce_required = enabled;
        self
    }

    pub fn finalize(mut self, enabled: bool) -> Self {
        self.finalize = enabled;
        self
    }

    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    /// Parses `args` without touching any tree.
    pub fn parse<I, S>(&self, args: I) -> RuntimeResult<ParsedArgs>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(self.parser.parse(args)?)
    }

    /// Parses `args` and applies them to `config`; returns the show flag.
    pub fn apply<C, I, S>(&self, config: &mut C, args: I) -> RuntimeResult<bool>
    where
        C: ConfigNode,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let parsed = self.parse(args)?;
        debug!(
            config = config.type_name(),
            commands = parsed.commands.len(),
            show = parsed.show,
            "Applying overrides"
        );

        apply_commands(config, &parsed.commands)?;

        if self.enforce_required {
            trace!(config = config.type_name(), "Enforcing required fields");
            lifecycle::enforce_required(&*config)?;
        }

        if self.finalize {
            trace!(config = config.type_name(), "Finalizing");
            lifecycle::finalize(config)?;
        }

        Ok(parsed.show)
    }
}

/// Applies commands in order, stopping at the first failure.
pub fn apply_commands(root: &mut dyn Container, commands: &[Command]) -> Result<(), OverrideError> {
    for command in commands {
        debug!(command = %command, "Applying command");
        match command {
            Command::Assign(assignment) => {
                let mode = if assignment.create {
                    Mode::Create
                } else {
                    Mode::Strict
                };
                resolve::assign(root, &assignment.key, assignment.value.clone(), mode)?;
            }
            Command::Call(call) => {
                resolve::call(root, &call.target, call.args.clone())?;
            }
        }
    }
    Ok(())
}

/// Applies `args` to `config` with the default pipeline; returns the show flag.
pub fn apply_overrides<C, I, S>(config: &mut C, args: I) -> RuntimeResult<bool>
where
    C: ConfigNode,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Overrides::new().apply(config, args)
}
