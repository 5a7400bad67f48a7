//! # Pliant
//!
//! Declarative configuration objects driven by command-line overrides.
//!
//! ## Overview
//!
//! A program declares its configuration as plain structs with defaults.
//! Pliant turns the command line into an ordered list of override commands
//! and applies them to a freshly built tree:
//!
//! ```text
//! argv ──▶ Parser ──▶ [Command] ──▶ resolve + coerce ──▶ enforce required ──▶ finalize ──▶ f(config)
//!                                                                                      └─▶ --show: YAML dump
//! ```
//!
//! - **Grammar**: `key=value`, `+key=value`, `--in scope ... in--`,
//!   `--list key ... list--`, `.method(args)` and `--show`
//! - **Resolution**: dotted paths through nodes, mappings, record wrappers
//!   and alias fields
//! - **Coercion**: parsed values are converted to each field's declared type
//! - **Lifecycle**: required-field enforcement, then finalize hooks from the
//!   leaves up
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pliant::prelude::*;
//!
//! #[derive(Debug, Config)]
//! #[config(crate = "pliant::core", finalize = finish)]
//! struct Train {
//!     lr: f64,
//!     steps: Required<i64>,
//!     #[config(skip)]
//!     warmup: i64,
//! }
//!
//! impl Default for Train {
//!     fn default() -> Self {
//!         Self { lr: 1e-3, steps: Required::Unset, warmup: 0 }
//!     }
//! }
//!
//! impl Train {
//!     fn finish(&mut self) -> HookResult {
//!         self.warmup = self.steps.require("steps")? / 10;
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> anyhow::Result<()> {
//!     // ./train steps=1000 lr=(3e-4 * 2)
//!     pliant::run(|config: Train| println!("{config:?}"))?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: engine settings from `pliant.toml` (default)
//! - `yaml-config`: engine settings from `pliant.yaml`
//! - `json-log`: JSON log lines

pub use pliant_core as core;
pub use pliant_grammar as grammar;
pub use pliant_runtime as runtime;

pub use pliant_macros::{Config, Record};

pub use pliant_core::{
    Alias, CallArgs, ConfigNode, Required, Value, Wrapper, enforce_required, finalize, to_dict,
};
pub use pliant_grammar::{EvaluatorMode, parse};
pub use pliant_runtime::{
    App, ConfigExt, Overrides, RuntimeError, RuntimeResult, apply_overrides, run, run_with,
};

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use pliant::prelude::*;
/// ```
pub mod prelude {
    // Derives
    pub use pliant_macros::{Config, Record};

    // Field types and node traits
    pub use pliant_core::prelude::*;

    // Entry points
    pub use pliant_runtime::{App, ConfigExt, Overrides, RuntimeError, RuntimeResult};
    pub use pliant_grammar::EvaluatorMode;
}
