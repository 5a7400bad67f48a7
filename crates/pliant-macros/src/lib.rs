//! Procedural macros for the Pliant configuration framework.
//!
//! This crate provides:
//!
//! - `#[derive(Config)]` - Turns a struct into a configuration node
//! - `#[derive(Record)]` - Describes a struct for deferred construction through `Wrapper<T>`
//!
//! Generated code refers to `::pliant_core` by default. Crates that only
//! depend on the `pliant` facade can point the macros elsewhere with
//! `#[config(crate = "pliant::core")]` or `#[record(crate = "pliant::core")]`.

mod attrs;
mod config;
mod record;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Derives `ConfigNode`, `Container`, `Slot` and `FromValue` for a struct
/// with named fields.
///
/// # Attributes
///
/// - `#[config(finalize = fn_name)]` - Hook run after overrides, as `fn(&mut self) -> HookResult`
/// - `#[config(methods(a, b))]` - Inherent methods callable as `.a(...)`, each `fn(&mut self, CallArgs) -> HookResult`
/// - `#[config(crate = "path")]` - Path to the core crate
/// - `#[config(default)]` - Node is `Default`, so `Option<Node>`, `Vec<Node>` and map entries
///   can be built from dict literals
/// - `#[config(skip)]` on a field - Hide the field from overrides and rendering
///
/// # Example
///
/// ```rust,ignore
/// use pliant::prelude::*;
///
/// #[derive(Config)]
/// #[config(finalize = finish, methods(double_batch))]
/// struct Train {
///     batch_size: i64,
///     steps: Required<i64>,
///     bs: Alias,
///     #[config(skip)]
///     total: i64,
/// }
///
/// impl Train {
///     fn finish(&mut self) -> HookResult {
///         self.total = self.batch_size * self.steps.require("steps")?;
///         Ok(())
///     }
///
///     fn double_batch(&mut self, args: CallArgs) -> HookResult {
///         args.expect_none()?;
///         self.batch_size *= 2;
///         Ok(())
///     }
/// }
/// ```
#[proc_macro_derive(Config, attributes(config))]
pub fn derive_config(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match config::derive_config(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Derives `Record` for a struct with named fields.
///
/// Fields without a default must be assigned before `Wrapper::build` succeeds.
///
/// # Attributes
///
/// - `#[record(default)]` on a field - Default via `Default::default()`
/// - `#[record(default = expr)]` on a field - Default via `Into::into(expr)`
/// - `#[record(crate = "path")]` - Path to the core crate
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Record)]
/// struct Optimizer {
///     lr: f64,
///     #[record(default = 0.9)]
///     momentum: f64,
///     #[record(default)]
///     nesterov: bool,
/// }
/// ```
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match record::derive_record(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
