//! Evaluation of parenthesized and braced override values.
//!
//! Text such as `(1+2)` or `{1, 2}` is handed to an [`Evaluator`]. Two are
//! provided:
//!
//! - [`LiteralEvaluator`] accepts literals only: numbers (optionally signed),
//!   strings, `None`/`True`/`False`, and lists, tuples, sets and dicts of
//!   literals.
//! - [`ExpressionEvaluator`] additionally accepts arithmetic, comparisons,
//!   `and`/`or`/`not`, indexing, single-clause comprehensions and the
//!   builtins `range len min max sum abs list tuple set sorted int float
//!   str bool`.
//!
//! # Security
//!
//! Expression mode is a small closed language, not an embedded interpreter:
//! it has no attribute access, no imports, no I/O and no user-defined
//! functions. Integer arithmetic is checked, one evaluation may build at most
//! [`MAX_ITEMS`] elements in total (nested elements and string bytes
//! included) and nesting is capped at [`MAX_DEPTH`].
//! Command lines can still make it do bounded amounts of work; select
//! [`EvaluatorMode::Literal`] where overrides come from untrusted input.

mod interp;
mod lexer;
mod parser;

use std::fmt;
use std::sync::Arc;

use pliant_core::Value;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{EvalError, EvalResult};

pub use interp::MAX_ITEMS;
pub use parser::MAX_DEPTH;

/// Turns the text of a literal into a [`Value`].
pub trait Evaluator: fmt::Debug + Send + Sync {
    fn evaluate(&self, source: &str) -> EvalResult<Value>;
}

/// Accepts plain literals and nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteralEvaluator;

impl Evaluator for LiteralEvaluator {
    fn evaluate(&self, source: &str) -> EvalResult<Value> {
        let expr = parser::parse(source)?;
        if !expr.is_literal() {
            return Err(EvalError::NotLiteral);
        }
        interp::evaluate(&expr)
    }
}

/// Literals plus the expression subset described in the module docs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpressionEvaluator;

impl Evaluator for ExpressionEvaluator {
    fn evaluate(&self, source: &str) -> EvalResult<Value> {
        let expr = parser::parse(source)?;
        let value = interp::evaluate(&expr)?;
        trace!(source, value = %value.repr(), "Evaluated expression");
        Ok(value)
    }
}

/// Which evaluator handles `(...)` and the `{...}` fallback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluatorMode {
    Literal,
    #[default]
    Expression,
}

impl EvaluatorMode {
    pub fn evaluator(self) -> Arc<dyn Evaluator> {
        match self {
            EvaluatorMode::Literal => Arc::new(LiteralEvaluator),
            EvaluatorMode::Expression => Arc::new(ExpressionEvaluator),
        }
    }
}

impl fmt::Display for EvaluatorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EvaluatorMode::Literal => "literal",
            EvaluatorMode::Expression => "expression",
        })
    }
}
