//! # Pliant Grammar
//!
//! Turns a flat list of command-line tokens into override [`Command`]s.
//!
//! ```rust,ignore
//! use pliant_grammar::{Command, parse};
//!
//! let parsed = parse(["--in", "optim", "lr=1e-3", "in--", ".warmup(5)"])?;
//! assert_eq!(parsed.commands[0].path(), "optim.lr");
//! ```
//!
//! Parenthesized values such as `(2**10)` and the fallback for braced values
//! go through a pluggable [`Evaluator`]; see [`eval`] for what the default
//! expression mode accepts and how to restrict it to literals.

pub mod command;
pub mod error;
pub mod eval;
pub mod parser;
pub mod split;

pub use command::{Assignment, Command, MethodCall, ParsedArgs};
pub use error::{EvalError, EvalResult, ParseError, ParseResult};
pub use eval::{Evaluator, EvaluatorMode, ExpressionEvaluator, LiteralEvaluator};
pub use parser::Parser;

use pliant_core::Value;

/// Parses `tokens` with the default expression evaluator.
pub fn parse<I, S>(tokens: I) -> ParseResult<ParsedArgs>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Parser::default().parse(tokens)
}

/// Parses one value literal with the default expression evaluator.
pub fn parse_value(token: &str) -> ParseResult<Value> {
    Parser::default().parse_value(token)
}
