//! The override token grammar.
//!
//! Tokens are processed left to right:
//!
//! | Token                          | Effect                                         |
//! |--------------------------------|------------------------------------------------|
//! | `--show`                       | sets [`ParsedArgs::show`]                      |
//! | `--in <name>` / `in--`         | pushes / pops a key scope                      |
//! | `--list <key> v1 v2 ... list--`| assigns a list to the scoped key               |
//! | `.name` / `.name(a, k=v)`      | method call (not scope-qualified)              |
//! | `key=value` / `+key=value`     | assignment; `+` creates missing mapping keys   |
//!
//! Values go through [`Parser::parse_value`].

use std::sync::Arc;

use indexmap::IndexMap;
use pliant_core::{CallArgs, Value};
use tracing::{debug, trace, warn};

use crate::command::{Assignment, Command, MethodCall, ParsedArgs};
use crate::error::{EvalError, ParseError, ParseResult};
use crate::eval::{Evaluator, EvaluatorMode, ExpressionEvaluator, LiteralEvaluator};
use crate::split::{find_top_level, is_balanced, is_quoted, split_top_level};

pub const SHOW_FLAG: &str = "--show";
pub const SCOPE_START: &str = "--in";
pub const SCOPE_END: &str = "in--";
pub const LIST_START: &str = "--list";
pub const LIST_END: &str = "list--";

/// Parses override tokens into commands.
#[derive(Debug, Clone)]
pub struct Parser {
    evaluator: Arc<dyn Evaluator>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::with_evaluator(Arc::new(ExpressionEvaluator))
    }
}

impl Parser {
    /// A parser using the expression evaluator.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_evaluator(evaluator: Arc<dyn Evaluator>) -> Self {
        Self { evaluator }
    }

    pub fn with_mode(mode: EvaluatorMode) -> Self {
        Self::with_evaluator(mode.evaluator())
    }

    /// Parses a full argument list.
    pub fn parse<I, S>(&self, tokens: I) -> ParseResult<ParsedArgs>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tokens = tokens.into_iter();
        let mut parsed = ParsedArgs::default();
        let mut scope: Vec<String> = Vec::new();

        while let Some(token) = tokens.next() {
            let token = token.as_ref();
            let emitted = parsed.commands.len();
            trace!(token, "Parsing token");

            match token {
                SHOW_FLAG => parsed.show = true,
                SCOPE_START => {
                    let name = tokens.next().ok_or(ParseError::MissingScopeName)?;
                    let name = name.as_ref();
                    if !is_valid_key(name) {
                        return Err(ParseError::InvalidKey {
                            token: format!("{SCOPE_START} {name}"),
                            key: name.to_owned(),
                        });
                    }
                    scope.push(name.to_owned());
                }
                SCOPE_END => {
                    scope.pop().ok_or(ParseError::UnmatchedScopeEnd)?;
                }
                LIST_START => {
                    let key = tokens.next().ok_or(ParseError::MissingListKey)?;
                    let key = key.as_ref().to_owned();
                    let mut values = Vec::new();
                    loop {
                        let Some(item) = tokens.next() else {
                            return Err(ParseError::UnterminatedList { key });
                        };
                        let item = item.as_ref();
                        if item == LIST_END {
                            break;
                        }
                        values.push(self.parse_value(item)?);
                    }
                    let token = format!("{LIST_START} {key}");
                    parsed
                        .commands
                        .push(assignment(&token, &key, &scope, Value::List(values))?);
                }
                method if method.starts_with('.') => {
                    parsed.commands.push(Command::Call(self.method_call(method)?));
                }
                other => {
                    let Some(split) = find_top_level(other, '=') else {
                        return Err(ParseError::Unparseable {
                            token: other.to_owned(),
                        });
                    };
                    let value = self.parse_value(&other[split + 1..])?;
                    parsed
                        .commands
                        .push(assignment(other, &other[..split], &scope, value)?);
                }
            }

            if let Some(command) = parsed.commands.get(emitted) {
                debug!(%command, "Parsed override");
            }
        }

        if !scope.is_empty() {
            warn!(scope = %scope.join("."), "Arguments ended inside an open `--in` scope");
        }
        Ok(parsed)
    }

    /// Parses the right-hand side of an assignment or a list element.
    ///
    /// In order: quoted strings, integers, floats, `None`/`T`/`True`/`F`/
    /// `False`, `[...]` lists of recursively parsed elements, `(...)` through
    /// the evaluator, `{...}` through the literal evaluator with a fallback to
    /// the evaluator, and finally the raw token as a string.
    pub fn parse_value(&self, token: &str) -> ParseResult<Value> {
        if token.len() >= 2 && is_quoted(token) {
            return Ok(Value::Str(token[1..token.len() - 1].to_owned()));
        }
        if let Ok(i) = token.parse::<i64>() {
            return Ok(Value::Int(i));
        }
        if let Ok(x) = token.parse::<f64>() {
            return Ok(Value::Float(x));
        }

        match token {
            "None" => return Ok(Value::Null),
            "T" | "True" => return Ok(Value::Bool(true)),
            "F" | "False" => return Ok(Value::Bool(false)),
            _ => {}
        }

        let literal_error = |source: EvalError| ParseError::Literal {
            token: token.to_owned(),
            source,
        };

        if let Some(inner) = token.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
            let items = split_top_level(inner, ',')
                .into_iter()
                .map(|item| self.parse_value(item))
                .collect::<ParseResult<Vec<_>>>()?;
            return Ok(Value::List(items));
        }
        if token.starts_with('(') && token.ends_with(')') {
            return self.evaluator.evaluate(token).map_err(literal_error);
        }
        if token.starts_with('{') && token.ends_with('}') {
            return LiteralEvaluator
                .evaluate(token)
                .or_else(|_| self.evaluator.evaluate(token))
                .map_err(literal_error);
        }

        Ok(Value::Str(token.to_owned()))
    }

    fn method_call(&self, token: &str) -> ParseResult<MethodCall> {
        let body = &token[1..];
        let unbalanced = || ParseError::UnbalancedCall {
            token: token.to_owned(),
        };

        let (target, inner) = match body.find('(') {
            Some(open) => {
                let inner = body[open + 1..].strip_suffix(')').ok_or_else(unbalanced)?;
                if !is_balanced(inner) {
                    return Err(unbalanced());
                }
                (&body[..open], Some(inner))
            }
            None if body.contains(')') => return Err(unbalanced()),
            None => (body, None),
        };

        if target.is_empty() {
            return Err(ParseError::EmptyMethodName {
                token: token.to_owned(),
            });
        }
        if !is_valid_key(target) {
            return Err(ParseError::InvalidKey {
                token: token.to_owned(),
                key: target.to_owned(),
            });
        }

        let args = match inner {
            Some(inner) => self.call_args(token, inner)?,
            None => CallArgs::default(),
        };
        Ok(MethodCall {
            target: target.to_owned(),
            args,
        })
    }

    fn call_args(&self, token: &str, inner: &str) -> ParseResult<CallArgs> {
        let mut positional = Vec::new();
        let mut keyword = IndexMap::new();

        for argument in split_top_level(inner, ',') {
            if let Some(split) = keyword_split(argument) {
                let name = argument[..split].trim();
                let value = self.parse_value(argument[split + 1..].trim())?;
                if keyword.insert(name.to_owned(), value).is_some() {
                    return Err(ParseError::DuplicateKeyword {
                        token: token.to_owned(),
                        name: name.to_owned(),
                    });
                }
            } else if !keyword.is_empty() {
                return Err(ParseError::PositionalAfterKeyword {
                    token: token.to_owned(),
                    argument: argument.to_owned(),
                });
            } else {
                positional.push(self.parse_value(argument)?);
            }
        }

        Ok(CallArgs::new(positional, keyword))
    }
}

/// Builds an assignment, stripping the create marker and applying the scope.
fn assignment(token: &str, raw_key: &str, scope: &[String], value: Value) -> ParseResult<Command> {
    let (key, create) = match raw_key.strip_prefix('+') {
        Some(key) => (key, true),
        None => (raw_key, false),
    };
    if !is_valid_key(key) {
        return Err(ParseError::InvalidKey {
            token: token.to_owned(),
            key: raw_key.to_owned(),
        });
    }

    let key = if scope.is_empty() {
        key.to_owned()
    } else {
        format!("{}.{key}", scope.join("."))
    };
    Ok(Command::Assign(Assignment { key, value, create }))
}

/// Offset of the `=` in `name=value` when `argument` is a keyword argument.
fn keyword_split(argument: &str) -> Option<usize> {
    let split = find_top_level(argument, '=')?;
    if argument[split + 1..].starts_with('=') {
        return None;
    }
    let name = argument[..split].trim();
    let mut chars = name.chars();
    let starts_ok = chars.next().is_some_and(|c| c.is_alphabetic() || c == '_');
    (starts_ok && chars.all(|c| c.is_alphanumeric() || c == '_')).then_some(split)
}

/// Dotted paths: non-empty segments without whitespace, quotes or brackets.
fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key.split('.').all(|segment| {
            !segment.is_empty()
                && !segment.chars().any(|c| {
                    c.is_whitespace() || matches!(c, '=' | '\'' | '"' | '(' | ')' | '[' | ']' | '{' | '}')
                })
        })
}
