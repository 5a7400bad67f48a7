//! Error types for the override grammar and the literal evaluator.

use thiserror::Error;

// =============================================================================
// Evaluation Errors
// =============================================================================

/// Failures of the literal/expression evaluator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// The text is not a well-formed expression.
    #[error("syntax error at offset {offset}: {message}")]
    Syntax {
        /// Character offset of the offending token.
        offset: usize,
        /// What was expected.
        message: String,
    },

    /// Literal mode saw an operator, name or call.
    #[error("only literal values are accepted in literal mode")]
    NotLiteral,

    /// A bare name that is not a comprehension variable.
    #[error("name '{0}' is not defined")]
    UnknownName(String),

    /// A call to something outside the builtin set.
    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    /// An operation was applied to values of the wrong kind.
    #[error("{0}")]
    Type(String),

    /// Bad arguments to a builtin.
    #[error("{function}(): {message}")]
    Argument {
        /// The builtin name.
        function: &'static str,
        /// What was wrong.
        message: String,
    },

    #[error("division by zero")]
    ZeroDivision,

    #[error("integer overflow")]
    Overflow,

    #[error("index {0} out of range")]
    IndexOutOfRange(i64),

    #[error("key '{0}' not found")]
    KeyNotFound(String),

    /// The values built during one evaluation exceeded the size cap.
    #[error("expression builds more than {limit} elements")]
    TooLarge {
        /// The cap that was hit.
        limit: usize,
    },

    /// Nesting exceeded the parser's depth cap.
    #[error("expression nests deeper than {limit} levels")]
    TooDeep {
        /// The cap that was hit.
        limit: usize,
    },
}

impl EvalError {
    /// Creates a syntax error at `offset`.
    pub fn syntax(offset: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            offset,
            message: message.into(),
        }
    }

    /// Creates a type error.
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::Type(message.into())
    }

    /// Creates a builtin argument error.
    pub fn argument(function: &'static str, message: impl Into<String>) -> Self {
        Self::Argument {
            function,
            message: message.into(),
        }
    }
}

// =============================================================================
// Parse Errors
// =============================================================================

/// A malformed override token.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("`--in` must be followed by a scope name")]
    MissingScopeName,

    #[error("`in--` without a matching `--in`")]
    UnmatchedScopeEnd,

    #[error("`--list` must be followed by a key")]
    MissingListKey,

    #[error("`--list {key}` is not terminated by `list--`")]
    UnterminatedList {
        /// The list key as written.
        key: String,
    },

    #[error("unbalanced parentheses in method call '{token}'")]
    UnbalancedCall {
        /// The offending token.
        token: String,
    },

    #[error("empty method name in '{token}'")]
    EmptyMethodName {
        /// The offending token.
        token: String,
    },

    #[error("positional argument '{argument}' follows keyword arguments in '{token}'")]
    PositionalAfterKeyword {
        /// The offending token.
        token: String,
        /// The misplaced argument.
        argument: String,
    },

    #[error("keyword argument '{name}' repeated in '{token}'")]
    DuplicateKeyword {
        /// The offending token.
        token: String,
        /// The repeated keyword.
        name: String,
    },

    #[error("invalid key '{key}' in '{token}'")]
    InvalidKey {
        /// The offending token.
        token: String,
        /// The key as written.
        key: String,
    },

    #[error("cannot parse '{token}': expected key=value, .method(...), or a flag")]
    Unparseable {
        /// The offending token.
        token: String,
    },

    #[error("cannot evaluate '{token}': {source}")]
    Literal {
        /// The literal text handed to the evaluator.
        token: String,
        /// Why evaluation failed.
        #[source]
        source: EvalError,
    },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for grammar parsing.
pub type ParseResult<T> = Result<T, ParseError>;

/// Result type for evaluation.
pub type EvalResult<T> = Result<T, EvalError>;
