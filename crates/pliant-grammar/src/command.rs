//! Parsed override commands.

use std::fmt;

use pliant_core::{CallArgs, Value};

/// `key=value`, or `+key=value` when `create` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// Scope-qualified dotted key.
    pub key: String,
    pub value: Value,
    /// Missing mapping keys along the path are created instead of reported.
    pub create: bool,
}

/// `.target` or `.target(args)`.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    /// Dotted path of the method, relative to the root.
    pub target: String,
    pub args: CallArgs,
}

/// One step of an override sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Assign(Assignment),
    Call(MethodCall),
}

impl Command {
    /// Dotted path the command acts on.
    pub fn path(&self) -> &str {
        match self {
            Command::Assign(assignment) => &assignment.key,
            Command::Call(call) => &call.target,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Assign(Assignment { key, value, create }) => {
                if *create {
                    f.write_str("+")?;
                }
                write!(f, "{key}={}", value.repr())
            }
            Command::Call(MethodCall { target, args }) => {
                write!(f, ".{target}(")?;
                let positional = args.positional.iter().map(|value| value.repr().to_string());
                let keyword = args
                    .keyword
                    .iter()
                    .map(|(name, value)| format!("{name}={}", value.repr()));
                let rendered: Vec<String> = positional.chain(keyword).collect();
                write!(f, "{})", rendered.join(", "))
            }
        }
    }
}

/// Result of parsing a full argument list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedArgs {
    /// `--show` was present.
    pub show: bool,
    /// Commands in the order they appeared.
    pub commands: Vec<Command>,
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::*;

    #[test]
    fn test_display() {
        let assign = Command::Assign(Assignment {
            key: "train.lr".into(),
            value: Value::Str("x".into()),
            create: true,
        });
        assert_eq!(assign.to_string(), "+train.lr='x'");

        let mut keyword = IndexMap::new();
        keyword.insert("by".to_owned(), Value::Int(2));
        let call = Command::Call(MethodCall {
            target: "bump".into(),
            args: CallArgs::new(vec![Value::Float(1.0)], keyword),
        });
        assert_eq!(call.to_string(), ".bump(1.0, by=2)");
        assert_eq!(call.path(), "bump");
    }
}
