//! Recursive-descent parser producing the expression tree.
//!
//! Precedence, loosest first: `or`, `and`, `not`, comparisons (chained),
//! `+ -`, `* / // %`, unary sign, `**` (right associative), then calls and
//! indexing. A comma at the top level builds a tuple.

use pliant_core::Value;

use super::lexer::{Lexeme, Token, tokenize};
use crate::error::{EvalError, EvalResult};

/// Nesting cap for brackets and operator chains.
pub const MAX_DEPTH: usize = 64;

const RESERVED: [&str; 9] = ["and", "or", "not", "in", "for", "if", "else", "is", "lambda"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::FloorDiv => "//",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "**",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::In => "in",
            CompareOp::NotIn => "not in",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    List,
    Set,
    Dict,
}

/// `[element for var in iter if filter]` and its set/dict forms.
#[derive(Debug, Clone, PartialEq)]
pub struct Comprehension {
    pub kind: CollectionKind,
    /// The element, or the key of a dict comprehension.
    pub element: Expr,
    /// The value of a dict comprehension.
    pub value: Option<Expr>,
    pub var: String,
    pub iter: Expr,
    pub filter: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Name(String),
    List(Vec<Expr>),
    Tuple(Vec<Expr>),
    Set(Vec<Expr>),
    Dict(Vec<(Expr, Expr)>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Compare(Box<Expr>, Vec<(CompareOp, Expr)>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Call { function: String, args: Vec<Expr> },
    Index { target: Box<Expr>, index: Box<Expr> },
    Comprehension(Box<Comprehension>),
}

impl Expr {
    /// Whether the tree is a plain literal: scalars, signed numbers and
    /// collections of literals.
    pub fn is_literal(&self) -> bool {
        match self {
            Expr::Literal(_) => true,
            Expr::List(items) | Expr::Tuple(items) | Expr::Set(items) => {
                items.iter().all(Expr::is_literal)
            }
            Expr::Dict(pairs) => pairs.iter().all(|(k, v)| k.is_literal() && v.is_literal()),
            Expr::Unary(_, inner) => {
                matches!(**inner, Expr::Literal(Value::Int(_) | Value::Float(_)))
            }
            _ => false,
        }
    }
}

/// Parses a complete expression.
pub fn parse(source: &str) -> EvalResult<Expr> {
    let mut parser = Parser {
        lexemes: tokenize(source)?,
        pos: 0,
        depth: 0,
        end: source.chars().count(),
    };
    if parser.lexemes.is_empty() {
        return Err(EvalError::syntax(0, "empty expression"));
    }

    let expr = parser.expression_list()?;
    if parser.pos < parser.lexemes.len() {
        return Err(parser.unexpected());
    }
    Ok(expr)
}

struct Parser {
    lexemes: Vec<Lexeme>,
    pos: usize,
    depth: usize,
    end: usize,
}

impl Parser {
    // =========================================================================
    // Token helpers
    // =========================================================================

    fn peek(&self) -> Option<&Token> {
        self.lexemes.get(self.pos).map(|lexeme| &lexeme.token)
    }

    fn offset(&self) -> usize {
        self.lexemes.get(self.pos).map_or(self.end, |lexeme| lexeme.offset)
    }

    fn peek_punct(&self, punct: &str) -> bool {
        matches!(self.peek(), Some(Token::Punct(p)) if *p == punct)
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(Token::Name(name)) if name == keyword)
    }

    fn peek_keyword_at(&self, ahead: usize, keyword: &str) -> bool {
        matches!(
            self.lexemes.get(self.pos + ahead).map(|lexeme| &lexeme.token),
            Some(Token::Name(name)) if name == keyword
        )
    }

    fn eat_punct(&mut self, punct: &str) -> bool {
        let found = self.peek_punct(punct);
        if found {
            self.pos += 1;
        }
        found
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        let found = self.peek_keyword(keyword);
        if found {
            self.pos += 1;
        }
        found
    }

    fn expect_punct(&mut self, punct: &str) -> EvalResult<()> {
        if self.eat_punct(punct) {
            Ok(())
        } else {
            Err(EvalError::syntax(self.offset(), format!("expected '{punct}'")))
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> EvalResult<()> {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            Err(EvalError::syntax(self.offset(), format!("expected '{keyword}'")))
        }
    }

    fn unexpected(&self) -> EvalError {
        match self.peek() {
            Some(token) => EvalError::syntax(self.offset(), format!("unexpected {}", describe(token))),
            None => EvalError::syntax(self.end, "unexpected end of expression"),
        }
    }

    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> EvalResult<T>) -> EvalResult<T> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(EvalError::TooDeep { limit: MAX_DEPTH });
        }
        let result = f(self);
        self.depth -= 1;
        result
    }

    // =========================================================================
    // Grammar
    // =========================================================================

    fn expression_list(&mut self) -> EvalResult<Expr> {
        let first = self.expr()?;
        if !self.peek_punct(",") {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat_punct(",") {
            if self.pos >= self.lexemes.len() {
                break;
            }
            items.push(self.expr()?);
        }
        Ok(Expr::Tuple(items))
    }

    fn expr(&mut self) -> EvalResult<Expr> {
        self.nested(Self::or_expr)
    }

    fn or_expr(&mut self) -> EvalResult<Expr> {
        let mut left = self.and_expr()?;
        while self.eat_keyword("or") {
            let right = self.and_expr()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> EvalResult<Expr> {
        let mut left = self.not_expr()?;
        while self.eat_keyword("and") {
            let right = self.not_expr()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn not_expr(&mut self) -> EvalResult<Expr> {
        if self.eat_keyword("not") {
            let inner = self.nested(Self::not_expr)?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> EvalResult<Expr> {
        let left = self.sum()?;
        let mut chain = Vec::new();
        while let Some(op) = self.compare_op() {
            chain.push((op, self.sum()?));
        }
        if chain.is_empty() {
            Ok(left)
        } else {
            Ok(Expr::Compare(Box::new(left), chain))
        }
    }

    fn compare_op(&mut self) -> Option<CompareOp> {
        let (op, width) = match self.peek()? {
            Token::Punct("==") => (CompareOp::Eq, 1),
            Token::Punct("!=") => (CompareOp::Ne, 1),
            Token::Punct("<") => (CompareOp::Lt, 1),
            Token::Punct("<=") => (CompareOp::Le, 1),
            Token::Punct(">") => (CompareOp::Gt, 1),
            Token::Punct(">=") => (CompareOp::Ge, 1),
            Token::Name(name) if name == "in" => (CompareOp::In, 1),
            Token::Name(name) if name == "not" && self.peek_keyword_at(1, "in") => {
                (CompareOp::NotIn, 2)
            }
            _ => return None,
        };
        self.pos += width;
        Some(op)
    }

    fn sum(&mut self) -> EvalResult<Expr> {
        let mut left = self.term()?;
        loop {
            let op = if self.eat_punct("+") {
                BinaryOp::Add
            } else if self.eat_punct("-") {
                BinaryOp::Sub
            } else {
                return Ok(left);
            };
            let right = self.term()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn term(&mut self) -> EvalResult<Expr> {
        let mut left = self.factor()?;
        loop {
            let op = if self.eat_punct("*") {
                BinaryOp::Mul
            } else if self.eat_punct("//") {
                BinaryOp::FloorDiv
            } else if self.eat_punct("/") {
                BinaryOp::Div
            } else if self.eat_punct("%") {
                BinaryOp::Mod
            } else {
                return Ok(left);
            };
            let right = self.factor()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn factor(&mut self) -> EvalResult<Expr> {
        let op = if self.eat_punct("-") {
            UnaryOp::Neg
        } else if self.eat_punct("+") {
            UnaryOp::Pos
        } else {
            return self.power();
        };
        let operand = self.nested(Self::factor)?;
        Ok(Expr::Unary(op, Box::new(operand)))
    }

    fn power(&mut self) -> EvalResult<Expr> {
        let base = self.postfix()?;
        if self.eat_punct("**") {
            let exponent = self.nested(Self::factor)?;
            return Ok(Expr::Binary(BinaryOp::Pow, Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn postfix(&mut self) -> EvalResult<Expr> {
        let mut expr = self.atom()?;
        loop {
            if self.peek_punct("(") {
                let Expr::Name(function) = expr else {
                    return Err(EvalError::syntax(
                        self.offset(),
                        "only builtin functions can be called",
                    ));
                };
                self.pos += 1;
                let args = self.call_args()?;
                expr = Expr::Call { function, args };
            } else if self.eat_punct("[") {
                let index = self.expr()?;
                self.expect_punct("]")?;
                expr = Expr::Index {
                    target: Box::new(expr),
                    index: Box::new(index),
                };
            } else {
                return Ok(expr);
            }
        }
    }

    fn call_args(&mut self) -> EvalResult<Vec<Expr>> {
        let mut args = Vec::new();
        if self.eat_punct(")") {
            return Ok(args);
        }
        loop {
            let arg = self.expr()?;
            if args.is_empty() && self.peek_keyword("for") {
                args.push(self.comprehension(CollectionKind::List, arg, None)?);
                self.expect_punct(")")?;
                return Ok(args);
            }
            args.push(arg);
            if !self.eat_punct(",") || self.peek_punct(")") {
                break;
            }
        }
        self.expect_punct(")")?;
        Ok(args)
    }

    fn atom(&mut self) -> EvalResult<Expr> {
        let offset = self.offset();
        let Some(token) = self.peek().cloned() else {
            return Err(self.unexpected());
        };
        self.pos += 1;

        match token {
            Token::Int(i) => Ok(Expr::Literal(Value::Int(i))),
            Token::Float(x) => Ok(Expr::Literal(Value::Float(x))),
            Token::Str(mut s) => {
                while let Some(Token::Str(next)) = self.peek() {
                    s.push_str(next);
                    self.pos += 1;
                }
                Ok(Expr::Literal(Value::Str(s)))
            }
            Token::Name(name) => match name.as_str() {
                "None" => Ok(Expr::Literal(Value::Null)),
                "True" => Ok(Expr::Literal(Value::Bool(true))),
                "False" => Ok(Expr::Literal(Value::Bool(false))),
                reserved if RESERVED.contains(&reserved) => {
                    Err(EvalError::syntax(offset, format!("unexpected keyword '{reserved}'")))
                }
                _ => Ok(Expr::Name(name)),
            },
            Token::Punct("(") => self.nested(Self::paren),
            Token::Punct("[") => self.nested(Self::bracket),
            Token::Punct("{") => self.nested(Self::brace),
            other => Err(EvalError::syntax(offset, format!("unexpected {}", describe(&other)))),
        }
    }

    fn paren(&mut self) -> EvalResult<Expr> {
        if self.eat_punct(")") {
            return Ok(Expr::Tuple(Vec::new()));
        }
        let first = self.expr()?;
        if self.peek_keyword("for") {
            let comprehension = self.comprehension(CollectionKind::List, first, None)?;
            self.expect_punct(")")?;
            return Ok(comprehension);
        }
        if !self.peek_punct(",") {
            self.expect_punct(")")?;
            return Ok(first);
        }
        let items = self.items(first, ")")?;
        Ok(Expr::Tuple(items))
    }

    fn bracket(&mut self) -> EvalResult<Expr> {
        if self.eat_punct("]") {
            return Ok(Expr::List(Vec::new()));
        }
        let first = self.expr()?;
        if self.peek_keyword("for") {
            let comprehension = self.comprehension(CollectionKind::List, first, None)?;
            self.expect_punct("]")?;
            return Ok(comprehension);
        }
        Ok(Expr::List(self.items(first, "]")?))
    }

    fn brace(&mut self) -> EvalResult<Expr> {
        if self.eat_punct("}") {
            return Ok(Expr::Dict(Vec::new()));
        }
        let first = self.expr()?;

        if self.eat_punct(":") {
            let value = self.expr()?;
            if self.peek_keyword("for") {
                let comprehension = self.comprehension(CollectionKind::Dict, first, Some(value))?;
                self.expect_punct("}")?;
                return Ok(comprehension);
            }
            let mut pairs = vec![(first, value)];
            while self.eat_punct(",") {
                if self.peek_punct("}") {
                    break;
                }
                let key = self.expr()?;
                self.expect_punct(":")?;
                pairs.push((key, self.expr()?));
            }
            self.expect_punct("}")?;
            return Ok(Expr::Dict(pairs));
        }

        if self.peek_keyword("for") {
            let comprehension = self.comprehension(CollectionKind::Set, first, None)?;
            self.expect_punct("}")?;
            return Ok(comprehension);
        }
        Ok(Expr::Set(self.items(first, "}")?))
    }

    /// Remaining comma-separated items after `first`, through `close`.
    fn items(&mut self, first: Expr, close: &str) -> EvalResult<Vec<Expr>> {
        let mut items = vec![first];
        while self.eat_punct(",") {
            if self.peek_punct(close) {
                break;
            }
            items.push(self.expr()?);
        }
        self.expect_punct(close)?;
        Ok(items)
    }

    fn comprehension(
        &mut self,
        kind: CollectionKind,
        element: Expr,
        value: Option<Expr>,
    ) -> EvalResult<Expr> {
        self.expect_keyword("for")?;
        let var = match self.peek() {
            Some(Token::Name(name)) if !RESERVED.contains(&name.as_str()) => name.clone(),
            _ => return Err(EvalError::syntax(self.offset(), "expected a loop variable")),
        };
        self.pos += 1;
        self.expect_keyword("in")?;
        let iter = self.nested(Self::or_expr)?;
        let filter = if self.eat_keyword("if") {
            Some(self.nested(Self::or_expr)?)
        } else {
            None
        };

        Ok(Expr::Comprehension(Box::new(Comprehension {
            kind,
            element,
            value,
            var,
            iter,
            filter,
        })))
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Int(i) => format!("number {i}"),
        Token::Float(x) => format!("number {x}"),
        Token::Str(_) => "string".to_owned(),
        Token::Name(name) => format!("name '{name}'"),
        Token::Punct(p) => format!("'{p}'"),
    }
}
