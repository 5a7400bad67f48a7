//! Tokenizer for the expression language.

use crate::error::{EvalError, EvalResult};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Int(i64),
    Float(f64),
    Str(String),
    Name(String),
    Punct(&'static str),
}

/// A token and the character offset it starts at.
#[derive(Debug, Clone, PartialEq)]
pub struct Lexeme {
    pub token: Token,
    pub offset: usize,
}

const TWO_CHAR: [&str; 6] = ["**", "//", "==", "!=", "<=", ">="];
const ONE_CHAR: [&str; 15] = [
    "+", "-", "*", "/", "%", "<", ">", "(", ")", "[", "]", "{", "}", ",", ":",
];

pub fn tokenize(source: &str) -> EvalResult<Vec<Lexeme>> {
    let chars: Vec<char> = source.chars().collect();
    let mut lexemes = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let ch = chars[pos];
        let start = pos;

        if ch.is_whitespace() {
            pos += 1;
            continue;
        }

        let token = if ch.is_ascii_digit()
            || (ch == '.' && chars.get(pos + 1).is_some_and(char::is_ascii_digit))
        {
            let (token, end) = number(&chars, pos)?;
            pos = end;
            token
        } else if ch == '\'' || ch == '"' {
            let (text, end) = string(&chars, pos)?;
            pos = end;
            Token::Str(text)
        } else if ch.is_alphabetic() || ch == '_' {
            while pos < chars.len() && (chars[pos].is_alphanumeric() || chars[pos] == '_') {
                pos += 1;
            }
            Token::Name(chars[start..pos].iter().collect())
        } else {
            let pair: String = chars[pos..(pos + 2).min(chars.len())].iter().collect();
            if let Some(op) = TWO_CHAR.iter().find(|op| **op == pair) {
                pos += 2;
                Token::Punct(*op)
            } else if let Some(op) = ONE_CHAR.iter().find(|op| op.starts_with(ch)) {
                pos += 1;
                Token::Punct(*op)
            } else {
                return Err(EvalError::syntax(start, format!("unexpected character '{ch}'")));
            }
        };

        lexemes.push(Lexeme {
            token,
            offset: start,
        });
    }

    Ok(lexemes)
}

fn number(chars: &[char], start: usize) -> EvalResult<(Token, usize)> {
    let mut pos = start;
    let mut is_float = false;
    let digits = |pos: &mut usize| {
        while *pos < chars.len() && (chars[*pos].is_ascii_digit() || chars[*pos] == '_') {
            *pos += 1;
        }
    };

    digits(&mut pos);
    if pos < chars.len() && chars[pos] == '.' {
        is_float = true;
        pos += 1;
        digits(&mut pos);
    }
    if pos < chars.len() && matches!(chars[pos], 'e' | 'E') {
        let mut exp = pos + 1;
        if exp < chars.len() && matches!(chars[exp], '+' | '-') {
            exp += 1;
        }
        if exp < chars.len() && chars[exp].is_ascii_digit() {
            is_float = true;
            pos = exp;
            digits(&mut pos);
        }
    }

    let text: String = chars[start..pos].iter().filter(|c| **c != '_').collect();
    let token = if is_float {
        text.parse::<f64>()
            .map(Token::Float)
            .map_err(|_| EvalError::syntax(start, format!("invalid number '{text}'")))?
    } else {
        text.parse::<i64>().map(Token::Int).map_err(|_| EvalError::Overflow)?
    };
    Ok((token, pos))
}

fn string(chars: &[char], start: usize) -> EvalResult<(String, usize)> {
    let quote = chars[start];
    let mut pos = start + 1;
    let mut text = String::new();

    while pos < chars.len() {
        match chars[pos] {
            '\\' if pos + 1 < chars.len() => {
                let escaped = chars[pos + 1];
                match escaped {
                    'n' => text.push('\n'),
                    't' => text.push('\t'),
                    'r' => text.push('\r'),
                    '0' => text.push('\0'),
                    '\\' | '\'' | '"' => text.push(escaped),
                    other => {
                        text.push('\\');
                        text.push(other);
                    }
                }
                pos += 2;
            }
            c if c == quote => return Ok((text, pos + 1)),
            c => {
                text.push(c);
                pos += 1;
            }
        }
    }

    Err(EvalError::syntax(start, "unterminated string literal"))
}
