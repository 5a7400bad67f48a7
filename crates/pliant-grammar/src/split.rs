//! Bracket- and quote-aware scanning of token text.
//!
//! Separators only count at the top level: outside `()`, `[]`, `{}` and
//! outside quoted runs. A quote character opens a quoted run only where a
//! value can start (beginning of text, after a separator, an opening bracket,
//! `=` or `:`), so apostrophes inside bare words stay literal.

use std::str::CharIndices;

/// Yields the byte offsets of every top-level occurrence of `target`.
struct TopLevel<'a> {
    chars: CharIndices<'a>,
    target: char,
    depth: usize,
    quote: Option<char>,
    escape_next: bool,
    prev: Option<char>,
    balanced: bool,
}

impl<'a> TopLevel<'a> {
    fn new(input: &'a str, target: char) -> Self {
        Self {
            chars: input.char_indices(),
            target,
            depth: 0,
            quote: None,
            escape_next: false,
            prev: None,
            balanced: true,
        }
    }

    fn quote_may_open(&self) -> bool {
        matches!(self.prev, None | Some(',' | '(' | '[' | '{' | '=' | ':'))
            || self.prev == Some(self.target)
    }
}

impl Iterator for TopLevel<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        while let Some((index, ch)) = self.chars.next() {
            if self.escape_next {
                self.escape_next = false;
                continue;
            }

            if let Some(quote) = self.quote {
                match ch {
                    '\\' => self.escape_next = true,
                    c if c == quote => {
                        self.quote = None;
                        self.prev = Some(c);
                    }
                    _ => {}
                }
                continue;
            }

            let hit = ch == self.target && self.depth == 0;
            match ch {
                '\'' | '"' if self.quote_may_open() => self.quote = Some(ch),
                '(' | '[' | '{' => self.depth += 1,
                ')' | ']' | '}' => match self.depth.checked_sub(1) {
                    Some(depth) => self.depth = depth,
                    None => self.balanced = false,
                },
                _ => {}
            }
            if !ch.is_whitespace() {
                self.prev = Some(ch);
            }
            if hit {
                return Some(index);
            }
        }
        None
    }
}

/// Byte offset of the first top-level `target`.
pub fn find_top_level(input: &str, target: char) -> Option<usize> {
    TopLevel::new(input, target).next()
}

/// Splits on top-level `separator`; parts are trimmed and empty parts dropped.
pub fn split_top_level(input: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for index in TopLevel::new(input, separator) {
        parts.push(input[start..index].trim());
        start = index + separator.len_utf8();
    }
    parts.push(input[start..].trim());
    parts.retain(|part| !part.is_empty());
    parts
}

/// Whether every bracket closes and no quoted run is left open.
pub fn is_balanced(input: &str) -> bool {
    let mut scanner = TopLevel::new(input, '\0');
    scanner.by_ref().for_each(drop);
    scanner.balanced && scanner.depth == 0 && scanner.quote.is_none()
}

/// Whether `token` is wrapped in a matching pair of quotes.
pub fn is_quoted(token: &str) -> bool {
    let mut chars = token.chars();
    match (chars.next(), chars.next_back()) {
        (Some(first @ ('\'' | '"')), Some(last)) => first == last,
        _ => false,
    }
}
