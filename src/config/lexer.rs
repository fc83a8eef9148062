//! Directive file tokenizer.
//!
//! # Responsibilities
//! - Split directive text into whitespace-separated tokens
//! - Record the 1-based line each token starts on
//! - Handle `"quoted tokens"` and `#` comments
//!
//! # Design Decisions
//! - Braces are ordinary tokens; the dispenser gives them meaning
//! - A `#` only starts a comment at the beginning of a token
//! - Line numbers drive argument grouping (same line = same statement)

use crate::config::dispenser::ParseError;

/// A single token with the line it started on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub line: usize,
}

impl Token {
    pub fn new(text: impl Into<String>, line: usize) -> Self {
        Self {
            text: text.into(),
            line,
        }
    }
}

/// Tokenize directive text.
///
/// `file` is only used to label errors.
pub fn tokenize(file: &str, input: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    let mut line = 1;

    while let Some(&c) = chars.peek() {
        if c == '\n' {
            line += 1;
            chars.next();
            continue;
        }
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == '#' {
            while let Some(&c) = chars.peek() {
                if c == '\n' {
                    break;
                }
                chars.next();
            }
            continue;
        }

        let start_line = line;
        let mut text = String::new();

        if c == '"' {
            chars.next();
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '\\' if chars.peek() == Some(&'"') => {
                        text.push('"');
                        chars.next();
                    }
                    '"' => {
                        closed = true;
                        break;
                    }
                    '\n' => {
                        line += 1;
                        text.push(c);
                    }
                    _ => text.push(c),
                }
            }
            if !closed {
                return Err(ParseError::new(file, start_line, "unterminated quoted string"));
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                text.push(c);
                chars.next();
            }
        }

        tokens.push(Token::new(text, start_line));
    }

    Ok(tokens)
}
