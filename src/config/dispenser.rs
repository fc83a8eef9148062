//! Token cursor for directive setup functions.
//!
//! # Responsibilities
//! - Walk the tokens of one directive (all of its occurrences)
//! - Distinguish arguments (same line) from new statements (next line)
//! - Track block nesting for `{ ... }` bodies
//! - Produce parse errors labelled with file and line
//!
//! # Design Decisions
//! - The cursor starts *before* the first token; `next()` lands on it
//! - A block must open on the same line as the statement it belongs to
//! - Nested blocks are entered explicitly with `incr_nest()`

use crate::config::lexer::{tokenize, Token};

/// A configuration parse error with its source position.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{file}:{line} - Parse error: {message}")]
pub struct ParseError {
    pub file: String,
    pub line: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(file: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line,
            message: message.into(),
        }
    }
}

/// Cursor over the tokens of a directive.
#[derive(Debug, Clone)]
pub struct Dispenser {
    file: String,
    tokens: Vec<Token>,
    cursor: isize,
    nesting: usize,
}

impl Dispenser {
    /// Create a dispenser positioned before the first token.
    pub fn new(file: impl Into<String>, tokens: Vec<Token>) -> Self {
        Self {
            file: file.into(),
            tokens,
            cursor: -1,
            nesting: 0,
        }
    }

    /// Tokenize `input` and wrap the tokens in a dispenser.
    pub fn from_source(file: &str, input: &str) -> Result<Self, ParseError> {
        Ok(Self::new(file, tokenize(file, input)?))
    }

    /// Advance to the next token regardless of line. Returns false at the end.
    pub fn next(&mut self) -> bool {
        if self.cursor + 1 < self.tokens.len() as isize {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    /// Advance only if the next token is on the same line as the current one.
    pub fn next_arg(&mut self) -> bool {
        if self.cursor < 0 {
            self.cursor += 1;
            return !self.tokens.is_empty();
        }
        let cur = self.cursor as usize;
        match (self.tokens.get(cur), self.tokens.get(cur + 1)) {
            (Some(here), Some(ahead)) if here.line == ahead.line => {
                self.cursor += 1;
                true
            }
            _ => false,
        }
    }

    /// Advance to the next statement inside a block.
    ///
    /// When not yet inside a block, this opens one if the next token on the
    /// current line is `{`. Returns false when the block closes (the cursor
    /// is then on the closing `}`), when there is no block, or when the
    /// block is empty.
    pub fn next_block(&mut self) -> bool {
        if self.nesting > 0 {
            if !self.next() {
                return false;
            }
            if self.val() == "}" {
                self.nesting -= 1;
                return false;
            }
            return true;
        }
        if !self.next_arg() {
            return false;
        }
        if self.val() != "{" {
            self.cursor -= 1;
            return false;
        }
        if !self.next() {
            return false;
        }
        if self.val() == "}" {
            return false;
        }
        self.nesting += 1;
        true
    }

    /// Whether the next token is `{` on the current line.
    pub fn block_follows(&self) -> bool {
        if self.cursor < 0 {
            return false;
        }
        let cur = self.cursor as usize;
        match (self.tokens.get(cur), self.tokens.get(cur + 1)) {
            (Some(here), Some(ahead)) => here.line == ahead.line && ahead.text == "{",
            _ => false,
        }
    }

    /// Text of the next token if it is on the current line, without advancing.
    pub fn peek_arg(&self) -> Option<&str> {
        if self.cursor < 0 {
            return None;
        }
        let cur = self.cursor as usize;
        match (self.tokens.get(cur), self.tokens.get(cur + 1)) {
            (Some(here), Some(ahead)) if here.line == ahead.line => Some(ahead.text.as_str()),
            _ => None,
        }
    }

    /// Record that the caller consumed a `{` and entered a nested block.
    pub fn incr_nest(&mut self) {
        self.nesting += 1;
    }

    /// Current nesting depth.
    pub fn nesting(&self) -> usize {
        self.nesting
    }

    /// Text of the current token, or `""` outside the token range.
    pub fn val(&self) -> &str {
        self.current().map(|t| t.text.as_str()).unwrap_or("")
    }

    /// Line of the current token (the last token's line past the end).
    pub fn line(&self) -> usize {
        self.current()
            .or_else(|| self.tokens.last())
            .map(|t| t.line)
            .unwrap_or(0)
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    /// Argument-count error for the current position.
    pub fn arg_err(&self) -> ParseError {
        if self.val() == "{" {
            return self.err("Unexpected token '{', expecting argument");
        }
        self.err(format!(
            "Wrong argument count or unexpected line ending after '{}'",
            self.val()
        ))
    }

    /// A parse error at the current position.
    pub fn err(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(self.file.clone(), self.line(), message)
    }

    fn current(&self) -> Option<&Token> {
        if self.cursor < 0 {
            return None;
        }
        self.tokens.get(self.cursor as usize)
    }
}
