//! Lexical analysis of command text: quote and escape resolution.
//!
//! The tokenizer turns the residual command text (redirections already
//! spliced out by [`crate::redirect`]) into the argument vector. It is a
//! single-pass finite state machine over a tagged quoting context plus an
//! escape flag, so illegal flag combinations cannot be represented.

use thiserror::Error;

/// Errors produced when a line ends inside an unfinished construct.
///
/// Any of these aborts the whole line: the dispatcher reports the message and
/// executes nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QuoteError {
    /// A `'` was opened and never closed.
    #[error("unterminated single quote")]
    UnterminatedSingle,
    /// A `"` was opened and never closed.
    #[error("unterminated double quote")]
    UnterminatedDouble,
    /// The line ended right after a backslash, leaving nothing to escape.
    #[error("dangling escape at end of line")]
    DanglingEscape,
}

/// Quoting context the state machine is currently inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuoteContext {
    /// Outside any quotes.
    Bare,
    /// Inside single quotes: everything is literal, including backslashes.
    Single,
    /// Inside double quotes: backslash escapes only `"`, `\`, `$`, backtick.
    Double,
}

struct TokenizerFsm {
    context: QuoteContext,
    escaped: bool,
    buffer: String,
    args: Vec<String>,
}

impl TokenizerFsm {
    fn new() -> Self {
        TokenizerFsm {
            context: QuoteContext::Bare,
            escaped: false,
            buffer: String::new(),
            args: Vec::new(),
        }
    }

    fn run(mut self, input: &str) -> Result<Vec<String>, QuoteError> {
        for ch in input.chars() {
            if self.escaped {
                self.resolve_escape(ch);
                continue;
            }
            match self.context {
                QuoteContext::Bare => self.step_bare(ch),
                QuoteContext::Single => self.step_single(ch),
                QuoteContext::Double => self.step_double(ch),
            }
        }

        match self.context {
            QuoteContext::Single => return Err(QuoteError::UnterminatedSingle),
            QuoteContext::Double => return Err(QuoteError::UnterminatedDouble),
            QuoteContext::Bare => {}
        }
        if self.escaped {
            return Err(QuoteError::DanglingEscape);
        }

        self.flush();
        Ok(self.args)
    }

    /// Consume the single character following a backslash.
    ///
    /// In `Bare` context the backslash escapes anything: the backslash is
    /// dropped and the character kept literally (a later whitespace split
    /// never sees it). In `Double` context only `"`, `\`, `$` and backtick
    /// collapse; any other character keeps the backslash in front of it.
    /// The flag is never set in `Single` context.
    fn resolve_escape(&mut self, ch: char) {
        match self.context {
            QuoteContext::Bare => self.buffer.push(ch),
            QuoteContext::Double => {
                if matches!(ch, '"' | '\\' | '$' | '`') {
                    self.buffer.push(ch);
                } else {
                    self.buffer.push('\\');
                    self.buffer.push(ch);
                }
            }
            QuoteContext::Single => {
                self.buffer.push('\\');
                self.buffer.push(ch);
            }
        }
        self.escaped = false;
    }

    fn step_bare(&mut self, ch: char) {
        match ch {
            '\\' => self.escaped = true,
            '\'' => self.context = QuoteContext::Single,
            '"' => self.context = QuoteContext::Double,
            c if c.is_whitespace() => self.flush(),
            c => self.buffer.push(c),
        }
    }

    fn step_single(&mut self, ch: char) {
        match ch {
            '\'' => self.context = QuoteContext::Bare,
            c => self.buffer.push(c),
        }
    }

    fn step_double(&mut self, ch: char) {
        match ch {
            '\\' => self.escaped = true,
            '"' => self.context = QuoteContext::Bare,
            c => self.buffer.push(c),
        }
    }

    /// Complete the current argument, if any.
    ///
    /// Runs of unquoted whitespace call this repeatedly; only the first call
    /// finds a non-empty buffer, so whitespace runs never produce empty
    /// arguments.
    fn flush(&mut self) {
        if !self.buffer.is_empty() {
            self.args.push(std::mem::take(&mut self.buffer));
        }
    }
}

/// Split command text into arguments, resolving quotes and escapes.
///
/// Argument 0 is the command name. Quote characters themselves are never part
/// of an argument; adjacent quoted and unquoted segments concatenate into one
/// argument (`'a'b"c"` is `abc`).
pub fn tokenize(command_text: &str) -> Result<Vec<String>, QuoteError> {
    TokenizerFsm::new().run(command_text)
}
