//! Parse error types.
//!
//! The parser never recovers: the first error aborts the parse and bubbles up
//! unchanged. Every variant carries the 1-based line and column where the
//! problem was detected, and `Display` renders the single diagnostic format
//! the driver shows to users: `<message> at line <L>, column <C>`.

use poly_lexer::LexError;
use poly_position::Position;
use thiserror::Error;

/// Result alias for parser operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Errors produced while parsing Poly source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Structural error: missing delimiter, stray operator, malformed
    /// construct.
    #[error("{message} at line {line}, column {column}")]
    Syntax {
        /// What went wrong
        message: String,
        /// 1-based line
        line: u32,
        /// 1-based column
        column: u32,
    },

    /// Assignment to a language keyword, e.g. `lua = 1`.
    #[error("cannot assign to reserved keyword '{name}' at line {line}, column {column}")]
    ReservedKeyword {
        /// The language keyword
        name: String,
        /// 1-based line
        line: u32,
        /// 1-based column
        column: u32,
    },

    /// A qualified path whose head is not a known language alias.
    #[error("unsupported language '{name}' at line {line}, column {column}")]
    UnsupportedLanguage {
        /// The unknown alias
        name: String,
        /// 1-based line
        line: u32,
        /// 1-based column
        column: u32,
    },

    /// `break` or `continue` outside a loop body.
    #[error("{statement} statement can only be used inside a loop at line {line}, column {column}")]
    OutsideLoop {
        /// `"break"` or `"continue"`
        statement: &'static str,
        /// 1-based line
        line: u32,
        /// 1-based column
        column: u32,
    },

    /// The recursion guard tripped on pathological nesting.
    #[error("maximum recursion depth exceeded at line {line}, column {column}")]
    RecursionLimit {
        /// 1-based line
        line: u32,
        /// 1-based column
        column: u32,
    },

    /// The lexer produced a number token the literal parser cannot interpret.
    #[error("invalid number literal '{literal}' at line {line}, column {column}")]
    InvalidNumber {
        /// The malformed literal text
        literal: String,
        /// 1-based line
        line: u32,
        /// 1-based column
        column: u32,
    },

    /// Input ended in the middle of a construct.
    #[error("unexpected end of input at line {line}, column {column}")]
    UnexpectedEof {
        /// 1-based line of the last known position
        line: u32,
        /// 1-based column of the last known position
        column: u32,
    },
}

impl ParseError {
    /// Build a structural error at a position.
    pub fn syntax(message: impl Into<String>, at: Position) -> Self {
        ParseError::Syntax { message: message.into(), line: at.line, column: at.column }
    }

    /// Build an end-of-input error at a position.
    pub fn eof(at: Position) -> Self {
        ParseError::UnexpectedEof { line: at.line, column: at.column }
    }

    /// The line/column the error points at.
    pub fn position(&self) -> (u32, u32) {
        match self {
            ParseError::Syntax { line, column, .. }
            | ParseError::ReservedKeyword { line, column, .. }
            | ParseError::UnsupportedLanguage { line, column, .. }
            | ParseError::OutsideLoop { line, column, .. }
            | ParseError::RecursionLimit { line, column }
            | ParseError::InvalidNumber { line, column, .. }
            | ParseError::UnexpectedEof { line, column } => (*line, *column),
        }
    }
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        match err {
            LexError::UnterminatedString { line, column } => ParseError::Syntax {
                message: "unterminated string literal".to_string(),
                line,
                column,
            },
            LexError::UnexpectedCharacter { ch, line, column } => ParseError::Syntax {
                message: format!("unexpected character '{ch}'"),
                line,
                column,
            },
            LexError::InvalidEscape { ch, line, column } => ParseError::Syntax {
                message: format!("invalid escape sequence '\\{ch}'"),
                line,
                column,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_format() {
        let err = ParseError::syntax("expected ')' after expression", Position::new(3, 7, 42));
        assert_eq!(err.to_string(), "expected ')' after expression at line 3, column 7");
    }

    #[test]
    fn reserved_keyword_format() {
        let err = ParseError::ReservedKeyword { name: "lua".into(), line: 1, column: 1 };
        assert_eq!(
            err.to_string(),
            "cannot assign to reserved keyword 'lua' at line 1, column 1"
        );
    }

    #[test]
    fn outside_loop_format() {
        let err = ParseError::OutsideLoop { statement: "break", line: 2, column: 5 };
        assert_eq!(
            err.to_string(),
            "break statement can only be used inside a loop at line 2, column 5"
        );
    }

    #[test]
    fn lex_error_conversion_keeps_position() {
        let err: ParseError = LexError::UnterminatedString { line: 4, column: 9 }.into();
        assert_eq!(err.position(), (4, 9));
    }
}
