//! Lexer error types.

use thiserror::Error;

/// Errors produced while tokenizing Poly source.
///
/// Every variant carries the 1-based line and column of the offending byte;
/// the rendered message matches the parser's diagnostic format.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    /// A string literal ran to end of input without its closing quote.
    #[error("unterminated string literal at line {line}, column {column}")]
    UnterminatedString {
        /// 1-based line of the opening quote
        line: u32,
        /// 1-based column of the opening quote
        column: u32,
    },

    /// A byte that cannot begin any token.
    #[error("unexpected character '{ch}' at line {line}, column {column}")]
    UnexpectedCharacter {
        /// The offending character
        ch: char,
        /// 1-based line
        line: u32,
        /// 1-based column
        column: u32,
    },

    /// An escape sequence the string scanner does not recognise.
    #[error("invalid escape sequence '\\{ch}' at line {line}, column {column}")]
    InvalidEscape {
        /// The character after the backslash
        ch: char,
        /// 1-based line
        line: u32,
        /// 1-based column
        column: u32,
    },
}

/// Result alias for lexer operations.
pub type LexResult<T> = Result<T, LexError>;
