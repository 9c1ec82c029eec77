//! Contextual validation rules that are cheap to check mid-parse.
//!
//! These checks run inside the handlers that own the relevant tokens:
//! `break`/`continue` must sit inside a loop body, and a language keyword can
//! be neither assigned to nor read as a bare variable. The recursion cap is
//! enforced by the parse context's guard, not here.

use crate::engine::context::ParseContext;
use crate::engine::error::{ParseError, ParseResult};
use poly_position::Position;

/// Reject `break`/`continue` at a point where no loop body is open.
pub(crate) fn ensure_loop_context(
    ctx: &ParseContext,
    statement: &'static str,
    at: Position,
) -> ParseResult<()> {
    if ctx.in_loop() {
        Ok(())
    } else {
        Err(ParseError::OutsideLoop { statement, line: at.line, column: at.column })
    }
}

/// The error for `lua = …` and friends.
pub(crate) fn reserved_keyword_assignment(name: &str, at: Position) -> ParseError {
    ParseError::ReservedKeyword { name: name.to_string(), line: at.line, column: at.column }
}

/// The error for a bare language keyword in a position that needs a
/// qualified path, e.g. a lone `lua` statement.
pub(crate) fn not_a_qualified_variable(name: &str, at: Position) -> ParseError {
    ParseError::syntax(format!("'{name}' is not a qualified variable"), at)
}

/// The error for a qualified path whose head is not a known alias.
pub(crate) fn unsupported_language(name: &str, at: Position) -> ParseError {
    ParseError::UnsupportedLanguage { name: name.to_string(), line: at.line, column: at.column }
}
