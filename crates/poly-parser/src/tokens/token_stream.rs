//! Random-access cursor over the lexed token vector.
//!
//! The stream owns the tokens behind an `Arc`, so [`TokenStream::clone`]
//! yields an independent cursor over shared storage. Handlers use a clone for
//! bounded lookahead and `position`/`set_position` for rollback before they
//! have emitted any node; committed constructions never roll back.

use poly_token::{Token, TokenKind};
use std::sync::Arc;

/// Cursor over an immutable token vector.
///
/// Peeking past the end yields the trailing EOF token rather than failing, so
/// handlers can look arbitrarily far ahead without bounds checks.
#[derive(Debug, Clone)]
pub struct TokenStream {
    tokens: Arc<[Token]>,
    pos: usize,
}

impl TokenStream {
    /// Create a stream. A trailing EOF token is synthesized if the lexer did
    /// not provide one.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            let span = tokens
                .last()
                .map(|t| poly_position::Span::point(t.span.end))
                .unwrap_or_default();
            tokens.push(Token::eof(span));
        }
        TokenStream { tokens: tokens.into(), pos: 0 }
    }

    /// The token under the cursor; the EOF token once the input is exhausted.
    pub fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    /// Look `n` tokens ahead of the cursor (`n >= 1`); clamped to EOF.
    pub fn peek(&self, n: usize) -> &Token {
        let idx = self.pos.saturating_add(n);
        &self.tokens[idx.min(self.tokens.len() - 1)]
    }

    /// Advance the cursor and return the token that was current.
    ///
    /// Consuming at EOF returns the EOF token and parks the cursor one past
    /// the end, so a finished parse leaves `position() == len()`.
    pub fn consume(&mut self) -> Token {
        let token = self.current().clone();
        self.pos = (self.pos + 1).min(self.tokens.len());
        token
    }

    /// Whether any non-EOF token remains.
    pub fn has_more(&self) -> bool {
        self.current().kind != TokenKind::Eof
    }

    /// Current cursor index.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Roll the cursor back (or forward) to an index captured earlier.
    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos.min(self.tokens.len());
    }

    /// Total token count, including the EOF token.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Always false: the stream holds at least the EOF token.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The span of the most recently consumed token, if any.
    pub fn previous_span(&self) -> Option<poly_position::Span> {
        if self.pos == 0 {
            None
        } else {
            Some(self.tokens[(self.pos - 1).min(self.tokens.len() - 1)].span)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use poly_lexer::tokenize;
    use pretty_assertions::assert_eq;

    fn stream(source: &str) -> TokenStream {
        TokenStream::new(tokenize(source).unwrap_or_default())
    }

    #[test]
    fn current_and_consume_advance_in_order() {
        let mut s = stream("a = 1");
        assert_eq!(s.current().kind, TokenKind::Identifier);
        let first = s.consume();
        assert_eq!(&*first.text, "a");
        assert_eq!(s.current().kind, TokenKind::Assign);
    }

    #[test]
    fn peek_does_not_advance() {
        let s = stream("a = 1");
        assert_eq!(s.peek(1).kind, TokenKind::Assign);
        assert_eq!(s.peek(2).kind, TokenKind::Number);
        assert_eq!(s.current().kind, TokenKind::Identifier);
    }

    #[test]
    fn peek_past_end_yields_eof() {
        let s = stream("a");
        assert_eq!(s.peek(100).kind, TokenKind::Eof);
    }

    #[test]
    fn consume_at_eof_parks_past_end() {
        let mut s = stream("");
        assert_eq!(s.len(), 1);
        let eof = s.consume();
        assert_eq!(eof.kind, TokenKind::Eof);
        assert_eq!(s.position(), 1);
        // further consumes stay parked
        let again = s.consume();
        assert_eq!(again.kind, TokenKind::Eof);
        assert_eq!(s.position(), 1);
    }

    #[test]
    fn clone_is_an_independent_cursor() {
        let mut s = stream("a = 1");
        let mut probe = s.clone();
        probe.consume();
        probe.consume();
        assert_eq!(probe.current().kind, TokenKind::Number);
        assert_eq!(s.current().kind, TokenKind::Identifier);
        s.consume();
        assert_eq!(s.current().kind, TokenKind::Assign);
    }

    #[test]
    fn save_and_restore_position() {
        let mut s = stream("a = 1");
        let save = s.position();
        s.consume();
        s.consume();
        s.set_position(save);
        assert_eq!(s.current().kind, TokenKind::Identifier);
    }

    #[test]
    fn synthesizes_missing_eof() {
        let s = TokenStream::new(vec![]);
        assert_eq!(s.len(), 1);
        assert_eq!(s.current().kind, TokenKind::Eof);
    }
}
