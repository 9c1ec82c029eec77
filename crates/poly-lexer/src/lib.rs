//! Hand-written lexer for the Poly language.
//!
//! Converts UTF-8 source text into a flat [`Token`] vector terminated by an
//! EOF token. The lexer is context-free: tokens like `<<` and `|` that mean
//! different things in different positions are emitted as a single kind and
//! disambiguated by the parser.
//!
//! Two conventions the parser relies on:
//!
//! - Comments (`#` to end of line) are reported as [`TokenKind::Newline`]
//!   tokens whose lexeme begins with `#`; the parser treats them as statement
//!   separators.
//! - Number tokens are lexed greedily and carry their raw text; numeric
//!   validation happens in the parser's literal sub-parser so a bad literal
//!   surfaces as a positioned parse error, not a lex error.

#![deny(unsafe_code)]
#![deny(unreachable_pub)]
#![warn(rust_2018_idioms)]
#![warn(missing_docs)]

mod error;

pub use error::{LexError, LexResult};

use memchr::memchr;
use phf::phf_map;
use poly_position::{LineStarts, Span};
use poly_token::{Token, TokenKind};

/// Keywords, literals, and language names, all case-sensitive.
static KEYWORDS: phf::Map<&'static str, TokenKind> = phf_map! {
    "if" => TokenKind::If,
    "else" => TokenKind::Else,
    "while" => TokenKind::While,
    "for" => TokenKind::For,
    "do" => TokenKind::Do,
    "in" => TokenKind::In,
    "end" => TokenKind::End,
    "match" => TokenKind::Match,
    "break" => TokenKind::Break,
    "continue" => TokenKind::Continue,
    "import" => TokenKind::Import,
    "true" => TokenKind::True,
    "false" => TokenKind::False,
    "nil" => TokenKind::Nil,
    "lua" => TokenKind::Language,
    "python" => TokenKind::Language,
    "py" => TokenKind::Language,
    "go" => TokenKind::Language,
    "node" => TokenKind::Language,
    "js" => TokenKind::Language,
};

/// Streaming lexer over a source string.
pub struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    lines: LineStarts,
    emitted_eof: bool,
}

impl<'a> Lexer<'a> {
    /// Create a lexer over `source`.
    pub fn new(source: &'a str) -> Self {
        Lexer {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            lines: LineStarts::new(source),
            emitted_eof: false,
        }
    }

    /// Produce the next token, or `None` after EOF has been emitted.
    pub fn next_token(&mut self) -> Option<LexResult<Token>> {
        if self.emitted_eof {
            return None;
        }
        Some(self.scan_token())
    }

    fn scan_token(&mut self) -> LexResult<Token> {
        self.skip_blank();

        let start = self.pos;
        let Some(&b) = self.bytes.get(self.pos) else {
            self.emitted_eof = true;
            return Ok(Token::eof(Span::point(self.position(start))));
        };

        match b {
            b'\n' => {
                self.pos += 1;
                Ok(self.token(TokenKind::Newline, start))
            }
            b'#' => {
                // Comment to end of line, surfaced as a newline separator
                let rest = &self.bytes[self.pos..];
                let len = memchr(b'\n', rest).unwrap_or(rest.len());
                self.pos += len;
                Ok(self.token(TokenKind::Newline, start))
            }
            b'"' | b'\'' => self.scan_string(b),
            b'0'..=b'9' => Ok(self.scan_number(start)),
            _ => {
                let ch = self.current_char();
                if ch == '_' || unicode_ident::is_xid_start(ch) {
                    Ok(self.scan_word(start))
                } else {
                    self.scan_operator(start)
                }
            }
        }
    }

    /// Skip spaces, tabs, and carriage returns; newlines are tokens.
    fn skip_blank(&mut self) {
        while let Some(&b) = self.bytes.get(self.pos) {
            match b {
                b' ' | b'\t' | b'\r' => self.pos += 1,
                _ => break,
            }
        }
    }

    fn current_char(&self) -> char {
        self.source[self.pos..].chars().next().unwrap_or('\0')
    }

    fn position(&self, byte: usize) -> poly_position::Position {
        self.lines.position_at(self.source, byte)
    }

    fn token(&self, kind: TokenKind, start: usize) -> Token {
        let span = Span::new(self.position(start), self.position(self.pos));
        Token::new(kind, &self.source[start..self.pos], span)
    }

    fn scan_word(&mut self, start: usize) -> Token {
        let mut chars = self.source[self.pos..].char_indices();
        let mut len = 0;
        while let Some((i, c)) = chars.next() {
            if c == '_' || unicode_ident::is_xid_continue(c) {
                len = i + c.len_utf8();
            } else {
                break;
            }
        }
        self.pos += len;
        let text = &self.source[start..self.pos];
        let kind = if text == "_" {
            TokenKind::Wildcard
        } else {
            KEYWORDS.get(text).copied().unwrap_or(TokenKind::Identifier)
        };
        self.token(kind, start)
    }

    /// Greedy number scan: `0x…`/`0b…` prefixes, decimals, fractions,
    /// scientific exponents. Trailing identifier characters are swallowed so
    /// `12abc` becomes one bad number token the parser can diagnose.
    fn scan_number(&mut self, start: usize) -> Token {
        let prefixed = matches!(
            self.bytes.get(self.pos..self.pos + 2),
            Some(b"0x" | b"0X" | b"0b" | b"0B")
        );
        if prefixed {
            self.pos += 2;
            while self
                .bytes
                .get(self.pos)
                .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'_')
            {
                self.pos += 1;
            }
            return self.token(TokenKind::Number, start);
        }

        while self.bytes.get(self.pos).is_some_and(u8::is_ascii_digit) {
            self.pos += 1;
        }
        // Fraction: only when a digit follows the dot, so `users[0].age`
        // keeps its Dot token
        if self.bytes.get(self.pos) == Some(&b'.')
            && self.bytes.get(self.pos + 1).is_some_and(u8::is_ascii_digit)
        {
            self.pos += 1;
            while self.bytes.get(self.pos).is_some_and(u8::is_ascii_digit) {
                self.pos += 1;
            }
        }
        // Exponent
        if matches!(self.bytes.get(self.pos), Some(b'e' | b'E')) {
            let mut ahead = self.pos + 1;
            if matches!(self.bytes.get(ahead), Some(b'+' | b'-')) {
                ahead += 1;
            }
            if self.bytes.get(ahead).is_some_and(u8::is_ascii_digit) {
                self.pos = ahead;
                while self.bytes.get(self.pos).is_some_and(u8::is_ascii_digit) {
                    self.pos += 1;
                }
            }
        }
        // Swallow a malformed alphabetic tail into the number token
        while self
            .bytes
            .get(self.pos)
            .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'_')
        {
            self.pos += 1;
        }
        self.token(TokenKind::Number, start)
    }

    fn scan_string(&mut self, quote: u8) -> LexResult<Token> {
        let start = self.pos;
        let open = self.position(start);
        self.pos += 1;
        while let Some(&b) = self.bytes.get(self.pos) {
            match b {
                b'\\' => {
                    let esc_pos = self.pos + 1;
                    match self.bytes.get(esc_pos) {
                        Some(b'n' | b't' | b'r' | b'0' | b'\\' | b'"' | b'\'') => {
                            self.pos += 2;
                        }
                        Some(_) => {
                            let at = self.position(esc_pos);
                            return Err(LexError::InvalidEscape {
                                ch: self.source[esc_pos..].chars().next().unwrap_or('\0'),
                                line: at.line,
                                column: at.column,
                            });
                        }
                        None => break,
                    }
                }
                b'\n' => break,
                _ if b == quote => {
                    self.pos += 1;
                    return Ok(self.token(TokenKind::String, start));
                }
                _ => self.pos += 1,
            }
        }
        Err(LexError::UnterminatedString { line: open.line, column: open.column })
    }

    fn scan_operator(&mut self, start: usize) -> LexResult<Token> {
        let two = self.bytes.get(start..start + 2);
        let (kind, len) = match self.bytes[start] {
            b'*' if matches!(two, Some(b"**")) => (TokenKind::StarStar, 2),
            b'+' if matches!(two, Some(b"++")) => (TokenKind::PlusPlus, 2),
            b'&' if matches!(two, Some(b"&&")) => (TokenKind::AndAnd, 2),
            b'|' if matches!(two, Some(b"||")) => (TokenKind::OrOr, 2),
            b'|' if matches!(two, Some(b"|>")) => (TokenKind::PipeForward, 2),
            b'=' if matches!(two, Some(b"==")) => (TokenKind::EqualEqual, 2),
            b'!' if matches!(two, Some(b"!=")) => (TokenKind::NotEqual, 2),
            b'<' if matches!(two, Some(b"<<")) => (TokenKind::DoubleLess, 2),
            b'<' if matches!(two, Some(b"<=")) => (TokenKind::LessEqual, 2),
            b'>' if matches!(two, Some(b">>")) => (TokenKind::DoubleGreater, 2),
            b'>' if matches!(two, Some(b">=")) => (TokenKind::GreaterEqual, 2),
            b':' if matches!(two, Some(b":=")) => (TokenKind::Walrus, 2),
            b'-' if matches!(two, Some(b"->")) => (TokenKind::Arrow, 2),
            b'+' => (TokenKind::Plus, 1),
            b'-' => (TokenKind::Minus, 1),
            b'*' => (TokenKind::Star, 1),
            b'/' => (TokenKind::Slash, 1),
            b'%' => (TokenKind::Percent, 1),
            b'&' => (TokenKind::Ampersand, 1),
            b'|' => (TokenKind::Pipe, 1),
            b'^' => (TokenKind::Caret, 1),
            b'~' => (TokenKind::Tilde, 1),
            b'<' => (TokenKind::Less, 1),
            b'>' => (TokenKind::Greater, 1),
            b'=' => (TokenKind::Assign, 1),
            b'?' => (TokenKind::Question, 1),
            b'.' => (TokenKind::Dot, 1),
            b',' => (TokenKind::Comma, 1),
            b':' => (TokenKind::Colon, 1),
            b';' => (TokenKind::Semicolon, 1),
            b'(' => (TokenKind::LeftParen, 1),
            b')' => (TokenKind::RightParen, 1),
            b'[' => (TokenKind::LeftBracket, 1),
            b']' => (TokenKind::RightBracket, 1),
            b'{' => (TokenKind::LeftBrace, 1),
            b'}' => (TokenKind::RightBrace, 1),
            _ => {
                let at = self.position(start);
                return Err(LexError::UnexpectedCharacter {
                    ch: self.current_char(),
                    line: at.line,
                    column: at.column,
                });
            }
        };
        self.pos = start + len;
        Ok(self.token(kind, start))
    }
}

/// Tokenize an entire source string, including the trailing EOF token.
pub fn tokenize(source: &str) -> LexResult<Vec<Token>> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token() {
        tokens.push(token?);
    }
    Ok(tokens)
}

/// Decode a string literal token's text: strip quotes, resolve escapes.
///
/// The lexer has already validated the escapes, so unknown sequences cannot
/// occur here; the quote characters are the first and last bytes.
pub fn decode_string_literal(raw: &str) -> String {
    let inner = if raw.len() >= 2 { &raw[1..raw.len() - 1] } else { raw };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some('0') => out.push('\0'),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .map(|tokens| tokens.iter().map(|t| t.kind).collect())
            .unwrap_or_default()
    }

    #[test]
    fn empty_input_is_just_eof() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn simple_assignment() {
        assert_eq!(
            kinds("x = 1 + 2 * 3"),
            vec![
                TokenKind::Identifier,
                TokenKind::Assign,
                TokenKind::Number,
                TokenKind::Plus,
                TokenKind::Number,
                TokenKind::Star,
                TokenKind::Number,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn language_keywords() {
        assert_eq!(
            kinds("lua.print(x)"),
            vec![
                TokenKind::Language,
                TokenKind::Dot,
                TokenKind::Identifier,
                TokenKind::LeftParen,
                TokenKind::Identifier,
                TokenKind::RightParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn comments_become_newline_tokens() {
        let tokens = tokenize("x = 1 # set x\ny = 2").unwrap_or_default();
        let comment = tokens.iter().find(|t| t.text.starts_with('#'));
        let comment = comment.map(|t| t.kind);
        assert_eq!(comment, Some(TokenKind::Newline));
    }

    #[test]
    fn longest_match_operators() {
        assert_eq!(
            kinds("a |> b ?: c"),
            vec![
                TokenKind::Identifier,
                TokenKind::PipeForward,
                TokenKind::Identifier,
                TokenKind::Question,
                TokenKind::Colon,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
        assert_eq!(
            kinds("<< >> <= >= := ->"),
            vec![
                TokenKind::DoubleLess,
                TokenKind::DoubleGreater,
                TokenKind::LessEqual,
                TokenKind::GreaterEqual,
                TokenKind::Walrus,
                TokenKind::Arrow,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn number_forms() {
        for src in ["42", "3.14", "0xFF", "0b1010", "1e9", "2.5e-3"] {
            let tokens = tokenize(src).unwrap_or_default();
            assert_eq!(tokens[0].kind, TokenKind::Number, "{src}");
            assert_eq!(&*tokens[0].text, src, "{src}");
        }
    }

    #[test]
    fn float_dot_vs_member_dot() {
        assert_eq!(
            kinds("users[0].age"),
            vec![
                TokenKind::Identifier,
                TokenKind::LeftBracket,
                TokenKind::Number,
                TokenKind::RightBracket,
                TokenKind::Dot,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn string_decoding() {
        let tokens = tokenize(r#""a\nb""#).unwrap_or_default();
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(decode_string_literal(&tokens[0].text), "a\nb");
    }

    #[test]
    fn unterminated_string_reports_open_quote() {
        let err = tokenize("x = \"abc").unwrap_err();
        assert_eq!(err, LexError::UnterminatedString { line: 1, column: 5 });
    }

    #[test]
    fn unexpected_character() {
        let err = tokenize("a @ b").unwrap_err();
        assert!(matches!(err, LexError::UnexpectedCharacter { ch: '@', .. }));
    }

    #[test]
    fn wildcard_and_identifier() {
        assert_eq!(kinds("_"), vec![TokenKind::Wildcard, TokenKind::Eof]);
        assert_eq!(kinds("_x"), vec![TokenKind::Identifier, TokenKind::Eof]);
    }

    #[test]
    fn spans_slice_back_to_their_lexemes() {
        let source = "lua.y = py.math.sqrt(16) + 2\n<<a:8>> = data";
        let tokens = tokenize(source).unwrap_or_default();
        for token in &tokens {
            assert_eq!(
                &source[token.span.start.byte..token.span.end.byte],
                &*token.text,
                "{:?}",
                token.kind
            );
        }
    }

    #[test]
    fn token_positions_are_one_based() {
        let tokens = tokenize("a = 1\nbb = 2").unwrap_or_default();
        assert_eq!(tokens[0].span.start.line, 1);
        assert_eq!(tokens[0].span.start.column, 1);
        let bb = tokens.iter().find(|t| &*t.text == "bb");
        let span = bb.map(|t| t.span.start);
        assert_eq!(span.map(|p| (p.line, p.column)), Some((2, 1)));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn lexing_never_panics(input in ".*") {
                let _ = tokenize(&input);
            }

            #[test]
            fn successful_lex_ends_with_eof(input in "[a-z0-9 =+*().\\n]*") {
                if let Ok(tokens) = tokenize(&input) {
                    prop_assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
                }
            }

            #[test]
            fn positions_are_monotone(input in "[a-z0-9 =+*().\\n]*") {
                if let Ok(tokens) = tokenize(&input) {
                    for pair in tokens.windows(2) {
                        prop_assert!(pair[0].span.start.byte <= pair[1].span.start.byte);
                    }
                }
            }
        }
    }
}
