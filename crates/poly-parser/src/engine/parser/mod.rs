//! Core parser for Poly source.
//!
//! A dispatch-based recursive descent parser: the top-level loop looks at the
//! leading token of each statement, asks the [`HandlerRegistry`] for the
//! candidate construct handlers, and runs them best-first. A handler either
//! produces a node, declines with `None` so the next candidate gets a turn,
//! or fails with a positioned error that aborts the whole parse.
//!
//! Expression parsing is a single precedence-climbing engine shared by every
//! handler; the bitstring sub-parser and the pipeline assembler are
//! restricted entry points into the same machinery.
//!
//! # Usage
//!
//! ```ignore
//! use poly_parser::parse_source;
//!
//! let program = parse_source("lua.y = py.math.sqrt(16) + 2")?;
//! println!("{}", program.summary());
//! ```

use crate::engine::context::{DEFAULT_MAX_RECURSION_DEPTH, ParseContext};
use crate::engine::error::{ParseError, ParseResult};
use crate::engine::languages::LanguageRegistry;
use crate::engine::literal;
use crate::engine::registry::{HandlerKind, HandlerRegistry, default_registry};
use crate::engine::validate;
use crate::tokens::token_stream::TokenStream;
use poly_ast::{BitstringSegment, MatchArm, Node, NodeKind, SizeExpr};
use poly_position::{Position, Span};
use poly_token::{Token, TokenKind};
use tracing::{debug, trace};

/// Dispatcher state, reported in the verbose trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DispatchState {
    /// At the start of a top-level or block statement
    StartOfStatement,
    /// Inside an expression
    InExpression,
    /// Inside a call argument list
    InCallArglist,
    /// Inside a `{ … }` body
    InBlock,
    /// Input exhausted
    End,
}

/// Parser construction settings.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Recursion cap for nested statements and operands
    pub max_recursion_depth: usize,
    /// Emit `debug!` dispatch traces instead of `trace!`
    pub verbose: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig { max_recursion_depth: DEFAULT_MAX_RECURSION_DEPTH, verbose: false }
    }
}

/// The Poly parser.
///
/// Owns the token stream, the shared parse context, and the two registries.
/// One parser instance performs one parse; the registries are read-only once
/// construction finishes.
pub struct Parser {
    /// Cursor over the lexed tokens
    tokens: TokenStream,
    /// Recursion guard, loop nesting, verbosity
    ctx: ParseContext,
    /// Immutable language alias table
    languages: LanguageRegistry,
    /// Handler selection tables
    registry: HandlerRegistry,
}

impl Parser {
    /// Create a parser with the default configuration and handler wiring.
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser::with_config(tokens, ParserConfig::default())
    }

    /// Create a parser with explicit settings.
    pub fn with_config(tokens: Vec<Token>, config: ParserConfig) -> Self {
        Parser {
            tokens: TokenStream::new(tokens),
            ctx: ParseContext::new(config.max_recursion_depth, config.verbose),
            languages: LanguageRegistry::new(),
            registry: default_registry(),
        }
    }

    /// Create a parser with a custom handler registry.
    pub fn with_registry(
        tokens: Vec<Token>,
        config: ParserConfig,
        registry: HandlerRegistry,
    ) -> Self {
        Parser {
            tokens: TokenStream::new(tokens),
            ctx: ParseContext::new(config.max_recursion_depth, config.verbose),
            languages: LanguageRegistry::new(),
            registry,
        }
    }

    /// Parse the whole token stream into a program node.
    ///
    /// Statements are separated by newlines and semicolons; comment tokens
    /// arrive as newlines and are skipped the same way. The first error
    /// aborts the parse with no partial tree.
    pub fn parse(&mut self) -> ParseResult<Node> {
        let start = self.tokens.current().span.start;
        let mut statements = Vec::new();

        loop {
            self.skip_separators();
            if self.tokens.current().kind == TokenKind::Eof {
                self.tokens.consume();
                self.trace_state(DispatchState::End);
                break;
            }
            statements.push(self.parse_statement()?);
        }

        let end = self.previous_end();
        Ok(Node::new(NodeKind::Program { statements }, Span::new(start, end)))
    }

    /// Parse one statement under the recursion guard.
    pub(crate) fn parse_statement(&mut self) -> ParseResult<Node> {
        self.with_recursion_guard(Parser::dispatch_statement)
    }

    /// Pick and run handlers for the statement's leading token.
    fn dispatch_statement(&mut self) -> ParseResult<Node> {
        self.trace_state(DispatchState::StartOfStatement);
        let token = self.tokens.current().clone();

        for kind in self.registry.handlers_for(token.kind) {
            self.trace_dispatch(kind, &token);
            if let Some(node) = self.run_handler(kind)? {
                return Ok(node);
            }
        }
        for kind in self.registry.fallbacks_for(token.kind) {
            self.trace_dispatch(kind, &token);
            if let Some(node) = self.run_handler(kind)? {
                return Ok(node);
            }
        }

        if token.kind == TokenKind::Eof {
            return Err(ParseError::eof(token.span.start));
        }
        Err(ParseError::syntax(
            format!("unexpected token '{}'", token.text),
            token.span.start,
        ))
    }

    /// Run one construct handler. `Ok(None)` means the handler declined.
    fn run_handler(&mut self, kind: HandlerKind) -> ParseResult<Option<Node>> {
        match kind {
            HandlerKind::Assignment => self.handle_assignment(),
            HandlerKind::If => self.handle_if(),
            HandlerKind::While => self.handle_while(),
            HandlerKind::CStyleFor => self.handle_c_style_for(),
            HandlerKind::NumericFor => self.handle_numeric_for(),
            HandlerKind::ForIn => self.handle_for_in(),
            HandlerKind::Match => self.handle_match(),
            HandlerKind::Import => self.handle_import(),
            HandlerKind::Break => self.handle_break(),
            HandlerKind::Continue => self.handle_continue(),
            HandlerKind::Bitstring => self.handle_bitstring(),
            HandlerKind::BitstringPatternAssignment => self.handle_bitstring_pattern_assignment(),
            HandlerKind::LanguageCall => self.handle_language_call(),
            HandlerKind::QualifiedVariable => self.handle_qualified_variable(),
            HandlerKind::ReservedKeywordGuard => self.handle_reserved_keyword_guard(),
            HandlerKind::ParenthesizedExpression => self.handle_parenthesized(),
            HandlerKind::Pipe => self.handle_pipe(),
            HandlerKind::Ternary => self.handle_ternary(),
            HandlerKind::IndexExpression => self.handle_index_expression(),
            HandlerKind::Tuple => self.handle_tuple(),
            HandlerKind::VariableRead => self.handle_variable_read(),
        }
    }

    // ===== Shared helpers =====

    /// Whether the current token has the given kind.
    fn at(&self, kind: TokenKind) -> bool {
        self.tokens.current().kind == kind
    }

    /// Consume the current token when it matches.
    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.tokens.consume();
            true
        } else {
            false
        }
    }

    /// Consume a token of the given kind or fail with `message`.
    fn expect(&mut self, kind: TokenKind, message: &str) -> ParseResult<Token> {
        let (found, at) = {
            let current = self.tokens.current();
            (current.kind, current.span.start)
        };
        if found == kind {
            Ok(self.tokens.consume())
        } else if found == TokenKind::Eof {
            Err(ParseError::eof(at))
        } else {
            Err(ParseError::syntax(message, at))
        }
    }

    /// Skip newline and semicolon separators.
    fn skip_separators(&mut self) {
        while self.tokens.current().kind.is_separator() {
            self.tokens.consume();
        }
    }

    /// Skip newline tokens only (used inside bracketed constructs where `;`
    /// stays significant).
    fn skip_newlines(&mut self) {
        while self.at(TokenKind::Newline) {
            self.tokens.consume();
        }
    }

    /// Position of the current token.
    fn current_position(&self) -> Position {
        self.tokens.current().span.start
    }

    /// End position of the most recently consumed token.
    fn previous_end(&self) -> Position {
        self.tokens
            .previous_span()
            .map(|s| s.end)
            .unwrap_or_else(Position::start_of_input)
    }

    /// Span from a start position to the end of the last consumed token.
    fn span_from(&self, start: Position) -> Span {
        Span::new(start, self.previous_end())
    }

    /// Run `f` one recursion level deeper, restoring the counter on every
    /// exit path.
    fn with_recursion_guard<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<T> {
        if !self.ctx.enter_recursion() {
            let at = self.current_position();
            return Err(ParseError::RecursionLimit { line: at.line, column: at.column });
        }
        let result = f(self);
        self.ctx.exit_recursion();
        result
    }

    /// Run `f` with the loop-nesting counter raised, restoring it on every
    /// exit path.
    fn with_loop_scope<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<T> {
        self.ctx.enter_loop();
        let result = f(self);
        self.ctx.exit_loop();
        result
    }

    fn trace_dispatch(&self, kind: HandlerKind, token: &Token) {
        if self.ctx.verbose() {
            debug!(handler = kind.name(), token = %token.text, "dispatch");
        } else {
            trace!(handler = kind.name(), token = %token.text, "dispatch");
        }
    }

    fn trace_state(&self, state: DispatchState) {
        if self.ctx.verbose() {
            debug!(state = ?state, depth = self.ctx.depth(), "parser state");
        } else {
            trace!(state = ?state, depth = self.ctx.depth(), "parser state");
        }
    }
}

/// Parse a lexed token vector into a program node.
pub fn parse(tokens: Vec<Token>) -> ParseResult<Node> {
    Parser::new(tokens).parse()
}

/// Lex and parse a source string in one step.
pub fn parse_source(source: &str) -> ParseResult<Node> {
    let tokens = poly_lexer::tokenize(source)?;
    Parser::new(tokens).parse()
}

include!("statements.rs");
include!("control_flow.rs");
include!("bitstring.rs");
include!("expressions/mod.rs");
include!("expressions/precedence.rs");
include!("expressions/primary.rs");
include!("expressions/postfix.rs");
include!("expressions/pipeline.rs");
