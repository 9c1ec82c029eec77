//! Dispatch-based parser core for the Poly polyglot scripting language.
//!
//! Poly is a small imperative scripting surface whose distinguishing feature
//! is qualified cross-language invocation: `lua.math.sqrt(x)` calls into the
//! Lua runtime, `py.data.users[0].age = 26` writes through the Python one.
//! Around that sit conventional constructs (assignments, `if`, `while`,
//! C-style and numeric `for`, `match`, pipelines) and Erlang-style bitstring
//! literals and patterns.
//!
//! This crate turns a lexed token vector into a typed AST:
//!
//! - a handler registry selects a construct handler per leading token by
//!   priority, order, and a fallback tier;
//! - every handler shares one parse context (token stream, recursion guard,
//!   loop-nesting counter);
//! - a single precedence-climbing engine parses all expression forms, with
//!   restricted entry points for bitstring segment values and pipeline
//!   chains.
//!
//! Parsing is single-threaded and synchronous; the first error aborts the
//! parse with a `message at line L, column C` diagnostic and no partial
//! tree.
//!
//! # Example
//!
//! ```ignore
//! use poly_parser::parse_source;
//!
//! let program = parse_source("lua.y = py.math.sqrt(16) + 2")?;
//! ```

#![deny(unsafe_code)]
#![deny(unreachable_pub)]
#![warn(rust_2018_idioms)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions, clippy::result_large_err)]

/// Parser engine components and supporting utilities.
pub mod engine;
/// Token stream utilities for the parser.
pub mod tokens;

pub use engine::context::{DEFAULT_MAX_RECURSION_DEPTH, ParseContext};
pub use engine::error::{ParseError, ParseResult};
pub use engine::languages::LanguageRegistry;
pub use engine::parser::{Parser, ParserConfig, parse, parse_source};
pub use engine::registry::{
    HandlerConfig, HandlerKind, HandlerRegistry, RegistryError, default_registry,
};
pub use tokens::token_stream::TokenStream;

/// AST definitions consumed and produced by the parser.
pub use poly_ast as ast;
/// The lexer, re-exported for drivers that tokenize separately.
pub use poly_lexer as lexer;
pub use poly_token::{Token, TokenKind};
