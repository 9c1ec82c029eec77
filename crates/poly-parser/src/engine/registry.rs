//! Handler registry: per-token handler selection.
//!
//! Construct handlers form a closed set ([`HandlerKind`]); the registry maps
//! each leading token kind to an ordered candidate list. Normal handlers sort
//! by `(priority desc, order asc, name asc)`; fallback handlers live in a
//! separate tier sorted by `fallback_priority desc` and are consulted only
//! after every normal candidate has declined.
//!
//! The registry is built once per parser instance and read-only afterwards.

use poly_token::TokenKind;
use rustc_hash::FxHashMap;
use serde_json::Value;
use thiserror::Error;

/// The closed set of construct handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    /// `x = …`, `lua.y = …`, chained and indexed assignments
    Assignment,
    /// `if cond { … } else if … else { … }`
    If,
    /// `while cond { … }`
    While,
    /// `for init; cond; incr { … }`
    CStyleFor,
    /// `for i = start, end, step do … end`
    NumericFor,
    /// `for k, v in expr { … }`
    ForIn,
    /// `match subject { pattern -> body … }`
    Match,
    /// `import lua "path"`
    Import,
    /// `break`
    Break,
    /// `continue`
    Continue,
    /// `<<segment, …>>` literal in statement position
    Bitstring,
    /// `<<pattern>> = value`
    BitstringPatternAssignment,
    /// `lua.fn(args)` statement, optionally backgrounded with `&`
    LanguageCall,
    /// Bare `lua.name` read
    QualifiedVariable,
    /// Rejects misuse of a bare language keyword
    ReservedKeywordGuard,
    /// `( expression )` in statement position
    ParenthesizedExpression,
    /// `a | b |> c` statement
    Pipe,
    /// `cond ? a : b` statement
    Ternary,
    /// `a[0]` read in statement position
    IndexExpression,
    /// Placeholder until tuple syntax is settled; always declines
    Tuple,
    /// Bare identifier read (fallback tier)
    VariableRead,
}

impl HandlerKind {
    /// Stable handler name used for registry ordering and tracing.
    pub fn name(self) -> &'static str {
        match self {
            HandlerKind::Assignment => "assignment",
            HandlerKind::If => "if",
            HandlerKind::While => "while",
            HandlerKind::CStyleFor => "c_style_for",
            HandlerKind::NumericFor => "numeric_for",
            HandlerKind::ForIn => "for_in",
            HandlerKind::Match => "match",
            HandlerKind::Import => "import",
            HandlerKind::Break => "break",
            HandlerKind::Continue => "continue",
            HandlerKind::Bitstring => "bitstring",
            HandlerKind::BitstringPatternAssignment => "bitstring_pattern_assignment",
            HandlerKind::LanguageCall => "language_call",
            HandlerKind::QualifiedVariable => "qualified_variable",
            HandlerKind::ReservedKeywordGuard => "reserved_keyword_guard",
            HandlerKind::ParenthesizedExpression => "parenthesized_expression",
            HandlerKind::Pipe => "pipe",
            HandlerKind::Ternary => "ternary",
            HandlerKind::IndexExpression => "index_expression",
            HandlerKind::Tuple => "tuple",
            HandlerKind::VariableRead => "variable_read",
        }
    }

    /// Whether this handler can be dispatched on `token` at all.
    ///
    /// This is the cheap structural check; deeper lookahead happens inside
    /// the handler, which declines by returning `None`.
    pub fn can_handle(self, token: TokenKind) -> bool {
        match self {
            HandlerKind::Assignment => {
                matches!(token, TokenKind::Identifier | TokenKind::Language)
            }
            HandlerKind::If => token == TokenKind::If,
            HandlerKind::While => token == TokenKind::While,
            HandlerKind::CStyleFor | HandlerKind::NumericFor | HandlerKind::ForIn => {
                token == TokenKind::For
            }
            HandlerKind::Match => token == TokenKind::Match,
            HandlerKind::Import => token == TokenKind::Import,
            HandlerKind::Break => token == TokenKind::Break,
            HandlerKind::Continue => token == TokenKind::Continue,
            HandlerKind::Bitstring | HandlerKind::BitstringPatternAssignment => {
                token == TokenKind::DoubleLess
            }
            HandlerKind::LanguageCall
            | HandlerKind::QualifiedVariable
            | HandlerKind::ReservedKeywordGuard => token == TokenKind::Language,
            HandlerKind::ParenthesizedExpression | HandlerKind::Tuple => {
                token == TokenKind::LeftParen
            }
            HandlerKind::Pipe => matches!(
                token,
                TokenKind::Identifier | TokenKind::Language | TokenKind::String
            ),
            HandlerKind::Ternary => token == TokenKind::Identifier,
            HandlerKind::IndexExpression => token == TokenKind::Identifier,
            HandlerKind::VariableRead => token == TokenKind::Identifier,
        }
    }
}

/// Per-handler registration settings.
#[derive(Debug, Clone)]
pub struct HandlerConfig {
    /// Disabled handlers are skipped entirely
    pub enabled: bool,
    /// Primary sort key; higher runs first
    pub priority: i32,
    /// Secondary sort key; lower runs first
    pub order: i32,
    /// Ordering within the fallback tier; higher runs first
    pub fallback_priority: i32,
    /// Whether this registration lives in the fallback tier
    pub is_fallback: bool,
    /// Handler name; ties on (priority, order) sort by name
    pub name: String,
    /// Free-form per-handler parameters, e.g. the tuple handler's
    /// `maxElements` / `allowEmpty`
    pub custom_params: FxHashMap<String, Value>,
}

impl HandlerConfig {
    /// A normal-tier registration.
    pub fn normal(name: &str, priority: i32, order: i32) -> Self {
        HandlerConfig {
            enabled: true,
            priority,
            order,
            fallback_priority: 0,
            is_fallback: false,
            name: name.to_string(),
            custom_params: FxHashMap::default(),
        }
    }

    /// A fallback-tier registration.
    pub fn fallback(name: &str, fallback_priority: i32) -> Self {
        HandlerConfig {
            enabled: true,
            priority: 0,
            order: 0,
            fallback_priority,
            is_fallback: true,
            name: name.to_string(),
            custom_params: FxHashMap::default(),
        }
    }

    /// Attach a custom parameter.
    pub fn with_param(mut self, key: &str, value: Value) -> Self {
        self.custom_params.insert(key.to_string(), value);
        self
    }

    /// Read an integer custom parameter.
    pub fn usize_param(&self, key: &str) -> Option<usize> {
        self.custom_params.get(key)?.as_u64().map(|v| v as usize)
    }

    /// Read a boolean custom parameter.
    pub fn bool_param(&self, key: &str) -> Option<bool> {
        self.custom_params.get(key)?.as_bool()
    }
}

/// Registration failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Two normal-tier handlers claimed the same nonzero order on a token.
    #[error(
        "handler '{incoming}' conflicts with '{existing}' on {token:?} at order {order}"
    )]
    DuplicateOrder {
        /// The contested leading token
        token: TokenKind,
        /// The contested order value
        order: i32,
        /// Name of the already-registered handler
        existing: String,
        /// Name of the rejected handler
        incoming: String,
    },
    /// A handler was registered on a token its `can_handle` rejects.
    #[error("handler '{name}' cannot handle leading token {token:?}")]
    TokenMismatch {
        /// The offending token
        token: TokenKind,
        /// Name of the rejected handler
        name: String,
    },
}

#[derive(Debug, Clone)]
struct Registered {
    kind: HandlerKind,
    config: HandlerConfig,
}

/// Maps each leading token kind to its candidate handlers.
#[derive(Debug, Default, Clone)]
pub struct HandlerRegistry {
    normal: FxHashMap<TokenKind, Vec<Registered>>,
    fallback: FxHashMap<TokenKind, Vec<Registered>>,
}

impl HandlerRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        HandlerRegistry::default()
    }

    /// Register a handler for a leading token.
    ///
    /// Fails when a normal-tier handler claims a nonzero `order` already
    /// taken on that token, or when the handler structurally cannot start at
    /// the token.
    pub fn register(
        &mut self,
        token: TokenKind,
        kind: HandlerKind,
        config: HandlerConfig,
    ) -> Result<(), RegistryError> {
        if !kind.can_handle(token) {
            return Err(RegistryError::TokenMismatch { token, name: config.name });
        }
        if !config.is_fallback && config.order != 0 {
            if let Some(existing) = self
                .normal
                .get(&token)
                .and_then(|list| list.iter().find(|r| r.config.order == config.order))
            {
                return Err(RegistryError::DuplicateOrder {
                    token,
                    order: config.order,
                    existing: existing.config.name.clone(),
                    incoming: config.name,
                });
            }
        }

        let tier = if config.is_fallback { &mut self.fallback } else { &mut self.normal };
        let list = tier.entry(token).or_default();
        list.push(Registered { kind, config });
        if let Some(list) = self.normal.get_mut(&token) {
            list.sort_by(|a, b| {
                b.config
                    .priority
                    .cmp(&a.config.priority)
                    .then(a.config.order.cmp(&b.config.order))
                    .then(a.config.name.cmp(&b.config.name))
            });
        }
        if let Some(list) = self.fallback.get_mut(&token) {
            list.sort_by(|a, b| {
                b.config
                    .fallback_priority
                    .cmp(&a.config.fallback_priority)
                    .then(a.config.name.cmp(&b.config.name))
            });
        }
        Ok(())
    }

    /// Enabled normal-tier handlers for a token, best first.
    pub fn handlers_for(&self, token: TokenKind) -> Vec<HandlerKind> {
        self.normal
            .get(&token)
            .map(|list| {
                list.iter().filter(|r| r.config.enabled).map(|r| r.kind).collect()
            })
            .unwrap_or_default()
    }

    /// Enabled fallback-tier handlers for a token, best first.
    pub fn fallbacks_for(&self, token: TokenKind) -> Vec<HandlerKind> {
        self.fallback
            .get(&token)
            .map(|list| {
                list.iter().filter(|r| r.config.enabled).map(|r| r.kind).collect()
            })
            .unwrap_or_default()
    }

    /// The single best normal-tier handler, if any.
    pub fn get_best(&self, token: TokenKind) -> Option<HandlerKind> {
        self.handlers_for(token).first().copied()
    }

    /// All fallback handlers for a token, best first.
    pub fn get_fallbacks(&self, token: TokenKind) -> Vec<HandlerKind> {
        self.fallbacks_for(token)
    }

    /// Configuration of a registered handler.
    pub fn config_for(&self, token: TokenKind, kind: HandlerKind) -> Option<&HandlerConfig> {
        self.normal
            .get(&token)
            .and_then(|list| list.iter().find(|r| r.kind == kind))
            .or_else(|| {
                self.fallback
                    .get(&token)
                    .and_then(|list| list.iter().find(|r| r.kind == kind))
            })
            .map(|r| &r.config)
    }
}

/// The standard Poly handler wiring.
///
/// Priorities encode the disambiguation story per leading token: guards run
/// before assignments, assignments before pipes, pipes before plain calls,
/// and bare reads live in the fallback tier.
pub fn default_registry() -> HandlerRegistry {
    match build_default() {
        Ok(registry) => registry,
        Err(_) => unreachable!("built-in handler table uses distinct orders per token"),
    }
}

fn build_default() -> Result<HandlerRegistry, RegistryError> {
    use HandlerKind as H;
    use TokenKind as T;

    let mut reg = HandlerRegistry::new();

    reg.register(T::Identifier, H::Assignment, HandlerConfig::normal("assignment", 100, 1))?;
    reg.register(T::Identifier, H::Pipe, HandlerConfig::normal("pipe", 90, 2))?;
    reg.register(T::Identifier, H::Ternary, HandlerConfig::normal("ternary", 85, 3))?;
    reg.register(
        T::Identifier,
        H::IndexExpression,
        HandlerConfig::normal("index_expression", 80, 4),
    )?;
    reg.register(
        T::Identifier,
        H::VariableRead,
        HandlerConfig::fallback("variable_read", 10),
    )?;

    reg.register(
        T::Language,
        H::ReservedKeywordGuard,
        HandlerConfig::normal("reserved_keyword_guard", 110, 1),
    )?;
    reg.register(T::Language, H::Assignment, HandlerConfig::normal("assignment", 108, 2))?;
    reg.register(T::Language, H::Pipe, HandlerConfig::normal("pipe", 105, 3))?;
    reg.register(
        T::Language,
        H::LanguageCall,
        HandlerConfig::normal("language_call", 100, 4),
    )?;
    reg.register(
        T::Language,
        H::QualifiedVariable,
        HandlerConfig::fallback("qualified_variable", 20),
    )?;

    reg.register(T::String, H::Pipe, HandlerConfig::normal("pipe", 90, 1))?;

    reg.register(T::If, H::If, HandlerConfig::normal("if", 100, 1))?;
    reg.register(T::While, H::While, HandlerConfig::normal("while", 100, 1))?;
    reg.register(T::For, H::CStyleFor, HandlerConfig::normal("c_style_for", 100, 1))?;
    reg.register(T::For, H::NumericFor, HandlerConfig::normal("numeric_for", 100, 2))?;
    reg.register(T::For, H::ForIn, HandlerConfig::normal("for_in", 100, 3))?;
    reg.register(T::Match, H::Match, HandlerConfig::normal("match", 100, 1))?;
    reg.register(T::Break, H::Break, HandlerConfig::normal("break", 100, 1))?;
    reg.register(T::Continue, H::Continue, HandlerConfig::normal("continue", 100, 1))?;
    reg.register(T::Import, H::Import, HandlerConfig::normal("import", 100, 1))?;

    reg.register(
        T::DoubleLess,
        H::BitstringPatternAssignment,
        HandlerConfig::normal("bitstring_pattern_assignment", 110, 1),
    )?;
    reg.register(T::DoubleLess, H::Bitstring, HandlerConfig::normal("bitstring", 100, 2))?;

    // The tuple placeholder outranks the parenthesized handler and always
    // declines, exercising the decline-and-try-next flow.
    reg.register(
        T::LeftParen,
        H::Tuple,
        HandlerConfig::normal("tuple", 110, 1)
            .with_param("maxElements", Value::from(100))
            .with_param("allowEmpty", Value::from(true)),
    )?;
    reg.register(
        T::LeftParen,
        H::ParenthesizedExpression,
        HandlerConfig::normal("parenthesized_expression", 100, 2),
    )?;

    Ok(reg)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_registry_orders_by_priority() {
        let reg = default_registry();
        let handlers = reg.handlers_for(TokenKind::Language);
        assert_eq!(
            handlers,
            vec![
                HandlerKind::ReservedKeywordGuard,
                HandlerKind::Assignment,
                HandlerKind::Pipe,
                HandlerKind::LanguageCall,
            ]
        );
        assert_eq!(reg.get_best(TokenKind::Language), Some(HandlerKind::ReservedKeywordGuard));
    }

    #[test]
    fn fallbacks_are_a_separate_tier() {
        let reg = default_registry();
        assert_eq!(reg.get_fallbacks(TokenKind::Identifier), vec![HandlerKind::VariableRead]);
        assert!(!reg.handlers_for(TokenKind::Identifier).contains(&HandlerKind::VariableRead));
    }

    #[test]
    fn duplicate_nonzero_order_is_rejected() {
        let mut reg = HandlerRegistry::new();
        reg.register(
            TokenKind::Identifier,
            HandlerKind::Assignment,
            HandlerConfig::normal("assignment", 100, 1),
        )
        .ok();
        let err = reg
            .register(
                TokenKind::Identifier,
                HandlerKind::Pipe,
                HandlerConfig::normal("pipe", 90, 1),
            )
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateOrder { order: 1, .. }));
    }

    #[test]
    fn zero_order_never_conflicts() {
        let mut reg = HandlerRegistry::new();
        assert!(reg
            .register(
                TokenKind::Identifier,
                HandlerKind::Assignment,
                HandlerConfig::normal("assignment", 100, 0),
            )
            .is_ok());
        assert!(reg
            .register(
                TokenKind::Identifier,
                HandlerKind::Pipe,
                HandlerConfig::normal("pipe", 90, 0),
            )
            .is_ok());
    }

    #[test]
    fn mismatched_token_is_rejected() {
        let mut reg = HandlerRegistry::new();
        let err = reg
            .register(
                TokenKind::Number,
                HandlerKind::If,
                HandlerConfig::normal("if", 100, 1),
            )
            .unwrap_err();
        assert!(matches!(err, RegistryError::TokenMismatch { .. }));
    }

    #[test]
    fn disabled_handlers_are_skipped() {
        let mut reg = HandlerRegistry::new();
        let mut config = HandlerConfig::normal("if", 100, 1);
        config.enabled = false;
        reg.register(TokenKind::If, HandlerKind::If, config).ok();
        assert!(reg.handlers_for(TokenKind::If).is_empty());
        assert_eq!(reg.get_best(TokenKind::If), None);
    }

    #[test]
    fn equal_priority_sorts_by_order_then_name() {
        let reg = default_registry();
        let handlers = reg.handlers_for(TokenKind::For);
        assert_eq!(
            handlers,
            vec![HandlerKind::CStyleFor, HandlerKind::NumericFor, HandlerKind::ForIn]
        );
    }

    #[test]
    fn tuple_placeholder_outranks_parenthesized() {
        let reg = default_registry();
        assert_eq!(
            reg.handlers_for(TokenKind::LeftParen),
            vec![HandlerKind::Tuple, HandlerKind::ParenthesizedExpression]
        );
    }

    #[test]
    fn tuple_params_are_exposed() {
        let reg = default_registry();
        let config = reg.config_for(TokenKind::LeftParen, HandlerKind::Tuple);
        let max = config.and_then(|c| c.usize_param("maxElements"));
        let allow = config.and_then(|c| c.bool_param("allowEmpty"));
        assert_eq!(max, Some(100));
        assert_eq!(allow, Some(true));
    }
}
