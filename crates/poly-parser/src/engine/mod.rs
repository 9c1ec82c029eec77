//! Parser engine components and supporting utilities.

/// Shared parse context: recursion guard, loop nesting, verbosity.
pub mod context;
/// Parse error types and the diagnostic format.
pub mod error;
/// Language alias registry.
pub mod languages;
/// Number literal interpretation.
pub mod literal;
/// The dispatch-based parser and its construct handlers.
pub mod parser;
/// Handler registry, configuration, and the default wiring.
pub mod registry;
/// Contextual validation rules checked mid-parse.
pub(crate) mod validate;
