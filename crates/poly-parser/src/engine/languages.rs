//! Language alias registry.
//!
//! Maps user-facing language names to canonical runtime identifiers. The
//! mapping is seeded at compile time, case-sensitive, and immutable for the
//! life of a parse; qualified paths whose head is not in the table are
//! rejected with `unsupported language`.

use phf::phf_map;

/// Seeded alias table. `node` scripts run on the `js` runtime.
static LANGUAGE_ALIASES: phf::Map<&'static str, &'static str> = phf_map! {
    "lua" => "lua",
    "python" => "python",
    "py" => "python",
    "go" => "go",
    "node" => "js",
    "js" => "js",
};

/// Immutable view over the language alias table.
#[derive(Debug, Clone, Copy, Default)]
pub struct LanguageRegistry;

impl LanguageRegistry {
    /// Create a registry over the seeded table.
    pub fn new() -> Self {
        LanguageRegistry
    }

    /// Resolve an alias to its canonical name, or `None` for unknowns.
    pub fn resolve(&self, alias: &str) -> Option<&'static str> {
        LANGUAGE_ALIASES.get(alias).copied()
    }

    /// Whether `alias` names a known language.
    pub fn is_known(&self, alias: &str) -> bool {
        LANGUAGE_ALIASES.contains_key(alias)
    }
}
