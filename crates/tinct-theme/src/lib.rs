//! # Tinct Theme
//!
//! The theme composition engine: a fixed taxonomy of conceptual token
//! categories, the tables that tie them to semantic selectors and TextMate
//! scopes, and the two directions of travel between a theme file and a
//! [`ResolvedTokenMap`].
//!
//! ```text
//!   theme.json ──resolve()──▶ ResolvedTokenMap ──compose()──▶ theme.json
//!   (semanticTokenColors,        (one color and        (base rules + emitted
//!    tokenColors)                  style per category)    semantic/scope rules)
//! ```
//!
//! ## Learning: Data at the Edges, Types in the Middle
//!
//! Theme files are loosely typed JSON. We keep the raw shape where we pass
//! values through untouched (`serde_json::Map`) and convert into tagged
//! enums like [`SemanticValue`] exactly once, at the point where the engine
//! starts making decisions.

mod color;
mod compiler;
mod document;
mod resolved;
mod resolver;
pub mod rules;
mod taxonomy;

pub use color::{ColorHex, FontStyle};
pub use compiler::{
    compose, emit_scope_rules, emit_semantic_rules, theme_file_name, validate_theme_name,
    CompiledTheme, ThemeCompiler, ThemeOverrides,
};
pub use document::{ScopeRule, ScopeSelector, ScopeSettings, SemanticValue, ThemeDocument, ThemeKind};
pub use resolved::{ResolvedToken, ResolvedTokenMap};
pub use resolver::{resolve, resolve_theme};
pub use taxonomy::{ConceptualToken, TokenCategory, TAXONOMY};

/// Result type for theme operations
pub type ThemeResult<T> = Result<T, ThemeError>;

/// Errors that can occur while reading, validating or writing themes.
///
/// Malformed individual rules are never errors; they are skipped during
/// resolution. Only structurally invalid input ends up here.
#[derive(Debug, thiserror::Error)]
pub enum ThemeError {
    #[error("Invalid theme name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("Invalid color: {0:?}")]
    InvalidColor(String),

    #[error("Unknown token category: {0}")]
    UnknownCategory(String),

    #[error("Malformed theme JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_then_compose_keeps_base_rules() {
        let base: ThemeDocument = serde_json::from_value(json!({
            "name": "Base",
            "type": "dark",
            "colors": { "editor.background": "#1E1E1E" },
            "tokenColors": [
                { "scope": "keyword", "settings": { "foreground": "#C586C0" } }
            ]
        }))
        .unwrap();

        let map = resolve_theme(&base);
        assert_eq!(map[TokenCategory::Keyword].color.as_str(), "#C586C0");

        let output = compose(&base, &map, &ThemeOverrides::default());
        assert_eq!(output.token_colors[0], base.token_colors[0]);
        assert_eq!(output.token_colors.len(), 1 + emit_scope_rules(&map).len());
        assert_eq!(resolve_theme(&output), map);
    }
}
