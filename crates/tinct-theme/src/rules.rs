//! Static tables linking categories to semantic selectors and TextMate scopes.
//!
//! The canonical scope lists are chosen so that no scope of one category is
//! a prefix of a scope of another category. A rule emitted for one category
//! therefore never leaks into a neighbour when the theme is read back.

use crate::TokenCategory;

/// Semantic selectors the compiler emits, in emission order.
///
/// Selectors not listed here still resolve through their base type, so
/// `comment.documentation` lands on [`TokenCategory::Comment`].
pub static SEMANTIC_SELECTORS: &[(&str, TokenCategory)] = &[
    ("comment", TokenCategory::Comment),
    ("string", TokenCategory::Literal),
    ("regexp", TokenCategory::Literal),
    ("keyword", TokenCategory::Keyword),
    ("modifier", TokenCategory::Keyword),
    ("variable", TokenCategory::Variable),
    ("variable.readonly", TokenCategory::Constant),
    ("variable.defaultLibrary", TokenCategory::Builtin),
    ("enumMember", TokenCategory::Constant),
    ("parameter", TokenCategory::Parameter),
    ("function", TokenCategory::Function),
    ("method", TokenCategory::Function),
    ("function.defaultLibrary", TokenCategory::Builtin),
    ("class", TokenCategory::Class),
    ("class.defaultLibrary", TokenCategory::Builtin),
    ("interface", TokenCategory::Interface),
    ("enum", TokenCategory::Enum),
    ("type", TokenCategory::Type),
    ("struct", TokenCategory::Type),
    ("typeParameter", TokenCategory::Type),
    ("number", TokenCategory::Number),
    ("macro", TokenCategory::Macro),
    ("operator", TokenCategory::Operator),
    ("property", TokenCategory::Property),
    ("decorator", TokenCategory::Annotation),
    ("namespace", TokenCategory::Namespace),
];

/// Resolves a semantic selector to a category.
///
/// Exact match first, then the base type (the first dot-segment). Unknown
/// selectors return `None` and are ignored by callers.
pub fn category_for_selector(selector: &str) -> Option<TokenCategory> {
    lookup(selector).or_else(|| {
        let (base, _) = selector.split_once('.')?;
        lookup(base)
    })
}

fn lookup(selector: &str) -> Option<TokenCategory> {
    SEMANTIC_SELECTORS
        .iter()
        .find(|(candidate, _)| *candidate == selector)
        .map(|(_, category)| *category)
}

/// The TextMate scopes that represent a category.
pub fn canonical_scopes(category: TokenCategory) -> &'static [&'static str] {
    match category {
        TokenCategory::Comment => &["comment", "comment.block.documentation"],
        TokenCategory::Literal => &["string", "string.quoted", "string.template", "string.regexp"],
        TokenCategory::Keyword => &["keyword.control", "keyword.other", "storage.type", "storage.modifier"],
        TokenCategory::Variable => &[
            "variable.other.readwrite",
            "variable.other.local",
            "meta.definition.variable.name",
        ],
        TokenCategory::Constant => &[
            "constant.language",
            "variable.other.constant",
            "variable.other.enummember",
        ],
        TokenCategory::Parameter => &["variable.parameter"],
        TokenCategory::Function => &["entity.name.function", "support.function", "meta.function-call"],
        TokenCategory::Class => &["entity.name.class", "entity.other.inherited-class", "support.class"],
        TokenCategory::Interface => &["entity.name.type.interface"],
        TokenCategory::Enum => &["entity.name.type.enum"],
        TokenCategory::Type => &[
            "entity.name.type.alias",
            "entity.name.type.parameter",
            "entity.name.type.struct",
            "support.type.primitive",
        ],
        TokenCategory::Number => &["constant.numeric"],
        TokenCategory::Macro => &["entity.name.macro", "meta.preprocessor.macro"],
        TokenCategory::Operator => &["keyword.operator"],
        TokenCategory::Punctuation => &[
            "punctuation.separator",
            "punctuation.terminator",
            "punctuation.accessor",
            "punctuation.section",
        ],
        TokenCategory::Property => &[
            "variable.other.property",
            "variable.other.object.property",
            "support.type.property-name",
            "meta.object-literal.key",
        ],
        TokenCategory::Annotation => &["meta.decorator", "meta.annotation", "punctuation.decorator"],
        TokenCategory::Builtin => &["support.type.builtin", "support.constant.builtin", "variable.language"],
        TokenCategory::Namespace => &["entity.name.namespace", "entity.name.module", "entity.name.package"],
        TokenCategory::Tag => &["entity.name.tag", "punctuation.definition.tag"],
        TokenCategory::Attribute => &["entity.other.attribute-name"],
        TokenCategory::EscapeSequence => &["constant.character.escape"],
        TokenCategory::Invalid => &["invalid", "invalid.illegal", "invalid.deprecated"],
    }
}

/// Returns true if a rule scope selects a canonical scope.
///
/// Matching is per dot-segment, the way TextMate selectors work: `entity.name`
/// selects `entity.name` and `entity.name.function` but not `entity.names`.
pub fn scope_matches(rule_scope: &str, canonical: &str) -> bool {
    match canonical.strip_prefix(rule_scope) {
        Some(rest) => rest.is_empty() || rest.starts_with('.'),
        None => false,
    }
}

/// Returns true if any of `rule_scopes` selects any canonical scope of `category`.
pub fn rule_selects(rule_scopes: &[String], category: TokenCategory) -> bool {
    let canonical = canonical_scopes(category);
    rule_scopes
        .iter()
        .map(|scope| scope.trim())
        .filter(|scope| !scope.is_empty())
        .any(|scope| canonical.iter().any(|c| scope_matches(scope, c)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_exact_and_base_fallback() {
        assert_eq!(category_for_selector("variable.readonly"), Some(TokenCategory::Constant));
        assert_eq!(category_for_selector("variable.declaration"), Some(TokenCategory::Variable));
        assert_eq!(category_for_selector("comment.documentation"), Some(TokenCategory::Comment));
        assert_eq!(category_for_selector("selfKeyword"), None);
        assert_eq!(category_for_selector(""), None);
    }

    #[test]
    fn test_scope_matching_is_segment_aware() {
        assert!(scope_matches("entity.name", "entity.name.function"));
        assert!(scope_matches("entity.name.function", "entity.name.function"));
        assert!(!scope_matches("entity.name.func", "entity.name.function"));
        assert!(!scope_matches("entity.name.function.call", "entity.name.function"));
    }

    #[test]
    fn test_every_category_has_scopes() {
        for category in TokenCategory::ALL {
            assert!(!canonical_scopes(category).is_empty(), "{category} has no scopes");
        }
    }

    #[test]
    fn test_scope_tables_do_not_overlap() {
        for a in TokenCategory::ALL {
            for b in TokenCategory::ALL {
                if a == b {
                    continue;
                }
                for scope in canonical_scopes(a) {
                    for other in canonical_scopes(b) {
                        assert!(
                            !scope_matches(scope, other),
                            "{scope} ({a}) selects {other} ({b})"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_rule_selects_ignores_blank_scopes() {
        let scopes = vec![" ".to_string(), "keyword".to_string()];
        assert!(rule_selects(&scopes, TokenCategory::Keyword));
        assert!(rule_selects(&scopes, TokenCategory::Operator));
        assert!(!rule_selects(&scopes, TokenCategory::Comment));
    }
}
