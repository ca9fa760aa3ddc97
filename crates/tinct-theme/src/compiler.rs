//! Compiles a resolved map back into a theme file.
//!
//! The compiler never replaces what a base theme already has. Emitted
//! TextMate rules are appended after the base rules so they win the
//! editor's last-rule cascade. Emitted semantic rules replace every base
//! semantic rule that lands on an emitted category, since the first semantic
//! rule for a category claims it. The output is built entirely in memory;
//! callers write it out in one go.

use serde_json::{Map, Value};
use tracing::warn;

use crate::rules::{canonical_scopes, category_for_selector, SEMANTIC_SELECTORS};
use crate::{
    ColorHex, ResolvedTokenMap, ScopeRule, ScopeSettings, SemanticValue, ThemeDocument, ThemeError,
    ThemeKind, ThemeResult,
};

/// Raw overrides layered on top of the emitted rules.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThemeOverrides {
    /// Workbench colors, `key → hex`. A `null` value removes the key.
    pub colors: Map<String, Value>,

    /// Semantic rules merged after the emitted ones. A `null` value removes the selector.
    pub semantic: Map<String, Value>,
}

/// One semantic rule per known selector, carrying its category's token.
pub fn emit_semantic_rules(map: &ResolvedTokenMap) -> Map<String, Value> {
    SEMANTIC_SELECTORS
        .iter()
        .map(|(selector, category)| {
            let value = SemanticValue::from_token(&map[*category]);
            (selector.to_string(), value.to_json())
        })
        .collect()
}

/// One TextMate rule per category, covering its full canonical scope list.
pub fn emit_scope_rules(map: &ResolvedTokenMap) -> Vec<ScopeRule> {
    map.iter()
        .filter_map(|(category, token)| {
            let scopes = canonical_scopes(category);
            if scopes.is_empty() {
                return None;
            }
            let mut rule = ScopeRule::new(
                scopes.iter().map(|s| s.to_string()).collect(),
                ScopeSettings::from_token(token),
            );
            rule.name = Some(category.token().display_name.to_string());
            Some(rule)
        })
        .collect()
}

/// Merges the emitted rules and overrides into a copy of `base`.
pub fn compose(base: &ThemeDocument, map: &ResolvedTokenMap, overrides: &ThemeOverrides) -> ThemeDocument {
    let mut output = base.clone();

    for (key, value) in &overrides.colors {
        match value {
            Value::Null => {
                output.colors.remove(key);
            }
            Value::String(s) if ColorHex::parse(s).is_some() => {
                output.colors.insert(key.clone(), value.clone());
            }
            _ => warn!("Ignoring color override {key:?}: {value} is not a hex color"),
        }
    }

    // A base `function.declaration` listed before the emitted `function`
    // would otherwise claim the category first. Every known selector maps to
    // an emitted category, so only unknown selectors survive.
    output
        .semantic_token_colors
        .retain(|selector, _| category_for_selector(selector).is_none());
    output.semantic_token_colors.extend(emit_semantic_rules(map));
    for (selector, value) in &overrides.semantic {
        if value.is_null() {
            output.semantic_token_colors.remove(selector);
        } else {
            output.semantic_token_colors.insert(selector.clone(), value.clone());
        }
    }

    output.token_colors.extend(emit_scope_rules(map));
    output.semantic_highlighting = Some(true);
    output
}

const RESERVED_CHARS: &[char] = &['/', '\\', '<', '>', ':', '"', '|', '?', '*'];

/// Rejects names that cannot safely become a file name.
pub fn validate_theme_name(name: &str) -> ThemeResult<()> {
    let reject = |reason| {
        Err(ThemeError::InvalidName {
            name: name.to_string(),
            reason,
        })
    };

    if name.trim().is_empty() {
        return reject("name is empty");
    }
    if name.trim() != name {
        return reject("name has leading or trailing whitespace");
    }
    if name == "." || name == ".." {
        return reject("name is reserved");
    }
    if name.contains(RESERVED_CHARS) {
        return reject("name contains a path separator or reserved character");
    }
    if name.chars().any(char::is_control) {
        return reject("name contains control characters");
    }
    Ok(())
}

/// `"My Theme"` → `"my-theme-color-theme.json"`.
pub fn theme_file_name(name: &str) -> ThemeResult<String> {
    validate_theme_name(name)?;
    let slug = name
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-");
    Ok(format!("{slug}-color-theme.json"))
}

/// A compiled theme ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledTheme {
    pub file_name: String,
    pub document: ThemeDocument,
}

/// Produces named output themes.
///
/// The name is validated when the compiler is built, so no compile result
/// can ever carry a name that would be rejected at write time.
#[derive(Debug, Clone)]
pub struct ThemeCompiler {
    name: String,
    kind: ThemeKind,
    file_name: String,
}

impl ThemeCompiler {
    pub fn new(name: impl Into<String>, kind: ThemeKind) -> ThemeResult<Self> {
        let name = name.into();
        let file_name = theme_file_name(&name)?;
        Ok(Self { name, kind, file_name })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ThemeKind {
        self.kind
    }

    pub fn compile(
        &self,
        base: &ThemeDocument,
        map: &ResolvedTokenMap,
        overrides: &ThemeOverrides,
    ) -> CompiledTheme {
        let mut document = compose(base, map, overrides);
        document.name = self.name.clone();
        document.kind = self.kind;
        CompiledTheme {
            file_name: self.file_name.clone(),
            document,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{resolve_theme, FontStyle, ResolvedToken, TokenCategory};
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_emit_semantic_rule_forms() {
        let mut map = ResolvedTokenMap::defaults();
        map.set(
            TokenCategory::Function,
            ResolvedToken::new(ColorHex::parse("#FFAA00").unwrap(), FontStyle::None),
        );
        let rules = emit_semantic_rules(&map);

        assert_eq!(rules["comment"], json!({ "foreground": "#6A9955", "fontStyle": "italic" }));
        assert_eq!(rules["function"], json!("#FFAA00"));
        assert_eq!(rules["method"], json!("#FFAA00"));
        assert_eq!(rules.len(), SEMANTIC_SELECTORS.len());
    }

    #[test]
    fn test_emit_scope_rules_covers_every_category() {
        let rules = emit_scope_rules(&ResolvedTokenMap::defaults());
        assert_eq!(rules.len(), TokenCategory::COUNT);

        let comment = &rules[0];
        assert_eq!(comment.scopes(), canonical_scopes(TokenCategory::Comment));
        assert_eq!(comment.settings.font_style.as_deref(), Some("italic"));

        let literal = &rules[1];
        assert_eq!(literal.settings.font_style, None);
    }

    #[test]
    fn test_compose_appends_and_merges() {
        let base: ThemeDocument = serde_json::from_value(json!({
            "name": "Base",
            "type": "dark",
            "colors": { "editor.background": "#1E1E1E", "editor.foreground": "#D4D4D4" },
            "tokenColors": [{ "scope": "markup.bold", "settings": { "fontStyle": "bold" } }],
            "semanticTokenColors": { "selfKeyword": "#569CD6", "function": "#000000" }
        }))
        .unwrap();

        let mut overrides = ThemeOverrides::default();
        overrides.colors.insert("editor.background".into(), json!("#000000"));
        overrides.colors.insert("editor.foreground".into(), Value::Null);
        overrides.colors.insert("sideBar.background".into(), json!("dark gray"));
        overrides.semantic.insert("label".into(), json!("#ABCDEF"));

        let output = compose(&base, &ResolvedTokenMap::defaults(), &overrides);

        assert_eq!(output.colors["editor.background"], json!("#000000"));
        assert!(!output.colors.contains_key("editor.foreground"));
        assert!(!output.colors.contains_key("sideBar.background"));
        assert_eq!(output.token_colors[0], base.token_colors[0]);
        assert_eq!(output.token_colors.len(), 1 + TokenCategory::COUNT);
        assert_eq!(output.semantic_token_colors["selfKeyword"], json!("#569CD6"));
        assert_eq!(output.semantic_token_colors["function"], json!("#DCDCAA"));
        assert_eq!(output.semantic_token_colors["label"], json!("#ABCDEF"));
        assert_eq!(output.semantic_highlighting, Some(true));
        assert_eq!(output.name, "Base");
    }

    #[test]
    fn test_base_subselector_does_not_shadow_emitted_rule() {
        let base: ThemeDocument = serde_json::from_value(json!({
            "semanticTokenColors": {
                "function.declaration": "#000000",
                "selfKeyword": "#569CD6",
                "variable.readonly": { "foreground": "#111111", "fontStyle": "bold" }
            }
        }))
        .unwrap();
        let mut map = ResolvedTokenMap::defaults();
        map.set(
            TokenCategory::Function,
            ResolvedToken::new(ColorHex::parse("#FF0000").unwrap(), FontStyle::None),
        );

        let output = compose(&base, &map, &ThemeOverrides::default());
        assert!(!output.semantic_token_colors.contains_key("function.declaration"));
        assert_eq!(output.semantic_token_colors["selfKeyword"], json!("#569CD6"));

        let resolved = resolve_theme(&output);
        assert_eq!(resolved[TokenCategory::Function].color.as_str(), "#FF0000");
        assert_eq!(resolved, map);
    }

    #[test]
    fn test_compiler_names_output() {
        let compiler = ThemeCompiler::new("My Custom  Theme", ThemeKind::Light).unwrap();
        let compiled = compiler.compile(
            &ThemeDocument::new("Base", ThemeKind::Dark),
            &ResolvedTokenMap::defaults(),
            &ThemeOverrides::default(),
        );
        assert_eq!(compiled.file_name, "my-custom-theme-color-theme.json");
        assert_eq!(compiled.document.name, "My Custom  Theme");
        assert_eq!(compiled.document.kind, ThemeKind::Light);
    }

    #[test]
    fn test_invalid_theme_names() {
        for name in ["", "   ", "../evil", "a/b", "a\\b", "what?", "x:y", "..", " padded", "tab\tname"] {
            assert!(
                matches!(validate_theme_name(name), Err(ThemeError::InvalidName { .. })),
                "{name:?} should be rejected"
            );
        }
        assert!(validate_theme_name("Solarized Tweaks 2").is_ok());
        assert!(ThemeCompiler::new("bad/name", ThemeKind::Dark).is_err());
    }

    fn style_strategy() -> impl Strategy<Value = FontStyle> {
        prop_oneof![
            Just(FontStyle::None),
            Just(FontStyle::Bold),
            Just(FontStyle::Italic),
            Just(FontStyle::Underline),
        ]
    }

    fn map_strategy() -> impl Strategy<Value = ResolvedTokenMap> {
        proptest::collection::vec(("#[0-9a-fA-F]{6}", style_strategy()), TokenCategory::COUNT).prop_map(
            |entries| {
                let mut map = ResolvedTokenMap::defaults();
                for (category, (color, style)) in TokenCategory::ALL.into_iter().zip(entries) {
                    let color = ColorHex::parse(&color).expect("strategy yields hex");
                    map.set(category, ResolvedToken::new(color, style));
                }
                map
            },
        )
    }

    const BASE_SELECTORS: &[&str] = &[
        "function.declaration",
        "method.static",
        "comment.documentation",
        "keyword.control",
        "variable.readonly.local",
        "type.defaultLibrary",
        "class",
        "selfKeyword",
    ];

    fn base_strategy() -> impl Strategy<Value = ThemeDocument> {
        proptest::collection::vec((proptest::sample::select(BASE_SELECTORS), "#[0-9a-fA-F]{6}"), 0..8).prop_map(
            |entries| {
                let mut base = ThemeDocument::default();
                for (selector, color) in entries {
                    base.semantic_token_colors.insert(selector.to_string(), Value::String(color));
                }
                base
            },
        )
    }

    proptest! {
        #[test]
        fn prop_round_trip_over_base_semantic_rules(base in base_strategy(), map in map_strategy()) {
            let output = compose(&base, &map, &ThemeOverrides::default());
            prop_assert_eq!(resolve_theme(&output), map);
        }

        #[test]
        fn prop_compile_then_resolve_round_trips(map in map_strategy()) {
            let output = compose(&ThemeDocument::default(), &map, &ThemeOverrides::default());
            prop_assert_eq!(resolve_theme(&output), map);
        }

        #[test]
        fn prop_round_trip_survives_json(map in map_strategy()) {
            let output = compose(&ThemeDocument::default(), &map, &ThemeOverrides::default());
            let text = output.to_json_pretty().unwrap();
            let reread = ThemeDocument::from_json(&text).unwrap();
            prop_assert_eq!(resolve_theme(&reread), map);
        }
    }
}
