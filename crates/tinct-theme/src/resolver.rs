//! Resolves a theme's rules into one token per category.
//!
//! Two rule systems feed the map, each with its own tie-break direction:
//!
//! 1. **Semantic pass**: rules are visited in document order and the first
//!    rule to reach a category claims it. Later semantic rules for a claimed
//!    category are ignored.
//! 2. **TextMate pass**: rules are visited in array order and every match is
//!    applied, so the last matching rule wins. Categories claimed in the
//!    semantic pass are never touched.
//!
//! Categories reached by neither pass keep their taxonomy default.
//! Malformed rules are skipped; nothing here returns an error.

use serde_json::{Map, Value};
use tracing::debug;

use crate::rules::{category_for_selector, rule_selects};
use crate::{ResolvedTokenMap, ScopeRule, SemanticValue, ThemeDocument, TokenCategory};

/// Categories already decided by the semantic pass.
#[derive(Debug, Default)]
struct Claims([bool; TokenCategory::COUNT]);

impl Claims {
    fn claim(&mut self, category: TokenCategory) {
        self.0[category.index()] = true;
    }

    fn is_claimed(&self, category: TokenCategory) -> bool {
        self.0[category.index()]
    }
}

/// Resolves a theme document.
pub fn resolve_theme(theme: &ThemeDocument) -> ResolvedTokenMap {
    resolve(&theme.semantic_token_colors, &theme.token_colors)
}

/// Resolves raw semantic rules and TextMate rules into a full map.
pub fn resolve(semantic_rules: &Map<String, Value>, scope_rules: &[ScopeRule]) -> ResolvedTokenMap {
    let mut map = ResolvedTokenMap::defaults();
    let claims = semantic_pass(&mut map, semantic_rules);
    textmate_pass(&mut map, &claims, scope_rules);
    map
}

/// First claim wins.
fn semantic_pass(map: &mut ResolvedTokenMap, rules: &Map<String, Value>) -> Claims {
    let mut claims = Claims::default();

    for (selector, raw) in rules {
        let Some(category) = category_for_selector(selector) else {
            debug!("Ignoring unknown semantic selector {selector:?}");
            continue;
        };
        if claims.is_claimed(category) {
            continue;
        }
        let Some(value) = SemanticValue::from_json(raw) else {
            debug!("Skipping malformed semantic rule {selector:?}: {raw}");
            continue;
        };

        claims.claim(category);
        map.set(category, value.to_token());
    }

    claims
}

/// Last match wins. No early exit: a later rule must be able to override an
/// earlier one for the same category.
fn textmate_pass(map: &mut ResolvedTokenMap, claims: &Claims, rules: &[ScopeRule]) {
    for (position, rule) in rules.iter().enumerate() {
        let scopes = rule.scopes();
        if scopes.is_empty() {
            continue;
        }
        let Some(token) = rule.settings.to_token() else {
            debug!("Skipping TextMate rule #{position} without a usable foreground");
            continue;
        };

        for category in TokenCategory::ALL {
            if !claims.is_claimed(category) && rule_selects(scopes, category) {
                map.set(category, token.clone());
            }
        }
    }
}
